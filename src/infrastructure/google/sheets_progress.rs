use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::application::ports::ProgressSink;
use crate::infrastructure::transport::RefreshingClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Writes progress milestones into a fixed spreadsheet cell range.
/// Fire-and-forget: every failure is logged and swallowed.
pub struct SheetsProgressSink {
    client: RefreshingClient,
    endpoint: String,
    access_token: String,
    sheet_id: String,
    cell_range: String,
}

impl SheetsProgressSink {
    pub fn new(access_token: String, sheet_id: String, cell_range: String) -> Self {
        Self {
            client: RefreshingClient::new(REQUEST_TIMEOUT),
            endpoint: "https://sheets.googleapis.com".to_string(),
            access_token,
            sheet_id,
            cell_range,
        }
    }
}

#[async_trait]
impl ProgressSink for SheetsProgressSink {
    async fn report(&self, status: &str, link: Option<&str>) {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}?valueInputOption=RAW",
            self.endpoint, self.sheet_id, self.cell_range
        );
        let body = json!({
            "values": [[status, link.unwrap_or_default()]]
        });

        let result = self
            .client
            .get(1)
            .put(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(status, "progress reported");
            }
            Ok(response) => {
                tracing::warn!(
                    status_code = response.status().as_u16(),
                    "progress report rejected"
                );
            }
            Err(error) => {
                tracing::warn!(error = %error, "progress report failed");
            }
        }
    }
}
