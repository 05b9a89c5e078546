use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::application::ports::{BlobStore, BlobStoreError};
use crate::infrastructure::transport::{RefreshingClient, send_with_retries};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Binary retrieval from Drive and attachment staging to Cloud Storage.
pub struct DriveBlobStore {
    client: RefreshingClient,
    drive_endpoint: String,
    storage_endpoint: String,
    access_token: String,
}

impl DriveBlobStore {
    pub fn new(access_token: String) -> Self {
        Self {
            client: RefreshingClient::new(REQUEST_TIMEOUT),
            drive_endpoint: "https://www.googleapis.com".to_string(),
            storage_endpoint: "https://storage.googleapis.com".to_string(),
            access_token,
        }
    }
}

#[async_trait]
impl BlobStore for DriveBlobStore {
    #[tracing::instrument(skip(self))]
    async fn download(&self, file_id: &str) -> Result<Bytes, BlobStoreError> {
        let url = format!(
            "{}/drive/v3/files/{}?alt=media&supportsAllDrives=true",
            self.drive_endpoint, file_id
        );

        let response = send_with_retries(|attempt| {
            self.client
                .get(attempt)
                .get(&url)
                .bearer_auth(&self.access_token)
                .send()
        })
        .await
        .map_err(|e| BlobStoreError::DownloadFailed(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            200 => {}
            401 | 403 => return Err(BlobStoreError::AccessDenied(file_id.to_string())),
            404 => return Err(BlobStoreError::NotFound(file_id.to_string())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                return Err(BlobStoreError::DownloadFailed(format!(
                    "HTTP {status}: {body}"
                )));
            }
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| BlobStoreError::DownloadFailed(e.to_string()))?;
        tracing::info!(bytes = data.len(), "file downloaded");
        Ok(data)
    }

    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn upload(
        &self,
        bucket: &str,
        data: Bytes,
        suffix: &str,
    ) -> Result<String, BlobStoreError> {
        let object = format!("staging/{}{}", Uuid::new_v4(), suffix);
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.storage_endpoint, bucket, object
        );

        let response = send_with_retries(|attempt| {
            self.client
                .get(attempt)
                .post(&url)
                .bearer_auth(&self.access_token)
                .header("Content-Type", "application/pdf")
                .body(data.clone())
                .send()
        })
        .await
        .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BlobStoreError::UploadFailed(format!(
                "HTTP {status}: {body}"
            )));
        }

        let uri = format!("gs://{bucket}/{object}");
        tracing::info!(%uri, "blob staged");
        Ok(uri)
    }
}
