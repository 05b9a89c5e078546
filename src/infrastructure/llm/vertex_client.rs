use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{AttachmentRef, LlmClient, LlmClientError};
use crate::infrastructure::transport::{RefreshingClient, send_with_retries};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Text-generation client for the Vertex AI `generateContent` REST surface.
/// Transient statuses are retried with backoff here; the errors it surfaces
/// are post-retry outcomes for the engine's degradation logic.
pub struct VertexClient {
    client: RefreshingClient,
    endpoint: String,
    access_token: String,
    model_path: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "fileData", skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
}

#[derive(Serialize)]
struct FileData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    #[serde(rename = "fileUri")]
    file_uri: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl VertexClient {
    pub fn new(
        project_id: String,
        location: String,
        model_id: String,
        access_token: String,
    ) -> Self {
        let endpoint = format!("https://{location}-aiplatform.googleapis.com");
        let model_path = format!(
            "projects/{project_id}/locations/{location}/publishers/google/models/{model_id}"
        );
        Self {
            client: RefreshingClient::new(REQUEST_TIMEOUT),
            endpoint,
            access_token,
            model_path,
        }
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String, LlmClientError> {
        let url = format!("{}/v1/{}:generateContent", self.endpoint, self.model_path);
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
        };

        let response = send_with_retries(|attempt| {
            self.client
                .get(attempt)
                .post(&url)
                .bearer_auth(&self.access_token)
                .json(&body)
                .send()
        })
        .await
        .map_err(|e| LlmClientError::ServiceUnavailable(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmClientError::InvalidResponse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .flat_map(|c| c.content.into_iter())
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(LlmClientError::InvalidResponse(
                "response carried no text parts".to_string(),
            ));
        }

        tracing::debug!(chars = text.len(), "completion received");
        Ok(text)
    }
}

fn map_status(status: u16, body: String) -> LlmClientError {
    match status {
        429 => LlmClientError::QuotaExhausted,
        503 => LlmClientError::ServiceUnavailable(body),
        408 | 504 => LlmClientError::DeadlineExceeded,
        _ => LlmClientError::ApiRequestFailed(format!("HTTP {status}: {body}")),
    }
}

#[async_trait]
impl LlmClient for VertexClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmClientError> {
        self.generate(vec![Part {
            text: Some(prompt.to_string()),
            file_data: None,
        }])
        .await
    }

    async fn complete_with_attachments(
        &self,
        prompt: &str,
        attachments: &[AttachmentRef],
    ) -> Result<String, LlmClientError> {
        let mut parts = vec![Part {
            text: Some(prompt.to_string()),
            file_data: None,
        }];
        parts.extend(attachments.iter().map(|a| Part {
            text: None,
            file_data: Some(FileData {
                mime_type: a.mime_type.clone(),
                file_uri: a.uri.clone(),
            }),
        }));
        self.generate(parts).await
    }
}
