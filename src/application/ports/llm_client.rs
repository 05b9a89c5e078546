use async_trait::async_trait;

/// A staged file the model should read alongside the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentRef {
    pub uri: String,
    pub mime_type: String,
}

impl AttachmentRef {
    pub fn pdf(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: "application/pdf".to_string(),
        }
    }
}

/// Text-completion capability. Adapters retry transient failures internally;
/// the errors surfaced here are post-retry outcomes.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmClientError>;

    async fn complete_with_attachments(
        &self,
        prompt: &str,
        attachments: &[AttachmentRef],
    ) -> Result<String, LlmClientError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmClientError {
    #[error("quota exhausted")]
    QuotaExhausted,
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
}

impl LlmClientError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            LlmClientError::QuotaExhausted
                | LlmClientError::ServiceUnavailable(_)
                | LlmClientError::DeadlineExceeded
        )
    }
}
