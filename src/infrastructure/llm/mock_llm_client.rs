use async_trait::async_trait;

use crate::application::ports::{AttachmentRef, LlmClient, LlmClientError};

/// Fixed-response client for local wiring without credentials.
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmClientError> {
        Ok("Respuesta simulada.".to_string())
    }

    async fn complete_with_attachments(
        &self,
        _prompt: &str,
        _attachments: &[AttachmentRef],
    ) -> Result<String, LlmClientError> {
        Ok("Respuesta simulada.".to_string())
    }
}
