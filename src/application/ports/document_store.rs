use async_trait::async_trait;

use crate::domain::QuestionAnswer;

/// External document store: plain-text reads and writes against documents
/// addressed by opaque ids.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Verify the current credentials can reach the document. Called for
    /// every referenced document before any LLM spend.
    async fn check_access(&self, doc_id: &str) -> Result<(), DocumentStoreError>;

    async fn get_text(&self, doc_id: &str) -> Result<String, DocumentStoreError>;

    /// Replace the document body with `text`.
    async fn write(&self, doc_id: &str, text: &str) -> Result<(), DocumentStoreError>;

    /// Replace the document body with a rendered Q/A report. The default
    /// rendering is plain markdown through `write`; adapters with a richer
    /// document model may override it.
    async fn write_answers(
        &self,
        doc_id: &str,
        title: &str,
        qas: &[QuestionAnswer],
    ) -> Result<(), DocumentStoreError> {
        let mut lines = vec![format!("# {}\n", title)];
        for (i, qa) in qas.iter().enumerate() {
            lines.push(format!("## {}. {}", i + 1, qa.question.trim()));
            lines.push(String::new());
            let answer = qa.answer.trim();
            lines.push(if answer.is_empty() {
                "_(sin respuesta)_".to_string()
            } else {
                answer.to_string()
            });
            lines.push(String::new());
        }
        self.write(doc_id, &lines.join("\n")).await
    }

    /// Human-facing link to the document, included in the job outcome.
    fn output_link(&self, doc_id: &str) -> String {
        doc_id.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("access denied to document {0}")]
    AccessDenied(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("transient store failure: {0}")]
    Transient(String),
    #[error("invalid store response: {0}")]
    InvalidResponse(String),
}
