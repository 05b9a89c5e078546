use async_trait::async_trait;
use bytes::Bytes;

/// Page-level access to a PDF byte buffer: counting, per-page text
/// extraction and page-subset document construction.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn page_count(&self, data: &Bytes) -> Result<usize, PdfEngineError>;

    /// Extract text for every page, in reading order. A page whose
    /// extraction fails contributes an empty string; only a document-level
    /// failure is an error.
    async fn extract_page_texts(&self, data: &Bytes) -> Result<Vec<String>, PdfEngineError>;

    /// Build a new PDF containing exactly `pages` (0-indexed, in the given
    /// order) of the source document.
    async fn subset(&self, data: &Bytes, pages: &[usize]) -> Result<Bytes, PdfEngineError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("failed to parse PDF: {0}")]
    ParseFailed(String),
    #[error("page {0} out of range")]
    PageOutOfRange(usize),
    #[error("extraction timed out")]
    Timeout,
}
