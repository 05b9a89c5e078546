use async_trait::async_trait;
use bytes::Bytes;

/// Binary file retrieval and staging. `upload` returns a URI the LLM
/// capability can reference as an attachment.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn download(&self, file_id: &str) -> Result<Bytes, BlobStoreError>;

    async fn upload(
        &self,
        bucket: &str,
        data: Bytes,
        suffix: &str,
    ) -> Result<String, BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("access denied to blob {0}")]
    AccessDenied(String),
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("upload failed: {0}")]
    UploadFailed(String),
}
