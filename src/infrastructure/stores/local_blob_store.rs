use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use uuid::Uuid;

use crate::application::ports::{BlobStore, BlobStoreError};

/// Filesystem-backed blob store for local runs: staged attachments land
/// under `base_path` and are addressed by their relative path.
pub struct LocalBlobStore {
    inner: Arc<LocalFileSystem>,
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_path: PathBuf) -> Result<Self, BlobStoreError> {
        std::fs::create_dir_all(&base_path)
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;
        let fs = LocalFileSystem::new_with_prefix(&base_path)
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
            base_path,
        })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn download(&self, file_id: &str) -> Result<Bytes, BlobStoreError> {
        let path = StorePath::from(file_id);
        let result = self
            .inner
            .get(&path)
            .await
            .map_err(|e| BlobStoreError::NotFound(e.to_string()))?;

        result
            .bytes()
            .await
            .map_err(|e| BlobStoreError::DownloadFailed(e.to_string()))
    }

    async fn upload(
        &self,
        bucket: &str,
        data: Bytes,
        suffix: &str,
    ) -> Result<String, BlobStoreError> {
        let object = format!("{bucket}/staging/{}{suffix}", Uuid::new_v4());
        let path = StorePath::from(object.as_str());

        self.inner
            .put(&path, PutPayload::from(data))
            .await
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?;

        Ok(format!("file://{}/{object}", self.base_path.display()))
    }
}
