mod docs_store;
mod drive_blob_store;
mod sheets_progress;

pub use docs_store::GoogleDocsStore;
pub use drive_blob_store::DriveBlobStore;
pub use sheets_progress::SheetsProgressSink;
