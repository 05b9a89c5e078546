mod blob_store;
mod document_store;
mod llm_client;
mod pdf_engine;
mod progress_sink;

pub use blob_store::{BlobStore, BlobStoreError};
pub use document_store::{DocumentStore, DocumentStoreError};
pub use llm_client::{AttachmentRef, LlmClient, LlmClientError};
pub use pdf_engine::{PdfEngine, PdfEngineError};
pub use progress_sink::{NullProgressSink, ProgressSink};
