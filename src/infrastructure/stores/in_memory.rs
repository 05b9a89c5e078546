use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{DocumentStore, DocumentStoreError};

/// Map-backed document store for local wiring and tests.
pub struct InMemoryDocumentStore {
    docs: Mutex<HashMap<String, String>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_document(self, doc_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.docs
            .lock()
            .expect("docs lock poisoned")
            .insert(doc_id.into(), text.into());
        self
    }

    /// Current content of a document, if any. Handy for test assertions.
    pub fn document(&self, doc_id: &str) -> Option<String> {
        self.docs
            .lock()
            .expect("docs lock poisoned")
            .get(doc_id)
            .cloned()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn check_access(&self, _doc_id: &str) -> Result<(), DocumentStoreError> {
        Ok(())
    }

    async fn get_text(&self, doc_id: &str) -> Result<String, DocumentStoreError> {
        self.docs
            .lock()
            .expect("docs lock poisoned")
            .get(doc_id)
            .cloned()
            .ok_or_else(|| DocumentStoreError::NotFound(doc_id.to_string()))
    }

    async fn write(&self, doc_id: &str, text: &str) -> Result<(), DocumentStoreError> {
        self.docs
            .lock()
            .expect("docs lock poisoned")
            .insert(doc_id.to_string(), text.to_string());
        Ok(())
    }
}
