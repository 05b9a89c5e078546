use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lopdf::Document;

use crate::application::ports::{PdfEngine, PdfEngineError};

const PDF_OP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page-level PDF access backed by lopdf. Parsing and extraction are
/// CPU-bound, so every operation runs on the blocking pool under a timeout.
#[derive(Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }

    fn load(data: &[u8]) -> Result<Document, PdfEngineError> {
        Document::load_mem(data).map_err(|e| PdfEngineError::ParseFailed(e.to_string()))
    }

    fn page_texts_blocking(data: &[u8]) -> Result<Vec<String>, PdfEngineError> {
        let doc = Self::load(data)?;
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

        // A page that fails to extract contributes an empty string; partial
        // text is still useful for detection and routing.
        Ok(page_numbers
            .iter()
            .map(|&number| doc.extract_text(&[number]).unwrap_or_default())
            .collect())
    }

    fn subset_blocking(data: &[u8], pages: &[usize]) -> Result<Vec<u8>, PdfEngineError> {
        let mut doc = Self::load(data)?;
        let total = doc.get_pages().len();

        if let Some(&out_of_range) = pages.iter().find(|&&p| p >= total) {
            return Err(PdfEngineError::PageOutOfRange(out_of_range));
        }

        // lopdf pages are 1-indexed.
        let keep: BTreeSet<u32> = pages.iter().map(|&p| (p + 1) as u32).collect();
        let drop: Vec<u32> = (1..=total as u32).filter(|n| !keep.contains(n)).collect();

        doc.delete_pages(&drop);
        doc.prune_objects();

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| PdfEngineError::ParseFailed(e.to_string()))?;
        Ok(out)
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, PdfEngineError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, PdfEngineError> + Send + 'static,
    {
        tokio::time::timeout(PDF_OP_TIMEOUT, tokio::task::spawn_blocking(op))
            .await
            .map_err(|_| PdfEngineError::Timeout)?
            .map_err(|e| PdfEngineError::ParseFailed(format!("task join error: {e}")))?
    }
}

#[async_trait]
impl PdfEngine for LopdfEngine {
    async fn page_count(&self, data: &Bytes) -> Result<usize, PdfEngineError> {
        let data = data.clone();
        self.run_blocking(move || Ok(Self::load(&data)?.get_pages().len()))
            .await
    }

    async fn extract_page_texts(&self, data: &Bytes) -> Result<Vec<String>, PdfEngineError> {
        let data = data.clone();
        let texts = self
            .run_blocking(move || Self::page_texts_blocking(&data))
            .await?;
        tracing::debug!(pages = texts.len(), "page text extraction complete");
        Ok(texts)
    }

    async fn subset(&self, data: &Bytes, pages: &[usize]) -> Result<Bytes, PdfEngineError> {
        let data = data.clone();
        let pages = pages.to_vec();
        let out = self
            .run_blocking(move || Self::subset_blocking(&data, &pages))
            .await?;
        Ok(Bytes::from(out))
    }
}
