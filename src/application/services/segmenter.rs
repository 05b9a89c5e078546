use std::ops::Range;
use std::sync::Arc;

use crate::application::ports::{PdfEngine, PdfEngineError};
use crate::domain::{DocumentChunk, SourceDocument};

/// Contiguous, non-overlapping page ranges of size `pages_per_chunk`
/// covering `total` exactly once; the last range may be shorter. Callers
/// enforce the `pages_per_chunk >= 5` floor.
pub fn chunk_page_ranges(total: usize, pages_per_chunk: usize) -> Vec<Range<usize>> {
    assert!(pages_per_chunk > 0, "pages_per_chunk must be positive");
    (0..total)
        .step_by(pages_per_chunk)
        .map(|start| start..(start + pages_per_chunk).min(total))
        .collect()
}

/// Partitions a source document into fixed-size page chunks, each carrying
/// its own bytes and extracted text.
pub struct ChunkSegmenter {
    pdf: Arc<dyn PdfEngine>,
}

impl ChunkSegmenter {
    pub fn new(pdf: Arc<dyn PdfEngine>) -> Self {
        Self { pdf }
    }

    /// `page_texts` is the per-page extraction of the same document, reused
    /// here so the document is only parsed for text once per job.
    pub async fn segment(
        &self,
        document: &SourceDocument,
        pages_per_chunk: usize,
        page_texts: &[String],
    ) -> Result<Vec<DocumentChunk>, PdfEngineError> {
        let ranges = chunk_page_ranges(document.page_count, pages_per_chunk);
        let mut chunks = Vec::with_capacity(ranges.len());

        for (index, range) in ranges.into_iter().enumerate() {
            let data = if range.len() == document.page_count {
                document.data.clone()
            } else {
                let pages: Vec<usize> = range.clone().collect();
                self.pdf.subset(&document.data, &pages).await?
            };

            let text = page_texts
                .get(range.clone())
                .map(|pages| pages.join("\n\n"))
                .unwrap_or_default();

            chunks.push(DocumentChunk {
                index,
                first_page: range.start,
                page_count: range.len(),
                data,
                text,
            });
        }

        Ok(chunks)
    }
}

pub fn chunk_texts(chunks: &[DocumentChunk]) -> Vec<&str> {
    chunks.iter().map(|c| c.text.as_str()).collect()
}
