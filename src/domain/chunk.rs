use std::ops::Range;

use bytes::Bytes;

/// A contiguous page-range partition of a source document, the unit of
/// map-step LLM calls.
///
/// Chunks are 0-indexed, non-overlapping and cover the full page range
/// exactly once; the final chunk may be shorter than `pages_per_chunk`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    pub index: usize,
    pub first_page: usize,
    pub page_count: usize,
    pub data: Bytes,
    pub text: String,
}

impl DocumentChunk {
    pub fn page_range(&self) -> Range<usize> {
        self.first_page..self.first_page + self.page_count
    }
}
