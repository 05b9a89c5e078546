use bytes::Bytes;

/// Raw PDF content plus its derived page count.
///
/// Immutable once fetched; owned by the orchestrator for the duration of one
/// job. A sample is a derived `SourceDocument` over a page subset.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub data: Bytes,
    pub page_count: usize,
}

impl SourceDocument {
    pub fn new(data: Bytes, page_count: usize) -> Self {
        Self { data, page_count }
    }

    pub fn is_empty(&self) -> bool {
        self.page_count == 0
    }
}
