use std::sync::Arc;

use bytes::Bytes;

use crate::application::ports::{PdfEngine, PdfEngineError};
use crate::domain::SourceDocument;

/// Page indices of the detection sample: the first `take_first` pages
/// followed by the last `take_last` pages, both clamped to the document.
///
/// `last_start` is floored at `first_end`, so no page is taken twice even
/// when `take_first + take_last` exceeds the page count.
pub fn sample_page_indices(total: usize, take_first: usize, take_last: usize) -> Vec<usize> {
    let first_end = take_first.min(total);
    let last_start = first_end.max(total - take_last.min(total));

    let mut pages: Vec<usize> = (0..first_end).collect();
    pages.extend(last_start..total);
    pages
}

/// Extracts the bounded page-range subset used for question detection.
pub struct Sampler {
    pdf: Arc<dyn PdfEngine>,
}

impl Sampler {
    pub fn new(pdf: Arc<dyn PdfEngine>) -> Self {
        Self { pdf }
    }

    pub async fn sample(
        &self,
        document: &SourceDocument,
        take_first: usize,
        take_last: usize,
    ) -> Result<SourceDocument, PdfEngineError> {
        let pages = sample_page_indices(document.page_count, take_first, take_last);

        if pages.is_empty() {
            return Ok(SourceDocument::new(Bytes::new(), 0));
        }
        if pages.len() == document.page_count {
            return Ok(document.clone());
        }

        let data = self.pdf.subset(&document.data, &pages).await?;
        Ok(SourceDocument::new(data, pages.len()))
    }
}
