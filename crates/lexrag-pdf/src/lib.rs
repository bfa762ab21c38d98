//! Per-page text extraction from PDF files.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use lexrag_core::traits::PageExtractor;
use lexrag_core::{Error, Result};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Page texts of an in-memory PDF, in page order.
    pub fn extract_from_mem(&self, bytes: &[u8]) -> Result<Vec<String>> {
        if bytes.is_empty() {
            return Err(Error::Extraction("file is empty".into()));
        }
        // pdf-extract panics on some malformed inputs.
        let pages = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem_by_pages(bytes)))
            .map_err(|_| Error::Extraction("PDF parser panicked on malformed input".into()))?
            .map_err(|e| Error::Extraction(format!("PDF extraction error: {e}")))?;
        Ok(pages)
    }
}

impl PageExtractor for PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Extraction(format!("Failed to read {}: {e}", path.display())))?;
        let pages = self.extract_from_mem(&bytes)?;
        debug!(path = %path.display(), pages = pages.len(), "extracted pdf");
        Ok(pages)
    }
}
