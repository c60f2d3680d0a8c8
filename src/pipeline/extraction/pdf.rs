use std::panic::catch_unwind;

use super::{ExtractionError, PageText, PdfExtractor};
use crate::pipeline::analysis::registry::panic_message;
use crate::pipeline::import::has_pdf_magic;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers; scanned pages come back empty.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
        if !has_pdf_magic(pdf_bytes) {
            return Err(ExtractionError::NotPdf);
        }

        // pdf-extract panics on some malformed inputs instead of erroring.
        let page_texts = catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes))
            .map_err(|payload| ExtractionError::PdfParsing(panic_message(payload.as_ref())))?
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        Ok(page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageText {
                page_number: i + 1,
                text,
            })
            .collect())
    }
}
