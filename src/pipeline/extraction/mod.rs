pub mod pdf;
pub mod reader;
pub mod sanitize;

pub use pdf::*;
pub use reader::*;
pub use sanitize::*;

use thiserror::Error;

/// Why a document produced no text. Fatal to that document only.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a PDF file (missing %PDF header)")]
    NotPdf,

    #[error("File too large: {size_mb:.1}MB exceeds {max_mb}MB limit")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Record {0} not found in corpus")]
    MissingRecord(usize),

    #[error("Record is not a JSON object")]
    InvalidRecord,

    #[error("Record has no text field (text, content, texto_completo, description)")]
    MissingText,

    #[error("Extracted text is empty")]
    EmptyText,
}

/// Text of one PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// Turns PDF bytes into per-page text.
pub trait PdfExtractor: Send + Sync {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError>;
}
