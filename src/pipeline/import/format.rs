use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ImportError;

/// Shape of the input path given to a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    PdfDirectory,
    PdfFile,
    JsonCorpus,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfDirectory => "pdf_directory",
            Self::PdfFile => "pdf_file",
            Self::JsonCorpus => "json_corpus",
        }
    }
}

pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024; // 100MB

const PDF_MAGIC: &[u8] = b"%PDF";

/// Classify the input path. Directories are PDF corpora; files are decided
/// by extension, then by magic bytes for extension-less PDFs.
pub fn detect_input_kind(path: &Path) -> Result<InputKind, ImportError> {
    if !path.exists() {
        return Err(ImportError::NotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        return Ok(InputKind::PdfDirectory);
    }
    if has_extension(path, "json") {
        return Ok(InputKind::JsonCorpus);
    }
    if has_extension(path, "pdf") || file_starts_with_pdf_magic(path)? {
        return Ok(InputKind::PdfFile);
    }
    Err(ImportError::UnsupportedFormat(path.display().to_string()))
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

fn file_starts_with_pdf_magic(path: &Path) -> Result<bool, ImportError> {
    let mut file = std::fs::File::open(path)?;
    let mut header = [0u8; 4];
    let bytes_read = file.read(&mut header)?;
    Ok(has_pdf_magic(&header[..bytes_read]))
}
