//! Input discovery: turns an input path into an ordered list of items.
//!
//! Errors here are run-fatal. Per-document problems surface later, when an
//! item's text is fetched.

pub mod corpus;
pub mod format;

pub use corpus::*;
pub use format::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input path not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported input: {0}")]
    UnsupportedFormat(String),

    #[error("Could not read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON corpus {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
