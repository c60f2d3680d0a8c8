use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::import::ImportError;

/// Run-fatal errors. Everything else is recorded as data in the report.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Input error: {0}")]
    Import(#[from] ImportError),

    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
