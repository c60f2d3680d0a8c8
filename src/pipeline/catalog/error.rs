use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration file could not back its stage.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {name} pattern: {source}")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}
