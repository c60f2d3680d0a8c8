use thiserror::Error;

/// A stage failing on a single document. Never aborts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Analysis failed: {0}")]
    Failed(String),

    #[error("Stage panicked: {0}")]
    Panicked(String),
}
