//! Run-state persistence for crash-safe resume.

pub mod state;
pub mod store;

pub use state::RunState;
pub use store::{select_snapshots, CheckpointManager, SnapshotEntry};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt checkpoint: {0}")]
    Corrupt(String),
}
