//! Resilient batch indexing.
//!
//! ```text
//! Corpus → BatchRunner ─┬→ DocumentReader → StageRegistry → RunState
//!                       └→ CheckpointManager (every N completions, on stop, at end)
//!                                   ↓
//!                               RunReport → search export (optional)
//! ```
//!
//! A document failure or a stage failure never ends the run. Only an
//! unreadable input or an unwritable export is run-fatal.

pub mod error;
pub mod report;
pub mod runner;
pub mod search_export;
pub mod signal;

pub use error::RunError;
pub use report::{ReportBody, RunDiagnostics, RunReport, SessionSummary, Statistics};
pub use runner::{run_indexer, run_indexer_with, BatchRunner, DocumentOutcome, DocumentState, RunOutcome};
pub use signal::StopSignal;
