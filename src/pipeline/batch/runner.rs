//! BatchRunner: drives every input item through the document state machine.
//!
//! ```text
//! Discovered → TextExtracting → Analyzing → Completed
//!                      └──────→ Failed
//! ```
//! Runs sequentially on the calling thread, which is also the only writer of
//! checkpoint snapshots.

use std::time::Instant;

use chrono::Utc;

use super::report::RunReport;
use super::search_export;
use super::signal::StopSignal;
use super::RunError;
use crate::models::{word_count, DocumentResult, SnapshotKind, SourceKind};
use crate::pipeline::analysis::{StageRegistry, UnavailableStage};
use crate::pipeline::catalog::Catalog;
use crate::pipeline::checkpoint::{CheckpointManager, RunState};
use crate::pipeline::extraction::{DocumentReader, PdfExtractor, PdfTextExtractor};
use crate::pipeline::import::{Corpus, InputItem};
use crate::pipeline_config::PipelineConfig;

/// Per-document processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Discovered,
    TextExtracting,
    Analyzing,
    Completed,
    Failed,
}

impl DocumentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::TextExtracting => "text_extracting",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Terminal result of one document. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Completed(DocumentResult),
    Failed { document_id: String, reason: String },
}

/// Everything the report needs from a finished (or stopped) run.
#[derive(Debug)]
pub struct RunOutcome {
    pub state: RunState,
    pub interrupted: bool,
    pub processed_this_run: usize,
    pub unavailable_stages: Vec<UnavailableStage>,
    pub checkpoint_failures: Vec<String>,
}

pub struct BatchRunner {
    reader: DocumentReader,
    stages: StageRegistry,
    checkpoints: CheckpointManager,
    checkpoint_interval: u64,
    resume: bool,
    stop: StopSignal,
}

impl BatchRunner {
    pub fn new(
        reader: DocumentReader,
        stages: StageRegistry,
        checkpoints: CheckpointManager,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            reader,
            stages,
            checkpoints,
            checkpoint_interval: config.interval(),
            resume: config.resume,
            stop: StopSignal::new(),
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Process every unsettled item of `corpus`, checkpointing on cadence,
    /// and always leave a snapshot behind.
    pub fn run(&self, corpus: &Corpus) -> RunOutcome {
        let start = Instant::now();
        let mut state = self.initial_state(corpus);
        let mut last_saved = (state.sequence > 0).then_some(state.sequence);
        let mut checkpoint_failures = Vec::new();
        let mut processed_this_run = 0;
        let mut interrupted = false;

        tracing::info!(
            session_id = %state.session_id,
            items = corpus.items.len(),
            already_settled = state.attempted(),
            stages = ?self.stages.available(),
            "Indexing run started"
        );

        for item in &corpus.items {
            if self.stop.is_stop_requested() {
                tracing::warn!(
                    completed = state.completed.len(),
                    "Stop requested, halting before next document"
                );
                interrupted = true;
                break;
            }
            if state.is_settled(&item.document_id) {
                tracing::debug!(document_id = %item.document_id, "Already settled, skipping");
                continue;
            }

            match self.process_item(item, corpus) {
                DocumentOutcome::Completed(result) => state.record_completed(result),
                DocumentOutcome::Failed {
                    document_id,
                    reason,
                } => state.record_failed(&document_id, reason),
            }
            processed_this_run += 1;

            if self.checkpoint_due(state.sequence, last_saved) {
                match self.checkpoints.save(&state, SnapshotKind::Progress) {
                    Ok(_) => last_saved = Some(state.sequence),
                    Err(e) => {
                        tracing::warn!(error = %e, sequence = state.sequence, "Progress checkpoint failed, continuing in memory");
                        checkpoint_failures.push(format!("progress at sequence {}: {e}", state.sequence));
                    }
                }
            }
        }

        let closing = if interrupted {
            SnapshotKind::Progress
        } else {
            SnapshotKind::Final
        };
        if let Err(e) = self.checkpoints.save(&state, closing) {
            tracing::warn!(error = %e, kind = closing.as_str(), "Closing checkpoint failed");
            checkpoint_failures.push(format!("{} snapshot: {e}", closing.as_str()));
        }

        tracing::info!(
            session_id = %state.session_id,
            completed = state.completed.len(),
            failed = state.failed.len(),
            processed_this_run,
            interrupted,
            duration_ms = start.elapsed().as_millis() as u64,
            "Indexing run finished"
        );

        RunOutcome {
            state,
            interrupted,
            processed_this_run,
            unavailable_stages: self.stages.unavailable().to_vec(),
            checkpoint_failures,
        }
    }

    /// Drive one item from `Discovered` to a terminal state.
    pub fn process_item(&self, item: &InputItem, corpus: &Corpus) -> DocumentOutcome {
        let start = Instant::now();
        let document_id = item.document_id.as_str();
        trace_transition(document_id, DocumentState::Discovered, DocumentState::TextExtracting);

        let source = match self.reader.read(item, corpus) {
            Ok(source) => source,
            Err(e) => {
                trace_transition(document_id, DocumentState::TextExtracting, DocumentState::Failed);
                tracing::warn!(document_id, error = %e, "Text extraction failed");
                return DocumentOutcome::Failed {
                    document_id: document_id.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        trace_transition(document_id, DocumentState::TextExtracting, DocumentState::Analyzing);
        let (analyses, diagnostics) = self.stages.analyze(document_id, &source.text);

        let result = DocumentResult {
            document_id: document_id.to_string(),
            source_kind: item.source_kind,
            title: source.title,
            file_path: (item.source_kind == SourceKind::Pdf).then(|| item.path.display().to_string()),
            word_count: word_count(&source.text),
            character_count: source.text.chars().count(),
            text: source.text,
            analyses,
            diagnostics,
            original_data: source.original_data,
            processed_at: Utc::now(),
        };

        trace_transition(document_id, DocumentState::Analyzing, DocumentState::Completed);
        tracing::info!(
            document_id,
            words = result.word_count,
            has_dates = result.analyses.temporal.is_some(),
            stage_errors = result.diagnostics.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Document indexed"
        );
        DocumentOutcome::Completed(result)
    }

    fn initial_state(&self, corpus: &Corpus) -> RunState {
        if !self.resume {
            tracing::info!("Resume disabled, starting a new session");
            return RunState::new_session(corpus.items.clone());
        }
        match self.checkpoints.load_latest() {
            Some(mut state) => {
                state.resumes += 1;
                state.items = corpus.items.clone();
                state
            }
            None => {
                tracing::info!(dir = %self.checkpoints.dir().display(), "No checkpoint found, starting a new session");
                RunState::new_session(corpus.items.clone())
            }
        }
    }

    fn checkpoint_due(&self, sequence: u64, last_saved: Option<u64>) -> bool {
        sequence > 0 && sequence % self.checkpoint_interval == 0 && last_saved != Some(sequence)
    }
}

fn trace_transition(document_id: &str, from: DocumentState, to: DocumentState) {
    tracing::trace!(document_id, from = from.as_str(), to = to.as_str(), "State transition");
}

/// Discover the input, run the pipeline, and write the optional search export.
///
/// Only discovery failures are errors; everything else, export failures
/// included, is reported inside the returned report.
pub fn run_indexer(config: &PipelineConfig, stop: StopSignal) -> Result<RunReport, RunError> {
    run_indexer_with(config, stop, Box::new(PdfTextExtractor))
}

pub fn run_indexer_with(
    config: &PipelineConfig,
    stop: StopSignal,
    pdf: Box<dyn PdfExtractor>,
) -> Result<RunReport, RunError> {
    tracing::info!(
        input = %config.input.display(),
        config_dir = %config.config_dir.display(),
        checkpoint_dir = %config.checkpoint_dir.display(),
        checkpoint_interval = config.interval(),
        resume = config.resume,
        "Starting indexer"
    );

    let corpus = Corpus::discover(&config.input)?;
    let stages = StageRegistry::from_catalog(Catalog::load(&config.config_dir));
    let runner = BatchRunner::new(
        DocumentReader::new(pdf),
        stages,
        CheckpointManager::new(&config.checkpoint_dir),
        config,
    )
    .with_stop_signal(stop);

    let mut report = RunReport::from_outcome(runner.run(&corpus));

    if let (Some(export), Some(body)) = (&config.search_export, report.results.as_mut()) {
        body.diagnostics.export_failures = export_search(config, &body.results, &export.index_name);
    }
    Ok(report)
}

/// Write the bulk file and its index mapping. Failures are returned as
/// report diagnostics; the indexing work is already checkpointed.
fn export_search(config: &PipelineConfig, results: &[DocumentResult], index_name: &str) -> Vec<String> {
    let mut failures = Vec::new();
    if let Err(e) = search_export::write_bulk(&config.search_export_path(), results, index_name) {
        tracing::warn!(error = %e, "Search export failed");
        failures.push(e.to_string());
    }
    if let Err(e) = search_export::write_mapping(&config.search_mapping_path()) {
        tracing::warn!(error = %e, "Search index mapping export failed");
        failures.push(e.to_string());
    }
    failures
}
