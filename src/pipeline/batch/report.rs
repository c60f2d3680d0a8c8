//! Final run report and aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::runner::RunOutcome;
use crate::models::{DocumentResult, FailureRecord, RunStatus};
use crate::pipeline::analysis::UnavailableStage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub message: String,
    /// Absent only for run-fatal errors.
    pub results: Option<ReportBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBody {
    pub indexing_session: SessionSummary,
    pub processed_files: Vec<String>,
    pub failed_files: Vec<FailureRecord>,
    pub results: Vec<DocumentResult>,
    pub statistics: Statistics,
    pub diagnostics: RunDiagnostics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub resumes: u32,
    pub interrupted: bool,
    pub total_discovered: usize,
    pub total_processed: usize,
    pub total_failed: usize,
    pub total_results: usize,
    /// Documents settled by this invocation, excluding those carried over.
    pub processed_this_run: usize,
    /// `completed / (completed + failed)`, 0 when nothing was attempted.
    pub success_rate: f64,
}

/// Aggregates over completed documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_documents: usize,
    pub total_word_count: usize,
    pub documents_with_dates: usize,
    pub documents_with_names: usize,
    pub documents_with_themes: usize,
    pub documents_with_places: usize,
    #[serde(default)]
    pub documents_with_references: usize,
    pub documents_with_stage_errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub unavailable_stages: Vec<UnavailableStage>,
    pub checkpoint_failures: Vec<String>,
    /// Search export files that could not be written. The run still succeeds.
    #[serde(default)]
    pub export_failures: Vec<String>,
}

pub fn success_rate(completed: usize, failed: usize) -> f64 {
    let attempted = completed + failed;
    if attempted == 0 {
        0.0
    } else {
        completed as f64 / attempted as f64
    }
}

impl Statistics {
    pub fn from_results(results: &[DocumentResult]) -> Self {
        let count = |pred: fn(&DocumentResult) -> bool| results.iter().filter(|r| pred(r)).count();
        Self {
            total_documents: results.len(),
            total_word_count: results.iter().map(|r| r.word_count).sum(),
            documents_with_dates: count(|r| r.analyses.temporal.is_some()),
            documents_with_names: count(|r| r.analyses.names.is_some()),
            documents_with_themes: count(|r| r.analyses.themes.is_some()),
            documents_with_places: count(|r| r.analyses.places.is_some()),
            documents_with_references: count(|r| r.analyses.references.is_some()),
            documents_with_stage_errors: count(|r| !r.diagnostics.is_empty()),
        }
    }
}

impl RunReport {
    pub fn from_outcome(outcome: RunOutcome) -> Self {
        let RunOutcome {
            state,
            interrupted,
            processed_this_run,
            unavailable_stages,
            checkpoint_failures,
        } = outcome;

        let completed = state.completed.len();
        let failed = state.failed.len();
        let statistics = Statistics::from_results(&state.results);

        let message = if interrupted {
            format!(
                "Interrupted: {completed} documents indexed, {failed} failed; resume to continue"
            )
        } else {
            format!("Indexing completed: {completed} documents indexed, {failed} failed")
        };

        Self {
            status: RunStatus::Success,
            message,
            results: Some(ReportBody {
                indexing_session: SessionSummary {
                    session_id: state.session_id,
                    started_at: state.started_at,
                    completed_at: Utc::now(),
                    resumes: state.resumes,
                    interrupted,
                    total_discovered: state.items.len(),
                    total_processed: completed,
                    total_failed: failed,
                    total_results: state.results.len(),
                    processed_this_run,
                    success_rate: success_rate(completed, failed),
                },
                processed_files: state.completed,
                failed_files: state.failed,
                results: state.results,
                statistics,
                diagnostics: RunDiagnostics {
                    unavailable_stages,
                    checkpoint_failures,
                    export_failures: Vec::new(),
                },
            }),
        }
    }

    /// Report for a run that could not start or finish.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            message: message.into(),
            results: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Analyses, NameFinding, ReferenceFinding, SourceKind, StageDiagnostic, StageKind,
    };
    use crate::pipeline::checkpoint::RunState;

    fn make_result(id: &str, words: usize, names: bool) -> DocumentResult {
        let mut analyses = Analyses::default();
        if names {
            analyses.names = Some(NameFinding {
                names: vec!["João".into()],
                count: 1,
            });
        }
        DocumentResult {
            document_id: id.into(),
            source_kind: SourceKind::Pdf,
            title: id.into(),
            file_path: None,
            text: "x ".repeat(words),
            word_count: words,
            character_count: words * 2,
            analyses,
            diagnostics: vec![],
            original_data: None,
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn success_rate_is_zero_when_nothing_attempted() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(3, 1), 0.75);
        assert_eq!(success_rate(1, 0), 1.0);
    }

    #[test]
    fn statistics_count_stage_coverage() {
        let mut with_error = make_result("c", 1, false);
        with_error.diagnostics.push(StageDiagnostic {
            stage: StageKind::Themes,
            message: "boom".into(),
        });
        let mut with_references = make_result("b", 5, false);
        with_references.analyses.references = Some(ReferenceFinding {
            references: vec![],
            total_references: 0,
            authors: vec![],
            years: vec![],
        });
        let stats = Statistics::from_results(&[
            make_result("a", 10, true),
            with_references,
            with_error,
        ]);
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.total_word_count, 16);
        assert_eq!(stats.documents_with_names, 1);
        assert_eq!(stats.documents_with_dates, 0);
        assert_eq!(stats.documents_with_references, 1);
        assert_eq!(stats.documents_with_stage_errors, 1);
    }

    #[test]
    fn report_from_outcome_totals_match_state() {
        let mut state = RunState::new("s1", vec![]);
        state.record_completed(make_result("a", 3, false));
        state.record_failed("b", "Extracted text is empty");

        let report = RunReport::from_outcome(RunOutcome {
            state,
            interrupted: false,
            processed_this_run: 2,
            unavailable_stages: vec![],
            checkpoint_failures: vec!["disk full".into()],
        });

        assert!(report.is_success());
        let body = report.results.unwrap();
        assert_eq!(body.indexing_session.total_processed, 1);
        assert_eq!(body.indexing_session.total_failed, 1);
        assert_eq!(body.indexing_session.success_rate, 0.5);
        assert_eq!(body.processed_files, vec!["a"]);
        assert_eq!(body.failed_files[0].document_id, "b");
        assert_eq!(body.diagnostics.checkpoint_failures, vec!["disk full"]);
    }

    #[test]
    fn error_report_has_no_results() {
        let report = RunReport::error("Input path not found: /nada");
        assert_eq!(report.status, RunStatus::Error);
        assert!(report.results.is_none());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["results"].is_null());
    }
}
