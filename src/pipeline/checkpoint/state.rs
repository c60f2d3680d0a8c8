use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DocumentResult, FailureRecord};
use crate::pipeline::import::InputItem;

/// The resumable unit of a run.
///
/// Results are persisted next to the state, not inside it, so progress
/// manifests stay small. `settled` is a lookup index rebuilt after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    /// Number of times this run has been resumed from a snapshot.
    #[serde(default)]
    pub resumes: u32,
    pub items: Vec<InputItem>,
    pub completed: Vec<String>,
    pub failed: Vec<FailureRecord>,
    /// Incremented once per completed document.
    pub sequence: u64,
    #[serde(skip)]
    pub results: Vec<DocumentResult>,
    #[serde(skip)]
    settled: HashSet<String>,
}

impl RunState {
    pub fn new(session_id: impl Into<String>, items: Vec<InputItem>) -> Self {
        Self {
            session_id: session_id.into(),
            started_at: Utc::now(),
            resumes: 0,
            items,
            completed: Vec::new(),
            failed: Vec::new(),
            sequence: 0,
            results: Vec::new(),
            settled: HashSet::new(),
        }
    }

    pub fn new_session(items: Vec<InputItem>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), items)
    }

    /// Rebuild the settled-identifier index from the persisted lists.
    pub fn rebuild_index(&mut self) {
        self.settled = self
            .completed
            .iter()
            .cloned()
            .chain(self.failed.iter().map(|f| f.document_id.clone()))
            .collect();
    }

    /// Completed or permanently failed.
    pub fn is_settled(&self, document_id: &str) -> bool {
        self.settled.contains(document_id)
    }

    pub fn record_completed(&mut self, result: DocumentResult) {
        self.settled.insert(result.document_id.clone());
        self.completed.push(result.document_id.clone());
        self.results.push(result);
        self.sequence += 1;
    }

    pub fn record_failed(&mut self, document_id: &str, reason: impl Into<String>) {
        self.settled.insert(document_id.to_string());
        self.failed.push(FailureRecord {
            document_id: document_id.to_string(),
            reason: reason.into(),
        });
    }

    /// Documents that reached a terminal state.
    pub fn attempted(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Analyses, SourceKind};

    fn make_result(id: &str) -> DocumentResult {
        DocumentResult {
            document_id: id.into(),
            source_kind: SourceKind::Pdf,
            title: id.into(),
            file_path: None,
            text: "texto".into(),
            word_count: 1,
            character_count: 5,
            analyses: Analyses::default(),
            diagnostics: vec![],
            original_data: None,
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn completion_increments_sequence_failures_do_not() {
        let mut state = RunState::new("s1", vec![]);
        state.record_completed(make_result("a"));
        state.record_failed("b", "corrupt");
        state.record_completed(make_result("c"));

        assert_eq!(state.sequence, 2);
        assert_eq!(state.attempted(), 3);
        assert!(state.is_settled("a"));
        assert!(state.is_settled("b"));
        assert!(!state.is_settled("d"));
    }

    #[test]
    fn index_is_rebuilt_after_deserialization() {
        let mut state = RunState::new("s1", vec![]);
        state.record_completed(make_result("a"));
        state.record_failed("b", "corrupt");

        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("settled"));
        assert!(!json.contains("\"results\""));

        let mut restored: RunState = serde_json::from_str(&json).unwrap();
        assert!(!restored.is_settled("a"));
        restored.rebuild_index();
        assert!(restored.is_settled("a"));
        assert!(restored.is_settled("b"));
    }
}
