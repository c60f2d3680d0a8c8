use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{SourceKind, StageKind};
use super::finding::Analyses;

/// A stage that failed on one document without affecting the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDiagnostic {
    pub stage: StageKind,
    pub message: String,
}

/// Output of processing one input item. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub document_id: String,
    pub source_kind: SourceKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub text: String,
    pub word_count: usize,
    pub character_count: usize,
    #[serde(default)]
    pub analyses: Analyses,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<StageDiagnostic>,
    /// The source record for JSON inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_data: Option<serde_json::Value>,
    pub processed_at: DateTime<Utc>,
}

/// An input item that could not produce text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub document_id: String,
    pub reason: String,
}

/// Whitespace-separated token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
