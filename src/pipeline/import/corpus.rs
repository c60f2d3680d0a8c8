use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::format::{detect_input_kind, has_extension, InputKind};
use super::ImportError;
use crate::models::SourceKind;

/// One document source. Immutable once discovered; persisted in run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputItem {
    pub document_id: String,
    pub source_kind: SourceKind,
    /// The PDF file, or the JSON corpus holding the record.
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_index: Option<usize>,
}

/// Discovered input set, in deterministic processing order.
#[derive(Debug)]
pub struct Corpus {
    pub kind: InputKind,
    pub source: PathBuf,
    pub items: Vec<InputItem>,
    records: Vec<Value>,
}

impl Corpus {
    pub fn discover(path: &Path) -> Result<Self, ImportError> {
        let kind = detect_input_kind(path)?;
        let corpus = match kind {
            InputKind::PdfDirectory => Self::discover_pdf_directory(path)?,
            InputKind::PdfFile => Self {
                kind,
                source: path.to_path_buf(),
                items: vec![pdf_item(path)],
                records: Vec::new(),
            },
            InputKind::JsonCorpus => Self::discover_json(path)?,
        };
        tracing::info!(
            source = %path.display(),
            kind = kind.as_str(),
            items = corpus.items.len(),
            "Input discovered"
        );
        Ok(corpus)
    }

    fn discover_pdf_directory(dir: &Path) -> Result<Self, ImportError> {
        let entries = std::fs::read_dir(dir).map_err(|source| ImportError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ImportError::DirectoryRead {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && has_extension(&path, "pdf") {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(Self {
            kind: InputKind::PdfDirectory,
            source: dir.to_path_buf(),
            items: files.iter().map(|p| pdf_item(p)).collect(),
            records: Vec::new(),
        })
    }

    fn discover_json(path: &Path) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path)?;
        let parsed: Value =
            serde_json::from_str(&content).map_err(|source| ImportError::InvalidJson {
                path: path.to_path_buf(),
                source,
            })?;
        let records = match parsed {
            Value::Array(records) => records,
            single => vec![single],
        };
        Ok(Self::from_records(path, records))
    }

    /// Build a JSON corpus from already-parsed records.
    pub fn from_records(path: &Path, records: Vec<Value>) -> Self {
        let mut seen = HashSet::new();
        let items = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let mut document_id = record_id(record, index);
                if !seen.insert(document_id.clone()) {
                    let unique = format!("{document_id}-{index}");
                    tracing::warn!(
                        document_id = %document_id,
                        renamed = %unique,
                        "Duplicate record identifier"
                    );
                    seen.insert(unique.clone());
                    document_id = unique;
                }
                InputItem {
                    document_id,
                    source_kind: SourceKind::JsonRecord,
                    path: path.to_path_buf(),
                    record_index: Some(index),
                }
            })
            .collect();

        Self {
            kind: InputKind::JsonCorpus,
            source: path.to_path_buf(),
            items,
            records,
        }
    }

    pub fn record(&self, index: usize) -> Option<&Value> {
        self.records.get(index)
    }
}

fn pdf_item(path: &Path) -> InputItem {
    InputItem {
        document_id: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        source_kind: SourceKind::Pdf,
        path: path.to_path_buf(),
        record_index: None,
    }
}

/// `_id`, then `id` (string or number), else `record-<index>`.
pub fn record_id(record: &Value, index: usize) -> String {
    ["_id", "id"]
        .iter()
        .filter_map(|key| match record.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .next()
        .unwrap_or_else(|| format!("record-{index}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pdf_directory_sorted_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.pdf", "a.PDF", "b.pdf", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"%PDF").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let corpus = Corpus::discover(dir.path()).unwrap();
        let ids: Vec<_> = corpus.items.iter().map(|i| i.document_id.as_str()).collect();
        assert_eq!(ids, vec!["a.PDF", "b.pdf", "c.pdf"]);
        assert!(corpus.items.iter().all(|i| i.source_kind == SourceKind::Pdf));
    }

    #[test]
    fn json_ids_prefer_underscore_id_then_id_then_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acervo.json");
        std::fs::write(
            &path,
            r#"[{"_id": "doc1", "id": "x"}, {"id": 42}, {"title": "sem id"}]"#,
        )
        .unwrap();

        let corpus = Corpus::discover(&path).unwrap();
        let ids: Vec<_> = corpus.items.iter().map(|i| i.document_id.as_str()).collect();
        assert_eq!(ids, vec!["doc1", "42", "record-2"]);
        assert_eq!(corpus.items[2].record_index, Some(2));
        assert_eq!(corpus.record(1), Some(&json!({"id": 42})));
    }

    #[test]
    fn single_object_is_a_one_record_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.json");
        std::fs::write(&path, r#"{"_id": "only", "content": "texto"}"#).unwrap();
        let corpus = Corpus::discover(&path).unwrap();
        assert_eq!(corpus.items.len(), 1);
        assert_eq!(corpus.items[0].document_id, "only");
    }

    #[test]
    fn duplicate_ids_are_disambiguated_by_index() {
        let corpus = Corpus::from_records(
            Path::new("dup.json"),
            vec![json!({"_id": "a"}), json!({"_id": "a"})],
        );
        let ids: Vec<_> = corpus.items.iter().map(|i| i.document_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a-1"]);
    }

    #[test]
    fn unparsable_json_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{").unwrap();
        assert!(matches!(
            Corpus::discover(&path),
            Err(ImportError::InvalidJson { .. })
        ));
    }
}
