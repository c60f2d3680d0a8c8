//! CheckpointManager: append-only snapshot store.
//!
//! Layout (one stamp per snapshot, lexically sortable):
//! - `progress_<stamp>.json`: run state manifest, written last (commit marker)
//! - `results_<stamp>.json`: results completed since the previous progress
//!   snapshot of the same session
//! - `final_<stamp>.json`: run state and all results in one file
//!
//! A progress manifest lists its whole chain of results files in order, so
//! results are stored once however many snapshots reference them. Every file
//! is written to a `.tmp` sibling and renamed into place. Existing snapshots
//! are never overwritten or deleted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CheckpointError, RunState};
use crate::models::{DocumentResult, SnapshotKind};

const PROGRESS_PREFIX: &str = "progress_";
const RESULTS_PREFIX: &str = "results_";
const FINAL_PREFIX: &str = "final_";
const EXTENSION: &str = ".json";

#[derive(Serialize)]
struct SnapshotOut<'a> {
    kind: SnapshotKind,
    saved_at: DateTime<Utc>,
    results_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    results_files: Option<&'a [String]>,
    state: &'a RunState,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<&'a [DocumentResult]>,
}

#[derive(Deserialize)]
struct SnapshotIn {
    kind: SnapshotKind,
    results_count: usize,
    #[serde(default)]
    results_files: Option<Vec<String>>,
    state: RunState,
    #[serde(default)]
    results: Option<Vec<DocumentResult>>,
}

/// A snapshot file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub kind: SnapshotKind,
    pub stamp: String,
    pub file_name: String,
}

/// Results files already committed for one session, covering
/// `results[..covered]`.
#[derive(Debug, Default)]
struct ResultsChain {
    session_id: String,
    files: Vec<String>,
    covered: usize,
}

pub struct CheckpointManager {
    dir: PathBuf,
    counter: AtomicU32,
    chain: Mutex<ResultsChain>,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicU32::new(0),
            chain: Mutex::new(ResultsChain::default()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a new snapshot of `state`. Returns the committed file.
    pub fn save(&self, state: &RunState, kind: SnapshotKind) -> Result<PathBuf, CheckpointError> {
        std::fs::create_dir_all(&self.dir)?;
        let stamp = self.next_free_stamp();
        let results_count = state.results.len();

        let committed = match kind {
            SnapshotKind::Progress => {
                let mut chain = self.chain.lock().unwrap_or_else(PoisonError::into_inner);
                if chain.session_id != state.session_id || chain.covered > results_count {
                    *chain = ResultsChain {
                        session_id: state.session_id.clone(),
                        ..ResultsChain::default()
                    };
                }

                let mut files = chain.files.clone();
                let delta = &state.results[chain.covered..];
                if !delta.is_empty() {
                    let results_name = format!("{RESULTS_PREFIX}{stamp}{EXTENSION}");
                    write_atomic(&self.dir.join(&results_name), &serde_json::to_vec(delta)?)?;
                    files.push(results_name);
                }

                let manifest = SnapshotOut {
                    kind,
                    saved_at: Utc::now(),
                    results_count,
                    results_files: Some(files.as_slice()),
                    state,
                    results: None,
                };
                let path = self.dir.join(format!("{PROGRESS_PREFIX}{stamp}{EXTENSION}"));
                write_atomic(&path, &serde_json::to_vec_pretty(&manifest)?)?;

                // Advance only once the manifest referencing the delta is committed.
                chain.files = files;
                chain.covered = results_count;
                path
            }
            SnapshotKind::Final => {
                let snapshot = SnapshotOut {
                    kind,
                    saved_at: Utc::now(),
                    results_count,
                    results_files: None,
                    state,
                    results: Some(state.results.as_slice()),
                };
                let path = self.dir.join(format!("{FINAL_PREFIX}{stamp}{EXTENSION}"));
                write_atomic(&path, &serde_json::to_vec(&snapshot)?)?;
                path
            }
        };

        tracing::info!(
            kind = kind.as_str(),
            sequence = state.sequence,
            completed = state.completed.len(),
            failed = state.failed.len(),
            path = %committed.display(),
            "Checkpoint saved"
        );
        Ok(committed)
    }

    /// Most recent snapshot that loads and validates, or `None`.
    ///
    /// Later progress snapshots of a restored session extend its results chain.
    pub fn load_latest(&self) -> Option<RunState> {
        for entry in self.snapshots() {
            match self.read_snapshot(&entry) {
                Ok((state, files)) => {
                    tracing::info!(
                        file = %entry.file_name,
                        session_id = %state.session_id,
                        completed = state.completed.len(),
                        failed = state.failed.len(),
                        "Resuming from checkpoint"
                    );
                    let mut chain = self.chain.lock().unwrap_or_else(PoisonError::into_inner);
                    *chain = match entry.kind {
                        SnapshotKind::Progress => ResultsChain {
                            session_id: state.session_id.clone(),
                            files,
                            covered: state.results.len(),
                        },
                        SnapshotKind::Final => ResultsChain::default(),
                    };
                    return Some(state);
                }
                Err(e) => tracing::warn!(
                    file = %entry.file_name,
                    error = %e,
                    "Skipping unusable checkpoint"
                ),
            }
        }
        None
    }

    /// Snapshots on disk, newest first.
    pub fn snapshots(&self) -> Vec<SnapshotEntry> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                if self.dir.exists() {
                    tracing::warn!(dir = %self.dir.display(), error = %e, "Cannot list checkpoints");
                }
                return Vec::new();
            }
        };
        let names: Vec<String> = entries
            .flatten()
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .collect();
        select_snapshots(&names)
    }

    pub fn load(&self, entry: &SnapshotEntry) -> Result<RunState, CheckpointError> {
        self.read_snapshot(entry).map(|(state, _)| state)
    }

    /// Restored state plus the results files a progress snapshot references.
    fn read_snapshot(&self, entry: &SnapshotEntry) -> Result<(RunState, Vec<String>), CheckpointError> {
        let content = std::fs::read_to_string(self.dir.join(&entry.file_name))?;
        let snapshot: SnapshotIn = serde_json::from_str(&content)?;
        if snapshot.kind != entry.kind {
            return Err(CheckpointError::Corrupt(format!(
                "file named {} holds a {} snapshot",
                entry.kind,
                snapshot.kind
            )));
        }

        let (results, files) = match entry.kind {
            SnapshotKind::Final => {
                let results = snapshot.results.ok_or_else(|| {
                    CheckpointError::Corrupt("final snapshot without results".into())
                })?;
                (results, Vec::new())
            }
            SnapshotKind::Progress => {
                let files = snapshot.results_files.ok_or_else(|| {
                    CheckpointError::Corrupt("progress manifest without results files".into())
                })?;
                let mut results = Vec::with_capacity(snapshot.results_count);
                for file in &files {
                    if file.contains(['/', '\\']) || !file.starts_with(RESULTS_PREFIX) {
                        return Err(CheckpointError::Corrupt(format!(
                            "unexpected results file name: {file}"
                        )));
                    }
                    let content = std::fs::read_to_string(self.dir.join(file))?;
                    results.extend(serde_json::from_str::<Vec<DocumentResult>>(&content)?);
                }
                (results, files)
            }
        };

        if results.len() != snapshot.results_count
            || results.len() != snapshot.state.completed.len()
        {
            return Err(CheckpointError::Corrupt(format!(
                "expected {} results for {} completed documents, found {}",
                snapshot.results_count,
                snapshot.state.completed.len(),
                results.len()
            )));
        }

        let mut state = snapshot.state;
        state.results = results;
        state.rebuild_index();
        Ok((state, files))
    }

    fn next_free_stamp(&self) -> String {
        loop {
            let stamp = format!(
                "{}-{:06}",
                Utc::now().format("%Y%m%dT%H%M%S%.6fZ"),
                self.counter.fetch_add(1, Ordering::Relaxed)
            );
            let taken = [PROGRESS_PREFIX, RESULTS_PREFIX, FINAL_PREFIX]
                .iter()
                .any(|prefix| self.dir.join(format!("{prefix}{stamp}{EXTENSION}")).exists());
            if !taken {
                return stamp;
            }
        }
    }
}

/// Pick snapshot files out of a directory listing, newest first.
///
/// Only `progress_*` and `final_*` files count; results files and `.tmp`
/// leftovers are ignored. Stamps are fixed-width, so lexical order is time order.
pub fn select_snapshots(file_names: &[String]) -> Vec<SnapshotEntry> {
    let mut entries: Vec<SnapshotEntry> = file_names
        .iter()
        .filter_map(|name| {
            let stem = name.strip_suffix(EXTENSION)?;
            let (kind, stamp) = if let Some(stamp) = stem.strip_prefix(PROGRESS_PREFIX) {
                (SnapshotKind::Progress, stamp)
            } else if let Some(stamp) = stem.strip_prefix(FINAL_PREFIX) {
                (SnapshotKind::Final, stamp)
            } else {
                return None;
            };
            (!stamp.is_empty()).then(|| SnapshotEntry {
                kind,
                stamp: stamp.to_string(),
                file_name: name.clone(),
            })
        })
        .collect();
    entries.sort_by(|a, b| b.stamp.cmp(&a.stamp));
    entries
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CheckpointError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
