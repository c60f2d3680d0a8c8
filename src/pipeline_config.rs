//! Run configuration for the indexing pipeline.
//!
//! Built once from the command line and passed down unchanged. Analysis
//! tuning (year range, consistency normalization, rounding) is not here:
//! it lives with the date rules in the configuration directory.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 5;

/// Flattened search-engine export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchExportConfig {
    /// Target index name written into each bulk action header.
    pub index_name: String,
}

impl Default for SearchExportConfig {
    fn default() -> Self {
        Self {
            index_name: config::DEFAULT_SEARCH_INDEX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// PDF directory, single PDF, or JSON corpus.
    pub input: PathBuf,
    pub config_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
    /// Where the final report is written, besides stdout.
    pub output: Option<PathBuf>,
    /// Completions between progress snapshots. Never zero.
    pub checkpoint_interval: u64,
    /// Continue from the latest valid snapshot when one exists.
    pub resume: bool,
    pub search_export: Option<SearchExportConfig>,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            config_dir: config::default_config_dir(),
            checkpoint_dir: config::default_checkpoint_dir(),
            output: None,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            resume: true,
            search_export: None,
        }
    }

    pub fn interval(&self) -> u64 {
        self.checkpoint_interval.max(1)
    }

    /// `<output-stem>_search.ndjson` next to the report, or the default file.
    pub fn search_export_path(&self) -> PathBuf {
        match &self.output {
            Some(output) => sibling_with_suffix(output, "_search.ndjson"),
            None => PathBuf::from(config::DEFAULT_SEARCH_EXPORT_FILE),
        }
    }

    /// Index mapping written alongside the bulk file.
    pub fn search_mapping_path(&self) -> PathBuf {
        match &self.output {
            Some(output) => sibling_with_suffix(output, "_mapping.json"),
            None => PathBuf::from(config::DEFAULT_SEARCH_MAPPING_FILE),
        }
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    path.with_file_name(format!("{stem}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resume_every_five() {
        let config = PipelineConfig::new("acervo.json");
        assert!(config.resume);
        assert_eq!(config.checkpoint_interval, 5);
        assert!(config.search_export.is_none());
        assert_eq!(config.config_dir, PathBuf::from("./data"));
    }

    #[test]
    fn zero_interval_is_treated_as_one() {
        let mut config = PipelineConfig::new("x");
        config.checkpoint_interval = 0;
        assert_eq!(config.interval(), 1);
    }

    #[test]
    fn search_export_path_follows_output() {
        let mut config = PipelineConfig::new("x");
        assert_eq!(config.search_export_path(), PathBuf::from("search_export.ndjson"));
        config.output = Some(PathBuf::from("out/relatorio.json"));
        assert_eq!(
            config.search_export_path(),
            PathBuf::from("out/relatorio_search.ndjson")
        );
        assert_eq!(
            config.search_mapping_path(),
            PathBuf::from("out/relatorio_mapping.json")
        );
    }
}
