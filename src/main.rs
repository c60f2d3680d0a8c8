//! archive-indexer command line.
//!
//! ```bash
//! archive-indexer ./acervo --config-dir ./data --output relatorio.json --search-export
//! ```
//!
//! The report is printed to stdout. Logs go to stderr (`RUST_LOG` to tune).

use std::path::PathBuf;
use std::process::ExitCode;

use archive_indexer::config;
use archive_indexer::pipeline::batch::{run_indexer, RunReport, StopSignal};
use archive_indexer::pipeline_config::{PipelineConfig, SearchExportConfig, DEFAULT_CHECKPOINT_INTERVAL};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "archive-indexer", version)]
#[command(about = "Resumable indexer for historical document collections", long_about = None)]
struct Cli {
    /// PDF directory, single PDF, or JSON file of records
    input: PathBuf,

    /// Directory with themes.json, date_config.json, names.json, places.txt
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Directory for checkpoint snapshots
    #[arg(short = 'b', long, default_value = config::DEFAULT_CHECKPOINT_DIR)]
    checkpoint_dir: PathBuf,

    /// Also write the final report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a search-engine bulk file next to the report
    #[arg(long)]
    search_export: bool,

    /// Index name used in the bulk file
    #[arg(long, default_value = config::DEFAULT_SEARCH_INDEX)]
    search_index: String,

    /// Ignore existing checkpoints and start a new session
    #[arg(long)]
    no_resume: bool,

    /// Completed documents between progress snapshots
    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_INTERVAL, value_parser = clap::value_parser!(u64).range(1..))]
    checkpoint_interval: u64,
}

impl Cli {
    fn into_config(self) -> PipelineConfig {
        let mut config = PipelineConfig::new(self.input);
        config.config_dir = self.config_dir;
        config.checkpoint_dir = self.checkpoint_dir;
        config.output = self.output;
        config.checkpoint_interval = self.checkpoint_interval;
        config.resume = !self.no_resume;
        config.search_export = self.search_export.then(|| SearchExportConfig {
            index_name: self.search_index,
        });
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    archive_indexer::init_tracing();
    let config = cli.into_config();

    let stop = StopSignal::new();
    let handler = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current document then checkpointing");
            handler.request_stop();
        }
    });

    let run_config = config.clone();
    let report = match tokio::task::spawn_blocking(move || run_indexer(&run_config, stop)).await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Indexing failed");
            RunReport::error(e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Indexing task aborted");
            RunReport::error(format!("Indexing task aborted: {e}"))
        }
    };

    let rendered = match serde_json::to_string_pretty(&report) {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::error!(error = %e, "Cannot serialize report");
            return ExitCode::FAILURE;
        }
    };
    println!("{rendered}");

    if let Some(path) = &config.output {
        if let Err(e) = std::fs::write(path, &rendered) {
            tracing::error!(path = %path.display(), error = %e, "Cannot write report");
            return ExitCode::FAILURE;
        }
        tracing::info!(path = %path.display(), "Report written");
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Cli::parse_from(["archive-indexer", "acervo.json"]).into_config();
        assert_eq!(config.config_dir, PathBuf::from("./data"));
        assert_eq!(config.checkpoint_dir, PathBuf::from("./backups"));
        assert_eq!(config.checkpoint_interval, 5);
        assert!(config.resume);
        assert!(config.search_export.is_none());
    }

    #[test]
    fn flags_map_onto_pipeline_config() {
        let config = Cli::parse_from([
            "archive-indexer",
            "pdfs",
            "-c",
            "conf",
            "-b",
            "ckpt",
            "-o",
            "out.json",
            "--search-export",
            "--search-index",
            "acervo",
            "--no-resume",
            "--checkpoint-interval",
            "2",
        ])
        .into_config();
        assert_eq!(config.checkpoint_dir, PathBuf::from("ckpt"));
        assert!(!config.resume);
        assert_eq!(config.interval(), 2);
        assert_eq!(config.search_export.as_ref().unwrap().index_name, "acervo");
        assert_eq!(config.search_export_path(), PathBuf::from("out_search.ndjson"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Cli::try_parse_from(["archive-indexer", "x", "--checkpoint-interval", "0"]).is_err());
    }
}
