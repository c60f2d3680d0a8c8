use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "archive-indexer";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_CONFIG_DIR: &str = "./data";
pub const DEFAULT_CHECKPOINT_DIR: &str = "./backups";
pub const DEFAULT_SEARCH_INDEX: &str = "documents";
pub const DEFAULT_SEARCH_EXPORT_FILE: &str = "search_export.ndjson";
pub const DEFAULT_SEARCH_MAPPING_FILE: &str = "search_mapping.json";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_CRATE_NAME"))
}

/// Directory holding themes.json, date_config.json, names.json and places.txt.
pub fn default_config_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_DIR)
}

/// Directory holding checkpoint snapshots.
pub fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CHECKPOINT_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_targets_this_crate() {
        assert_eq!(default_log_filter(), "archive_indexer=info");
    }

    #[test]
    fn default_dirs_are_relative() {
        assert!(default_config_dir().is_relative());
        assert!(default_checkpoint_dir().ends_with("backups"));
    }

    #[test]
    fn app_name_is_archive_indexer() {
        assert_eq!(APP_NAME, "archive-indexer");
    }
}
