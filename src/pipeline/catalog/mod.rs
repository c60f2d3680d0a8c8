//! Configuration store: the read-only inputs that back each analysis stage.
//!
//! Every file loads independently. A missing or malformed file leaves its
//! slot as an error, which later turns the matching stage `Unavailable`
//! without affecting the others.

pub mod dates;
pub mod error;
pub mod lexicon;

pub use dates::{DateRules, RawMention};
pub use error::CatalogError;
pub use lexicon::{KeywordPattern, NameLexicon, PlaceList, ThemeKeywords};

use std::path::Path;

use serde::de::DeserializeOwned;

pub const THEMES_FILE: &str = "themes.json";
pub const DATE_CONFIG_FILE: &str = "date_config.json";
pub const NAMES_FILE: &str = "names.json";
pub const PLACES_FILE: &str = "places.txt";

/// Loaded configuration, one slot per stage.
#[derive(Debug)]
pub struct Catalog {
    pub date_rules: Result<DateRules, CatalogError>,
    pub names: Result<NameLexicon, CatalogError>,
    pub themes: Result<ThemeKeywords, CatalogError>,
    pub places: Result<PlaceList, CatalogError>,
}

impl Catalog {
    /// Load every configuration file under `config_dir`. Never fails as a whole.
    pub fn load(config_dir: &Path) -> Self {
        let catalog = Self {
            date_rules: DateRules::load(&config_dir.join(DATE_CONFIG_FILE)),
            names: NameLexicon::load(&config_dir.join(NAMES_FILE)),
            themes: ThemeKeywords::load(&config_dir.join(THEMES_FILE)),
            places: PlaceList::load(&config_dir.join(PLACES_FILE)),
        };
        tracing::info!(
            config_dir = %config_dir.display(),
            dates = catalog.date_rules.is_ok(),
            names = catalog.names.is_ok(),
            themes = catalog.themes.is_ok(),
            places = catalog.places.is_ok(),
            "Configuration loaded"
        );
        catalog
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_leaves_every_slot_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(dir.path());
        assert!(matches!(catalog.date_rules, Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.names, Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.themes, Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.places, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn malformed_file_affects_only_its_slot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(THEMES_FILE), "{not json").unwrap();
        std::fs::write(
            dir.path().join(DATE_CONFIG_FILE),
            r#"{"century_map": {"XVII": 1600}, "part_map": {"meio": [33, 66]}}"#,
        )
        .unwrap();

        let catalog = Catalog::load(dir.path());
        assert!(matches!(catalog.themes, Err(CatalogError::Json { .. })));
        assert!(catalog.date_rules.is_ok());
    }
}
