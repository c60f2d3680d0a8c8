//! Dictionary-style configuration: name lexicons, theme keywords, places.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use super::error::CatalogError;

pub const DEFAULT_PREPOSITIONS: [&str; 5] = ["da", "das", "do", "dos", "de"];

// ═══════════════════════════════════════════════════════════
// Keyword patterns
// ═══════════════════════════════════════════════════════════

/// A literal term matched case-insensitively on word boundaries.
#[derive(Debug, Clone)]
pub struct KeywordPattern {
    pub term: String,
    pattern: Regex,
}

impl KeywordPattern {
    pub fn new(term: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)))?;
        Ok(Self {
            term: term.to_string(),
            pattern,
        })
    }

    pub fn count_in(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }
}

fn keyword_pattern(path: &Path, term: &str) -> Result<KeywordPattern, CatalogError> {
    KeywordPattern::new(term).map_err(|e| CatalogError::Invalid {
        path: path.to_path_buf(),
        reason: format!("keyword '{term}': {e}"),
    })
}

// ═══════════════════════════════════════════════════════════
// Names
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
struct NamesFile {
    #[serde(default)]
    first_names: Vec<serde_json::Value>,
    #[serde(default)]
    second_names: Vec<serde_json::Value>,
    #[serde(default)]
    prepositions: Vec<serde_json::Value>,
}

/// First names and surnames are stored capitalized, prepositions lowercased.
#[derive(Debug, Clone)]
pub struct NameLexicon {
    pub first_names: HashSet<String>,
    pub second_names: HashSet<String>,
    pub prepositions: HashSet<String>,
}

impl NameLexicon {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file: NamesFile = super::read_json(path)?;
        let lexicon = Self::new(
            string_entries(&file.first_names),
            string_entries(&file.second_names),
            string_entries(&file.prepositions),
        );
        if lexicon.first_names.is_empty() {
            return Err(CatalogError::Invalid {
                path: path.to_path_buf(),
                reason: "no first_names".into(),
            });
        }
        Ok(lexicon)
    }

    /// Empty `prepositions` falls back to the Portuguese defaults.
    pub fn new<S: AsRef<str>>(first: Vec<S>, second: Vec<S>, prepositions: Vec<S>) -> Self {
        let mut prepositions: HashSet<String> = prepositions
            .iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        if prepositions.is_empty() {
            prepositions = DEFAULT_PREPOSITIONS.iter().map(|p| p.to_string()).collect();
        }
        Self {
            first_names: capitalized_set(&first),
            second_names: capitalized_set(&second),
            prepositions,
        }
    }
}

fn string_entries(values: &[serde_json::Value]) -> Vec<&str> {
    values.iter().filter_map(|v| v.as_str()).collect()
}

fn capitalized_set<S: AsRef<str>>(values: &[S]) -> HashSet<String> {
    values
        .iter()
        .map(|v| capitalize(v.as_ref().trim()))
        .filter(|v| !v.is_empty())
        .collect()
}

/// First character uppercased, the rest lowercased.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════
// Themes
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub keywords: Vec<KeywordPattern>,
}

#[derive(Debug, Clone)]
pub struct ThemeKeywords {
    pub themes: Vec<Theme>,
}

impl ThemeKeywords {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw: serde_json::Map<String, serde_json::Value> = super::read_json(path)?;
        let mut themes = Vec::new();

        for (name, value) in raw {
            let Some(entries) = value.as_array() else {
                tracing::debug!(theme = %name, "Theme entry is not a keyword list, dropped");
                continue;
            };
            let mut seen = HashSet::new();
            let mut keywords = Vec::new();
            for term in entries.iter().filter_map(|v| v.as_str()).map(str::trim) {
                if term.is_empty() || !seen.insert(term.to_lowercase()) {
                    continue;
                }
                keywords.push(keyword_pattern(path, term)?);
            }
            if keywords.is_empty() {
                tracing::debug!(theme = %name, "Theme has no usable keywords, dropped");
                continue;
            }
            themes.push(Theme { name, keywords });
        }

        if themes.is_empty() {
            return Err(CatalogError::Invalid {
                path: path.to_path_buf(),
                reason: "no theme with keywords".into(),
            });
        }
        Ok(Self { themes })
    }
}

// ═══════════════════════════════════════════════════════════
// Places
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct PlaceList {
    pub places: Vec<KeywordPattern>,
}

impl PlaceList {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = super::read_text(path)?;
        let mut seen = HashSet::new();
        let mut places = Vec::new();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || !seen.insert(line.to_lowercase()) {
                continue;
            }
            places.push(keyword_pattern(path, line)?);
        }
        if places.is_empty() {
            return Err(CatalogError::Invalid {
                path: path.to_path_buf(),
                reason: "places list is empty".into(),
            });
        }
        Ok(Self { places })
    }
}
