use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Closed year interval resolved from an era mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearInterval {
    pub start: i32,
    pub end: i32,
}

/// Temporal statistics for one document.
///
/// Only constructed when at least one representative year survived range
/// filtering; an empty year set is represented by the finding being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalFinding {
    /// Representative years in mention order. Repeated mentions repeat here.
    pub representative_years: Vec<i32>,
    pub explicit_years: Vec<i32>,
    pub textual_intervals: Vec<YearInterval>,
    /// Era/century phrases exactly as they appeared in the text.
    pub era_mentions: Vec<String>,
    /// Distinct century labels of the representative years, ascending.
    pub centuries: Vec<String>,
    pub mean: f64,
    pub median: f64,
    pub minimum: i32,
    pub maximum: i32,
    pub mean_absolute_deviation: f64,
    pub standard_deviation: f64,
    pub consistency: f64,
    /// `round(mean - std) ..= round(mean + std)`.
    pub dense_range: YearInterval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameFinding {
    /// Distinct names in order of first appearance.
    pub names: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeFinding {
    pub theme_counts: BTreeMap<String, usize>,
    pub matched_keywords: BTreeMap<String, Vec<String>>,
    pub top_theme: String,
    pub total_keywords_found: usize,
    pub theme_percentages: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceFinding {
    pub place_counts: BTreeMap<String, usize>,
    pub total_occurrences: usize,
}

/// One parsed entry of a bibliography section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// The entry text with its lines joined.
    pub raw: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceFinding {
    pub references: Vec<Reference>,
    pub total_references: usize,
    /// Distinct authors in order of first appearance.
    pub authors: Vec<String>,
    /// Distinct years, ascending.
    pub years: Vec<String>,
}

/// Per-stage findings of one document. A field is absent when the stage was
/// unavailable, found nothing, or failed on this document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analyses {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<NameFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub themes: Option<ThemeFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places: Option<PlaceFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ReferenceFinding>,
}

impl Analyses {
    pub fn is_empty(&self) -> bool {
        self.temporal.is_none()
            && self.names.is_none()
            && self.themes.is_none()
            && self.places.is_none()
            && self.references.is_none()
    }
}
