//! Search-engine export: a flattened projection of each document result and
//! its bulk-index NDJSON encoding.
//!
//! Pure with respect to the results; only `write_bulk` touches the disk.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use super::RunError;
use crate::models::DocumentResult;

const PREVIEW_CHARS: usize = 500;
const EXPORTED_REFERENCE_AUTHORS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocument {
    pub document_id: String,
    pub document_type: String,
    pub title: String,
    pub content: String,
    pub full_content: String,
    pub names: Vec<String>,
    pub places: Vec<String>,
    /// First cited authors of the document's bibliography.
    pub reference_authors: Vec<String>,
    pub dates: DateBlock,
    pub themes: ThemeBlock,
    pub metadata: SearchMetadata,
    pub searchable_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range_years: Option<DateRange>,
    pub primary_theme: Option<String>,
    pub all_themes: Vec<String>,
    pub centuries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: i32,
    pub end: i32,
    pub span: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateBlock {
    pub years: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub centuries: Vec<String>,
    pub date_types: Vec<String>,
    pub total_dates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThemeBlock {
    pub primary_theme: Option<String>,
    pub all_themes: Vec<String>,
    pub theme_scores: BTreeMap<String, usize>,
    pub total_keywords: usize,
    pub theme_percentages: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub word_count: usize,
    pub character_count: usize,
    pub has_dates: bool,
    pub has_names: bool,
    pub has_themes: bool,
    pub has_places: bool,
    pub has_references: bool,
}

pub fn to_search_document(result: &DocumentResult) -> SearchDocument {
    let names = result
        .analyses
        .names
        .as_ref()
        .map(|n| n.names.clone())
        .unwrap_or_default();
    let places: Vec<String> = result
        .analyses
        .places
        .as_ref()
        .map(|p| p.place_counts.keys().cloned().collect())
        .unwrap_or_default();
    let reference_authors: Vec<String> = result
        .analyses
        .references
        .as_ref()
        .map(|r| r.authors.iter().take(EXPORTED_REFERENCE_AUTHORS).cloned().collect())
        .unwrap_or_default();
    let dates = date_block(result);
    let themes = theme_block(result);

    let mut searchable = vec![result.text.clone()];
    searchable.extend(names.iter().cloned());
    searchable.extend(themes.all_themes.iter().cloned());

    SearchDocument {
        document_id: result.document_id.clone(),
        document_type: result.source_kind.as_str().to_string(),
        title: result.title.clone(),
        content: preview(&result.text),
        full_content: result.text.clone(),
        metadata: SearchMetadata {
            file_path: result.file_path.clone(),
            processed_at: result.processed_at,
            word_count: result.word_count,
            character_count: result.character_count,
            has_dates: !dates.years.is_empty(),
            has_names: !names.is_empty(),
            has_themes: !themes.all_themes.is_empty(),
            has_places: !places.is_empty(),
            has_references: result.analyses.references.is_some(),
        },
        searchable_text: searchable.join(" "),
        date_range_years: dates.date_range,
        primary_theme: themes.primary_theme.clone(),
        all_themes: themes.all_themes.clone(),
        centuries: dates.centuries.clone(),
        names,
        places,
        reference_authors,
        dates,
        themes,
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn date_block(result: &DocumentResult) -> DateBlock {
    let Some(temporal) = &result.analyses.temporal else {
        return DateBlock::default();
    };
    let mut years = temporal.representative_years.clone();
    years.sort_unstable();

    let mut date_types = Vec::new();
    if !temporal.explicit_years.is_empty() {
        date_types.push("numeric".to_string());
    }
    if !temporal.textual_intervals.is_empty() {
        date_types.push("textual".to_string());
    }

    DateBlock {
        date_range: Some(DateRange {
            start: temporal.minimum,
            end: temporal.maximum,
            span: temporal.maximum - temporal.minimum,
        }),
        total_dates: years.len(),
        years,
        centuries: temporal.centuries.clone(),
        date_types,
    }
}

fn theme_block(result: &DocumentResult) -> ThemeBlock {
    let Some(themes) = &result.analyses.themes else {
        return ThemeBlock::default();
    };
    ThemeBlock {
        primary_theme: Some(themes.top_theme.clone()),
        all_themes: themes.theme_counts.keys().cloned().collect(),
        theme_scores: themes.theme_counts.clone(),
        total_keywords: themes.total_keywords_found,
        theme_percentages: themes.theme_percentages.clone(),
    }
}

/// Bulk-index lines: an action header followed by the document, per result.
pub fn bulk_lines(results: &[DocumentResult], index_name: &str) -> Result<Vec<String>, serde_json::Error> {
    let mut lines = Vec::with_capacity(results.len() * 2);
    for result in results {
        let doc = to_search_document(result);
        let header = json!({"index": {"_index": index_name, "_id": doc.document_id}});
        lines.push(serde_json::to_string(&header)?);
        lines.push(serde_json::to_string(&doc)?);
    }
    Ok(lines)
}

/// Write the NDJSON bulk file. Returns the number of documents exported.
pub fn write_bulk(path: &Path, results: &[DocumentResult], index_name: &str) -> Result<usize, RunError> {
    let output_err = |source: std::io::Error| RunError::Output {
        path: path.to_path_buf(),
        source,
    };
    let lines = bulk_lines(results, index_name)?;
    let mut file = std::io::BufWriter::new(std::fs::File::create(path).map_err(output_err)?);
    for line in &lines {
        writeln!(file, "{line}").map_err(output_err)?;
    }
    file.flush().map_err(output_err)?;

    tracing::info!(
        path = %path.display(),
        index = index_name,
        documents = results.len(),
        "Search export written"
    );
    Ok(results.len())
}

/// Write `index_mapping()` as pretty JSON.
pub fn write_mapping(path: &Path) -> Result<(), RunError> {
    let rendered = serde_json::to_string_pretty(&index_mapping())?;
    std::fs::write(path, rendered).map_err(|source| RunError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Search index mapping written");
    Ok(())
}

/// Index mapping matching `SearchDocument`, with Portuguese text analysis.
pub fn index_mapping() -> serde_json::Value {
    let text = json!({"type": "text", "analyzer": "portuguese"});
    let text_with_keyword = json!({
        "type": "text",
        "analyzer": "portuguese",
        "fields": {"keyword": {"type": "keyword"}}
    });
    json!({
        "mappings": {
            "properties": {
                "document_id": {"type": "keyword"},
                "document_type": {"type": "keyword"},
                "title": text_with_keyword,
                "content": text,
                "full_content": {"type": "text", "analyzer": "portuguese", "index": false},
                "searchable_text": text,
                "names": text_with_keyword,
                "places": {"type": "keyword"},
                "reference_authors": {"type": "keyword"},
                "dates": {
                    "properties": {
                        "years": {"type": "integer"},
                        "date_range": {
                            "properties": {
                                "start": {"type": "integer"},
                                "end": {"type": "integer"},
                                "span": {"type": "integer"}
                            }
                        },
                        "centuries": {"type": "keyword"},
                        "date_types": {"type": "keyword"}
                    }
                },
                "themes": {
                    "properties": {
                        "primary_theme": {"type": "keyword"},
                        "all_themes": {"type": "keyword"},
                        "theme_scores": {"type": "object"},
                        "total_keywords": {"type": "integer"}
                    }
                },
                "metadata": {
                    "properties": {
                        "processed_at": {"type": "date"},
                        "word_count": {"type": "integer"},
                        "character_count": {"type": "integer"}
                    }
                },
                "primary_theme": {"type": "keyword"},
                "all_themes": {"type": "keyword"},
                "centuries": {"type": "keyword"}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Analyses, NameFinding, Reference, ReferenceFinding, SourceKind, TemporalFinding,
        ThemeFinding, YearInterval,
    };

    fn make_result(text: &str) -> DocumentResult {
        DocumentResult {
            document_id: "doc1".into(),
            source_kind: SourceKind::JsonRecord,
            title: "Teste".into(),
            file_path: None,
            text: text.into(),
            word_count: crate::models::word_count(text),
            character_count: text.chars().count(),
            analyses: Analyses::default(),
            diagnostics: vec![],
            original_data: None,
            processed_at: Utc::now(),
        }
    }

    fn temporal(years: Vec<i32>) -> TemporalFinding {
        TemporalFinding {
            minimum: *years.iter().min().unwrap(),
            maximum: *years.iter().max().unwrap(),
            explicit_years: years.clone(),
            representative_years: years,
            textual_intervals: vec![],
            era_mentions: vec![],
            centuries: vec!["século XVII".into()],
            mean: 0.0,
            median: 0.0,
            mean_absolute_deviation: 0.0,
            standard_deviation: 0.0,
            consistency: 1.0,
            dense_range: YearInterval { start: 0, end: 0 },
        }
    }

    #[test]
    fn projects_findings_into_flat_blocks() {
        let mut result = make_result("Carta de João em 1654 sobre o engenho");
        result.analyses.temporal = Some(temporal(vec![1680, 1654]));
        result.analyses.names = Some(NameFinding {
            names: vec!["João".into()],
            count: 1,
        });
        result.analyses.themes = Some(ThemeFinding {
            theme_counts: [("economia".to_string(), 1)].into_iter().collect(),
            matched_keywords: BTreeMap::new(),
            top_theme: "economia".into(),
            total_keywords_found: 1,
            theme_percentages: [("economia".to_string(), 100.0)].into_iter().collect(),
        });

        let doc = to_search_document(&result);
        assert_eq!(doc.document_type, "json_record");
        assert_eq!(doc.dates.years, vec![1654, 1680]);
        assert_eq!(doc.dates.date_range, Some(DateRange { start: 1654, end: 1680, span: 26 }));
        assert_eq!(doc.dates.date_types, vec!["numeric"]);
        assert_eq!(doc.primary_theme.as_deref(), Some("economia"));
        assert_eq!(doc.names, vec!["João"]);
        assert!(doc.metadata.has_dates && doc.metadata.has_names && doc.metadata.has_themes);
        assert!(!doc.metadata.has_places);
        assert!(doc.searchable_text.ends_with("João economia"));
    }

    #[test]
    fn empty_analyses_project_to_empty_blocks() {
        let doc = to_search_document(&make_result("texto simples"));
        assert!(doc.dates.years.is_empty());
        assert!(doc.date_range_years.is_none());
        assert!(doc.primary_theme.is_none());
        assert_eq!(doc.searchable_text, "texto simples");
    }

    #[test]
    fn exports_first_three_reference_authors() {
        let mut result = make_result("Estudo com bibliografia");
        let authors = ["FREYRE, Gilberto", "HOLANDA, Sérgio", "PRADO, Caio", "SILVA, J."];
        result.analyses.references = Some(ReferenceFinding {
            references: vec![Reference {
                raw: "FREYRE, Gilberto. Casa-grande & senzala. 1933.".into(),
                author: "FREYRE, Gilberto".into(),
                year: Some("1933".into()),
                title: Some("Casa-grande & senzala".into()),
                publication: None,
            }],
            total_references: 4,
            authors: authors.iter().map(|a| a.to_string()).collect(),
            years: vec!["1933".into()],
        });

        let doc = to_search_document(&result);
        assert_eq!(doc.reference_authors, authors[..3].to_vec());
        assert!(doc.metadata.has_references);
        assert!(!to_search_document(&make_result("x")).metadata.has_references);
    }

    #[test]
    fn long_content_is_previewed_on_char_boundary() {
        let text = "ç".repeat(600);
        let doc = to_search_document(&make_result(&text));
        assert_eq!(doc.content.chars().count(), 503);
        assert!(doc.content.ends_with("..."));
        assert_eq!(doc.full_content, text);
    }

    #[test]
    fn bulk_lines_pair_header_and_document() {
        let lines = bulk_lines(&[make_result("um"), make_result("dois")], "acervo").unwrap();
        assert_eq!(lines.len(), 4);
        let header: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(header["index"]["_index"], "acervo");
        assert_eq!(header["index"]["_id"], "doc1");
        let doc: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(doc["full_content"], "um");
    }

    #[test]
    fn write_bulk_produces_ndjson_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.ndjson");
        let count = write_bulk(&path, &[make_result("um")], "acervo").unwrap();
        assert_eq!(count, 1);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn mapping_declares_date_years_as_integer() {
        let mapping = index_mapping();
        assert_eq!(
            mapping["mappings"]["properties"]["dates"]["properties"]["years"]["type"],
            "integer"
        );
    }
}
