//! Bibliography extraction.
//!
//! Finds a references section by its heading, splits it into entries at
//! lines that open with an uppercase surname or a numbering mark, and pulls
//! author, year, title and venue out of each entry. Needs no configuration.

use regex::Regex;

use super::{AnalysisStage, Finding, StageError};
use crate::models::{Reference, ReferenceFinding, StageKind};

/// Texts shorter than this are never searched for a bibliography.
const MIN_TEXT_CHARS: usize = 100;
/// A section must hold more than this many characters after trimming.
const MIN_SECTION_CHARS: usize = 100;
/// Entries shorter than this are discarded unparsed.
const MIN_ENTRY_CHARS: usize = 20;
const MIN_YEAR: u32 = 1500;
const MAX_YEAR: u32 = 2030;

pub struct ReferenceStage {
    heading: Regex,
    section_end: Regex,
    entry_start: Regex,
    numbering: Regex,
    authors: [Regex; 2],
    years: [Regex; 3],
    title_lead: Regex,
    titles: [Regex; 4],
    title_fallback: Regex,
    in_venue: Regex,
    venue: Regex,
    volume: Regex,
}

impl ReferenceStage {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            heading: Regex::new(
                r"(?i)(?:^|\n)[ \t]*(?:REFER[ÊE]NCIAS(?:[ \t]+BIBLIOGR[ÁA]FICAS?)?|BIBLIOGRAFIA|REFERENCES|WORKS[ \t]+CITED)[ \t]*:?[ \t]*\n",
            )?,
            // A blank line then an all-caps heading line, or an appendix.
            section_end: Regex::new(
                r"\n[ \t]*\n[ \t]*\p{Lu}[\p{Lu}\d \t.\-]{3,}(?:\n|\z)|\n[ \t]*(?:AP[ÊE]NDICE|APPENDIX|ANEXO)\b",
            )?,
            entry_start: Regex::new(r"^(?:\p{Lu}{2,}|\[\d+\]|\d+\.)")?,
            numbering: Regex::new(r"^(?:\[\d+\]|\d+\.)\s*")?,
            authors: [
                Regex::new(r"^\p{Lu}[\p{Lu}\s'\-]*\p{Lu},\s*(?:(?:\p{Lu}\.\s*)+|[^.,;(]+)")?,
                Regex::new(r"^\p{Lu}{2,}(?:\s+\p{Lu}{2,})*")?,
            ],
            years: [
                Regex::new(r"\((\d{4}[a-z]?)\)")?,
                Regex::new(r"\b(\d{4})\.")?,
                Regex::new(r",\s*(\d{4})\b")?,
            ],
            title_lead: Regex::new(r"^[\s.,;:]*(?:\(?\d{4}[a-z]?\)?[.,]?\s*)?")?,
            titles: [
                Regex::new(r#"["“']([^"”']{10,})["”']"#)?,
                Regex::new(r"<i>([^<]+)</i>")?,
                Regex::new(r"<b>([^<]+)</b>")?,
                Regex::new(r"^([^.]{10,}?)\.")?,
            ],
            title_fallback: Regex::new(r"[.,]")?,
            in_venue: Regex::new(r"(?i)\bIn:\s*([^,.]{5,})")?,
            venue: Regex::new(r"(?i)\b(?:Revista|Journal|Anais|Conference|Proceedings)\s+[^,.]+")?,
            volume: Regex::new(r"(?i)\b(?:v\.|vol\.)\s*\d+")?,
        })
    }

    /// The last headed section long enough to be a bibliography.
    fn find_section<'t>(&self, text: &'t str) -> Option<&'t str> {
        let starts: Vec<usize> = self.heading.find_iter(text).map(|m| m.end()).collect();
        starts.into_iter().rev().find_map(|start| {
            let rest = &text[start..];
            let end = self.section_end.find(rest).map_or(rest.len(), |m| m.start());
            let section = rest[..end].trim();
            (section.chars().count() > MIN_SECTION_CHARS).then_some(section)
        })
    }

    fn split_entries(&self, section: &str) -> Vec<String> {
        let mut entries = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if self.entry_start.is_match(line) {
                if !current.is_empty() {
                    entries.push(current.join(" "));
                }
                current = vec![line];
            } else if !current.is_empty() {
                current.push(line);
            }
        }
        if !current.is_empty() {
            entries.push(current.join(" "));
        }
        entries
    }

    fn parse_entry(&self, raw: &str) -> Option<Reference> {
        if raw.chars().count() < MIN_ENTRY_CHARS {
            return None;
        }
        let body = self.numbering.replace(raw, "");
        let body: &str = &body;

        let author = self.authors.iter().find_map(|re| re.find(body))?;
        let year = self.year(body);
        let title = self.title(&body[author.end()..]);
        if year.is_none() && title.is_none() {
            return None;
        }

        Some(Reference {
            raw: raw.to_string(),
            author: author.as_str().trim().to_string(),
            year,
            title,
            publication: self.publication(body),
        })
    }

    /// First match of each pattern in turn, kept when plausible.
    fn year(&self, entry: &str) -> Option<String> {
        self.years.iter().find_map(|re| {
            let found = re.captures(entry)?.get(1)?.as_str();
            let value: u32 = found.get(..4)?.parse().ok()?;
            (MIN_YEAR..=MAX_YEAR)
                .contains(&value)
                .then(|| found.to_string())
        })
    }

    fn title(&self, after_author: &str) -> Option<String> {
        let rest = self.title_lead.replace(after_author, "");
        let rest: &str = &rest;
        let plausible = |t: &str| {
            let len = t.chars().count();
            (len > 10 && len < 500).then(|| t.to_string())
        };

        self.titles
            .iter()
            .find_map(|re| plausible(re.captures(rest)?.get(1)?.as_str().trim()))
            .or_else(|| {
                self.title_fallback
                    .split(rest)
                    .next()
                    .and_then(|first| plausible(first.trim()))
            })
    }

    fn publication(&self, entry: &str) -> Option<String> {
        self.in_venue
            .captures(entry)
            .and_then(|c| c.get(1))
            .or_else(|| self.venue.find(entry))
            .or_else(|| self.volume.find(entry))
            .map(|m| m.as_str().trim().to_string())
    }
}

impl AnalysisStage for ReferenceStage {
    fn kind(&self) -> StageKind {
        StageKind::References
    }

    fn analyze(&self, text: &str) -> Result<Option<Finding>, StageError> {
        if text.chars().count() < MIN_TEXT_CHARS {
            return Ok(None);
        }
        let Some(section) = self.find_section(text) else {
            return Ok(None);
        };
        let references: Vec<Reference> = self
            .split_entries(section)
            .iter()
            .filter_map(|entry| self.parse_entry(entry))
            .collect();
        if references.is_empty() {
            return Ok(None);
        }

        let mut authors: Vec<String> = Vec::new();
        for r in &references {
            if !authors.contains(&r.author) {
                authors.push(r.author.clone());
            }
        }
        let mut years: Vec<String> = references.iter().filter_map(|r| r.year.clone()).collect();
        years.sort();
        years.dedup();

        Ok(Some(Finding::References(ReferenceFinding {
            total_references: references.len(),
            references,
            authors,
            years,
        })))
    }
}
