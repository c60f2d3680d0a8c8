//! Date-parsing rules: century and part-of-century maps, the mention
//! patterns, and the tuning knobs of the temporal statistics.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use super::error::CatalogError;
use crate::models::MidpointRounding;

pub const DEFAULT_YEAR_PATTERN: &str = r"\b(?P<year>1[0-9]{3}|20[0-9]{2})\b";

pub const DEFAULT_TEXTUAL_PATTERN: &str = r"(?:(?P<part>in[íi]cio|come[çc]o|princ[íi]pio|primeira\s+metade|segunda\s+metade|meados|meio|fin(?:al|ais)|fim)\s+d[oe]\s+)?s[ée]culo\s+(?P<century>[IVXLC]+|\d{1,2})\b";

pub const DEFAULT_YEAR_RANGE: [i32; 2] = [1200, 2025];
pub const DEFAULT_CENTURY_RANGE: [i32; 2] = [0, 100];
pub const DEFAULT_CONSISTENCY_NORMALIZATION: f64 = 50.0;
/// Largest accepted magnitude for a `century_map` base year.
pub const MAX_CENTURY_BASE: i32 = 10_000;

const YEAR_ALTERNATIVE: &str = "yearmention";
const ERA_ALTERNATIVE: &str = "eramention";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegexPatterns {
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub textual_phrase: Option<String>,
}

/// On-disk shape of `date_config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct DateConfig {
    pub century_map: HashMap<String, i32>,
    pub part_map: HashMap<String, [i32; 2]>,
    #[serde(default)]
    pub regex_patterns: RegexPatterns,
    #[serde(default)]
    pub year_range: Option<[i32; 2]>,
    #[serde(default)]
    pub century_default_range: Option<[i32; 2]>,
    #[serde(default)]
    pub consistency_normalization: Option<f64>,
    #[serde(default)]
    pub midpoint_rounding: MidpointRounding,
}

/// Compiled date rules, immutable for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct DateRules {
    century_map: HashMap<String, i32>,
    part_map: HashMap<String, (i32, i32)>,
    mention_pattern: Regex,
    pub year_range: (i32, i32),
    pub century_default_range: (i32, i32),
    pub consistency_normalization: f64,
    pub midpoint_rounding: MidpointRounding,
}

/// A raw date mention captured from text, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMention {
    Year(i32),
    Era {
        raw: String,
        century: String,
        part: Option<String>,
    },
}

impl DateRules {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let config: DateConfig = super::read_json(path)?;
        Self::compile(config, path)
    }

    pub fn compile(config: DateConfig, path: &Path) -> Result<Self, CatalogError> {
        let invalid = |reason: String| CatalogError::Invalid {
            path: path.to_path_buf(),
            reason,
        };

        let year_src = config
            .regex_patterns
            .year
            .unwrap_or_else(|| DEFAULT_YEAR_PATTERN.to_string());
        let textual_src = config
            .regex_patterns
            .textual_phrase
            .unwrap_or_else(|| DEFAULT_TEXTUAL_PATTERN.to_string());

        let year_re = compile_pattern("year", &year_src)?;
        if !has_group(&year_re, "year") {
            return Err(invalid("year pattern has no `year` group".into()));
        }
        let textual_re = compile_pattern("textual_phrase", &textual_src)?;
        if !has_group(&textual_re, "century") {
            return Err(invalid("textual_phrase pattern has no `century` group".into()));
        }

        let combined = format!(
            "(?P<{YEAR_ALTERNATIVE}>(?:{year_src}))|(?P<{ERA_ALTERNATIVE}>(?:{textual_src}))"
        );
        let mention_pattern = compile_pattern("combined", &combined)?;

        let [min_year, max_year] = config.year_range.unwrap_or(DEFAULT_YEAR_RANGE);
        if min_year > max_year {
            return Err(invalid(format!(
                "year_range [{min_year}, {max_year}] is reversed"
            )));
        }

        let normalization = config
            .consistency_normalization
            .unwrap_or(DEFAULT_CONSISTENCY_NORMALIZATION);
        if !normalization.is_finite() || normalization <= 0.0 {
            return Err(invalid(format!(
                "consistency_normalization must be positive, got {normalization}"
            )));
        }

        if let Some((name, base)) = config
            .century_map
            .iter()
            .find(|(_, base)| !(-MAX_CENTURY_BASE..=MAX_CENTURY_BASE).contains(*base))
        {
            return Err(invalid(format!(
                "century_map base for {name} is {base}, outside ±{MAX_CENTURY_BASE}"
            )));
        }

        let century_map = config
            .century_map
            .into_iter()
            .map(|(k, v)| (normalize_century(&k), v))
            .collect();
        let part_map = config
            .part_map
            .into_iter()
            .map(|(k, [a, b])| (normalize_part(&k), clamp_offsets(a, b)))
            .collect();
        let [default_start, default_end] =
            config.century_default_range.unwrap_or(DEFAULT_CENTURY_RANGE);

        Ok(Self {
            century_map,
            part_map,
            mention_pattern,
            year_range: (min_year, max_year),
            century_default_range: clamp_offsets(default_start, default_end),
            consistency_normalization: normalization,
            midpoint_rounding: config.midpoint_rounding,
        })
    }

    /// Scan `text` for year and era mentions, in text order.
    pub fn scan(&self, text: &str) -> Vec<RawMention> {
        let mut mentions = Vec::new();
        for caps in self.mention_pattern.captures_iter(text) {
            if caps.name(YEAR_ALTERNATIVE).is_some() {
                match caps.name("year").map(|m| m.as_str().parse::<i32>()) {
                    Some(Ok(year)) => mentions.push(RawMention::Year(year)),
                    _ => tracing::debug!(
                        matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default(),
                        "Year match without a numeric year group"
                    ),
                }
            } else if let Some(era) = caps.name(ERA_ALTERNATIVE) {
                if let Some(century) = caps.name("century") {
                    mentions.push(RawMention::Era {
                        raw: era.as_str().trim().to_string(),
                        century: century.as_str().to_string(),
                        part: caps.name("part").map(|p| p.as_str().to_string()),
                    });
                }
            }
        }
        mentions
    }

    pub fn century_base(&self, century: &str) -> Option<i32> {
        self.century_map.get(&normalize_century(century)).copied()
    }

    /// Clamped, ordered offset percentages for a part-of-century phrase.
    pub fn part_offsets(&self, part: &str) -> Option<(i32, i32)> {
        self.part_map.get(&normalize_part(part)).copied()
    }

    pub fn in_range(&self, year: i32) -> bool {
        year >= self.year_range.0 && year <= self.year_range.1
    }
}

fn compile_pattern(name: &'static str, source: &str) -> Result<Regex, CatalogError> {
    Regex::new(&format!("(?ix){source}")).map_err(|e| CatalogError::Pattern { name, source: e })
}

fn has_group(re: &Regex, group: &str) -> bool {
    re.capture_names().flatten().any(|n| n == group)
}

fn clamp_offsets(start: i32, end: i32) -> (i32, i32) {
    let start = start.clamp(0, 100);
    let end = end.clamp(0, 100);
    if start > end {
        (end, start)
    } else {
        (start, end)
    }
}

/// `"Século XVII "` → `"xvii"`.
pub fn normalize_century(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let stripped = lower
        .strip_prefix("século")
        .or_else(|| lower.strip_prefix("seculo"))
        .unwrap_or(&lower);
    stripped.trim().to_string()
}

/// `"Finais"` → `"final"`, `"Início"` → `"inicio"`, `"Começo"` → `"comeco"`.
pub fn normalize_part(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace('í', "i")
        .replace('ç', "c")
        .replace("finais", "final")
}

#[cfg(test)]
pub(crate) fn rules_from_json(value: serde_json::Value) -> DateRules {
    let config: DateConfig = serde_json::from_value(value).unwrap();
    DateRules::compile(config, Path::new("date_config.json")).unwrap()
}
