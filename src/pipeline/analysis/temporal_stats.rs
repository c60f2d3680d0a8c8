//! Temporal statistics engine.
//!
//! Resolves raw mentions to representative years and summarizes them.
//! Mentions are never deduplicated: a year cited five times weighs five
//! times in every statistic.

use std::collections::BTreeSet;

use crate::models::{MidpointRounding, TemporalFinding, YearInterval};
use crate::pipeline::catalog::{DateRules, RawMention};

// ═══════════════════════════════════════════════════════════
// Resolution
// ═══════════════════════════════════════════════════════════

/// Resolve a century token plus optional part qualifier to a year interval.
///
/// Returns `None` when the century is not in the map. An unrecognized part
/// falls back to the default century range.
pub fn resolve_interval(century: &str, part: Option<&str>, rules: &DateRules) -> Option<YearInterval> {
    let Some(base) = rules.century_base(century) else {
        tracing::debug!(century, "Unrecognized century, mention dropped");
        return None;
    };

    let (start, end) = match part {
        Some(p) => rules.part_offsets(p).unwrap_or_else(|| {
            tracing::debug!(part = p, "Unrecognized century part, using default range");
            rules.century_default_range
        }),
        None => rules.century_default_range,
    };

    Some(YearInterval {
        start: base + start,
        end: base + end,
    })
}

pub fn representative_year(interval: YearInterval, rounding: MidpointRounding) -> i32 {
    let midpoint = f64::from(interval.start + interval.end) / 2.0;
    let rounded = match rounding {
        MidpointRounding::HalfAwayFromZero => midpoint.round(),
        MidpointRounding::HalfEven => midpoint.round_ties_even(),
        MidpointRounding::Floor => midpoint.floor(),
    };
    rounded as i32
}

/// 1650 → 17. Years before 1 have no century.
pub fn century_of(year: i32) -> Option<i32> {
    (year >= 1).then(|| (year - 1) / 100 + 1)
}

/// 17 → `"século XVII"`.
pub fn century_label(century: i32) -> String {
    format!("século {}", to_roman(century).unwrap_or_else(|| century.to_string()))
}

fn to_roman(mut n: i32) -> Option<String> {
    if !(1..=3999).contains(&n) {
        return None;
    }
    const TABLE: [(i32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    Some(out)
}

// ═══════════════════════════════════════════════════════════
// Statistics
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct YearStatistics {
    pub mean: f64,
    pub median: f64,
    pub minimum: i32,
    pub maximum: i32,
    pub mean_absolute_deviation: f64,
    pub standard_deviation: f64,
    pub consistency: f64,
}

impl YearStatistics {
    /// `None` for an empty set; statistics are never zero-filled.
    pub fn compute(years: &[i32], normalization: f64) -> Option<Self> {
        if years.is_empty() {
            return None;
        }
        let n = years.len() as f64;
        let mean = years.iter().map(|&y| f64::from(y)).sum::<f64>() / n;

        let mut sorted = years.to_vec();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
        } else {
            f64::from(sorted[mid])
        };

        let mad = years.iter().map(|&y| (f64::from(y) - mean).abs()).sum::<f64>() / n;
        let variance = years
            .iter()
            .map(|&y| (f64::from(y) - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            mean,
            median,
            minimum: sorted[0],
            maximum: sorted[sorted.len() - 1],
            mean_absolute_deviation: mad,
            standard_deviation: variance.sqrt(),
            consistency: consistency_score(mad, normalization),
        })
    }
}

/// `clamp(1 - mad / normalization, 0, 1)`.
pub fn consistency_score(mad: f64, normalization: f64) -> f64 {
    (1.0 - mad / normalization).clamp(0.0, 1.0)
}

// ═══════════════════════════════════════════════════════════
// Summary
// ═══════════════════════════════════════════════════════════

/// Resolve `mentions` and summarize them, or `None` when no representative
/// year survives the plausible-range filter.
pub fn summarize(mentions: &[RawMention], rules: &DateRules) -> Option<TemporalFinding> {
    let mut years = Vec::new();
    let mut explicit_years = Vec::new();
    let mut textual_intervals = Vec::new();
    let mut era_mentions = Vec::new();

    for mention in mentions {
        match mention {
            RawMention::Year(year) => {
                if rules.in_range(*year) {
                    years.push(*year);
                    explicit_years.push(*year);
                }
            }
            RawMention::Era { raw, century, part } => {
                era_mentions.push(raw.clone());
                let Some(interval) = resolve_interval(century, part.as_deref(), rules) else {
                    continue;
                };
                let year = representative_year(interval, rules.midpoint_rounding);
                if rules.in_range(year) {
                    years.push(year);
                    textual_intervals.push(interval);
                }
            }
        }
    }

    let stats = YearStatistics::compute(&years, rules.consistency_normalization)?;
    let centuries = years
        .iter()
        .filter_map(|&y| century_of(y))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(century_label)
        .collect();

    Some(TemporalFinding {
        dense_range: YearInterval {
            start: (stats.mean - stats.standard_deviation).round() as i32,
            end: (stats.mean + stats.standard_deviation).round() as i32,
        },
        representative_years: years,
        explicit_years,
        textual_intervals,
        era_mentions,
        centuries,
        mean: stats.mean,
        median: stats.median,
        minimum: stats.minimum,
        maximum: stats.maximum,
        mean_absolute_deviation: stats.mean_absolute_deviation,
        standard_deviation: stats.standard_deviation,
        consistency: stats.consistency,
    })
}
