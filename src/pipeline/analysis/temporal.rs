use super::temporal_stats;
use super::{AnalysisStage, Finding, StageError};
use crate::models::StageKind;
use crate::pipeline::catalog::DateRules;

/// Finds year and era mentions and summarizes them statistically.
pub struct TemporalStage {
    rules: DateRules,
}

impl TemporalStage {
    pub fn new(rules: DateRules) -> Self {
        Self { rules }
    }
}

impl AnalysisStage for TemporalStage {
    fn kind(&self) -> StageKind {
        StageKind::Temporal
    }

    fn analyze(&self, text: &str) -> Result<Option<Finding>, StageError> {
        let mentions = self.rules.scan(text);
        tracing::debug!(mentions = mentions.len(), "Date mentions found");
        Ok(temporal_stats::summarize(&mentions, &self.rules).map(Finding::Temporal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::catalog::dates::rules_from_json;
    use serde_json::json;

    fn stage() -> TemporalStage {
        TemporalStage::new(rules_from_json(json!({
            "century_map": {"XVII": 1600},
            "part_map": {"meio": [33, 66]}
        })))
    }

    #[test]
    fn colonial_century_resolves_to_midpoint() {
        let finding = stage().analyze("Brasil colonial século XVII").unwrap();
        let Some(Finding::Temporal(t)) = finding else {
            panic!("expected temporal finding");
        };
        assert_eq!(t.representative_years, vec![1650]);
        assert_eq!(t.consistency, 1.0);
    }

    #[test]
    fn meio_part_applies_offsets() {
        let finding = stage().analyze("Relato escrito no meio do século XVII").unwrap();
        let Some(Finding::Temporal(t)) = finding else {
            panic!("expected temporal finding");
        };
        assert_eq!(t.representative_years, vec![1650]);
        assert_eq!(t.textual_intervals[0].start, 1633);
        assert_eq!(t.textual_intervals[0].end, 1666);
    }

    #[test]
    fn text_without_dates_finds_nothing() {
        assert_eq!(stage().analyze("Sem qualquer referência temporal.").unwrap(), None);
    }
}
