use std::collections::BTreeMap;

use super::{AnalysisStage, Finding, StageError};
use crate::models::{StageKind, ThemeFinding};
use crate::pipeline::catalog::ThemeKeywords;

/// Keyword-count thematic classification.
pub struct ThemeStage {
    keywords: ThemeKeywords,
}

impl ThemeStage {
    pub fn new(keywords: ThemeKeywords) -> Self {
        Self { keywords }
    }
}

impl AnalysisStage for ThemeStage {
    fn kind(&self) -> StageKind {
        StageKind::Themes
    }

    fn analyze(&self, text: &str) -> Result<Option<Finding>, StageError> {
        let mut theme_counts = BTreeMap::new();
        let mut matched_keywords = BTreeMap::new();
        // Ties go to the theme listed first in themes.json.
        let mut top: Option<(&str, usize)> = None;

        for theme in &self.keywords.themes {
            let mut hits = 0;
            let mut matched = Vec::new();
            for keyword in &theme.keywords {
                let count = keyword.count_in(text);
                if count > 0 {
                    hits += count;
                    matched.push(keyword.term.clone());
                }
            }
            if hits == 0 {
                continue;
            }
            if top.map_or(true, |(_, best)| hits > best) {
                top = Some((theme.name.as_str(), hits));
            }
            theme_counts.insert(theme.name.clone(), hits);
            matched_keywords.insert(theme.name.clone(), matched);
        }

        let Some((top_theme, _)) = top else {
            return Ok(None);
        };
        let total: usize = theme_counts.values().sum();
        let theme_percentages = theme_counts
            .iter()
            .map(|(name, &count)| (name.clone(), count as f64 * 100.0 / total as f64))
            .collect();

        Ok(Some(Finding::Themes(ThemeFinding {
            top_theme: top_theme.to_string(),
            theme_counts,
            matched_keywords,
            total_keywords_found: total,
            theme_percentages,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(json: &str) -> ThemeStage {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("themes.json");
        std::fs::write(&path, json).unwrap();
        ThemeStage::new(ThemeKeywords::load(&path).unwrap())
    }

    fn themes(finding: Option<Finding>) -> ThemeFinding {
        match finding {
            Some(Finding::Themes(t)) => t,
            other => panic!("expected theme finding, got {other:?}"),
        }
    }

    #[test]
    fn counts_hits_per_theme_and_picks_top() {
        let stage = stage(r#"{"economia": ["açúcar", "engenho"], "religião": ["igreja"]}"#);
        let t = themes(
            stage
                .analyze("O engenho produzia açúcar; o açúcar seguia para a igreja.")
                .unwrap(),
        );
        assert_eq!(t.theme_counts["economia"], 3);
        assert_eq!(t.theme_counts["religião"], 1);
        assert_eq!(t.top_theme, "economia");
        assert_eq!(t.total_keywords_found, 4);
        assert_eq!(t.theme_percentages["economia"], 75.0);
        assert_eq!(t.matched_keywords["economia"], vec!["açúcar", "engenho"]);
    }

    #[test]
    fn themes_without_hits_are_omitted() {
        let stage = stage(r#"{"economia": ["açúcar"], "guerra": ["batalha"]}"#);
        let t = themes(stage.analyze("Carregamento de açúcar").unwrap());
        assert!(!t.theme_counts.contains_key("guerra"));
        assert_eq!(t.theme_percentages["economia"], 100.0);
    }

    #[test]
    fn tie_goes_to_first_theme_in_file_order() {
        let stage = stage(r#"{"religião": ["igreja"], "economia": ["açúcar"]}"#);
        let t = themes(stage.analyze("A igreja comprou açúcar.").unwrap());
        assert_eq!(t.top_theme, "religião");
    }

    #[test]
    fn no_keyword_hits_yields_no_finding() {
        let stage = stage(r#"{"guerra": ["batalha"]}"#);
        assert_eq!(stage.analyze("tempo de paz").unwrap(), None);
    }
}
