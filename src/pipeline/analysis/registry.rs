//! StageRegistry: decides stage availability once and runs stages in isolation.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use super::{
    AnalysisStage, Finding, NameStage, PlaceStage, ReferenceStage, StageError, TemporalStage,
    ThemeStage,
};
use crate::models::{Analyses, StageDiagnostic, StageKind};
use crate::pipeline::catalog::{Catalog, CatalogError};

/// A stage disabled for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableStage {
    pub stage: StageKind,
    pub reason: String,
}

pub struct StageRegistry {
    stages: Vec<Box<dyn AnalysisStage>>,
    unavailable: Vec<UnavailableStage>,
}

impl StageRegistry {
    pub fn new(stages: Vec<Box<dyn AnalysisStage>>, unavailable: Vec<UnavailableStage>) -> Self {
        for entry in &unavailable {
            tracing::warn!(
                stage = entry.stage.as_str(),
                reason = %entry.reason,
                "Analysis stage unavailable for this run"
            );
        }
        Self {
            stages,
            unavailable,
        }
    }

    /// Build every stage whose configuration loaded, plus the references
    /// stage, which needs none.
    pub fn from_catalog(catalog: Catalog) -> Self {
        let mut stages: Vec<Box<dyn AnalysisStage>> = Vec::new();
        let mut unavailable = Vec::new();

        let mut admit = |kind: StageKind, built: Result<Box<dyn AnalysisStage>, CatalogError>| {
            match built {
                Ok(stage) => stages.push(stage),
                Err(e) => unavailable.push(UnavailableStage {
                    stage: kind,
                    reason: e.to_string(),
                }),
            }
        };

        admit(
            StageKind::Temporal,
            catalog
                .date_rules
                .map(|r| Box::new(TemporalStage::new(r)) as Box<dyn AnalysisStage>),
        );
        admit(
            StageKind::Names,
            catalog
                .names
                .map(|l| Box::new(NameStage::new(l)) as Box<dyn AnalysisStage>),
        );
        admit(
            StageKind::Themes,
            catalog
                .themes
                .map(|k| Box::new(ThemeStage::new(k)) as Box<dyn AnalysisStage>),
        );
        admit(
            StageKind::Places,
            catalog
                .places
                .map(|p| Box::new(PlaceStage::new(p)) as Box<dyn AnalysisStage>),
        );

        match ReferenceStage::new() {
            Ok(stage) => stages.push(Box::new(stage)),
            Err(e) => unavailable.push(UnavailableStage {
                stage: StageKind::References,
                reason: e.to_string(),
            }),
        }

        Self::new(stages, unavailable)
    }

    pub fn available(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    pub fn unavailable(&self) -> &[UnavailableStage] {
        &self.unavailable
    }

    /// Run every available stage on `text`. Failures and panics become
    /// diagnostics on the document; they never propagate.
    pub fn analyze(&self, document_id: &str, text: &str) -> (Analyses, Vec<StageDiagnostic>) {
        let mut analyses = Analyses::default();
        let mut diagnostics = Vec::new();

        for stage in &self.stages {
            let kind = stage.kind();
            let outcome = run_isolated(stage.as_ref(), text).and_then(|finding| match finding {
                Some(f) if f.kind() != kind => Err(StageError::Failed(format!(
                    "stage produced a {} finding",
                    f.kind()
                ))),
                other => Ok(other),
            });
            match outcome {
                Ok(Some(finding)) => finding.record_into(&mut analyses),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        document_id,
                        stage = kind.as_str(),
                        error = %e,
                        "Analysis stage failed on document"
                    );
                    diagnostics.push(StageDiagnostic {
                        stage: kind,
                        message: e.to_string(),
                    });
                }
            }
        }

        (analyses, diagnostics)
    }
}

fn run_isolated(stage: &dyn AnalysisStage, text: &str) -> Result<Option<Finding>, StageError> {
    catch_unwind(AssertUnwindSafe(|| stage.analyze(text)))
        .unwrap_or_else(|payload| Err(StageError::Panicked(panic_message(payload.as_ref()))))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NameFinding;
    use crate::pipeline::catalog::dates::rules_from_json;
    use serde_json::json;

    struct FailingStage;

    impl AnalysisStage for FailingStage {
        fn kind(&self) -> StageKind {
            StageKind::Themes
        }
        fn analyze(&self, _text: &str) -> Result<Option<Finding>, StageError> {
            Err(StageError::Failed("keyword index corrupted".into()))
        }
    }

    struct PanickingStage;

    impl AnalysisStage for PanickingStage {
        fn kind(&self) -> StageKind {
            StageKind::Places
        }
        fn analyze(&self, _text: &str) -> Result<Option<Finding>, StageError> {
            panic!("place index out of bounds")
        }
    }

    struct FixedNames;

    impl AnalysisStage for FixedNames {
        fn kind(&self) -> StageKind {
            StageKind::Names
        }
        fn analyze(&self, _text: &str) -> Result<Option<Finding>, StageError> {
            Ok(Some(Finding::Names(NameFinding {
                names: vec!["João".into()],
                count: 1,
            })))
        }
    }

    /// Claims to be the theme stage but returns names.
    struct MislabeledStage;

    impl AnalysisStage for MislabeledStage {
        fn kind(&self) -> StageKind {
            StageKind::Themes
        }
        fn analyze(&self, text: &str) -> Result<Option<Finding>, StageError> {
            FixedNames.analyze(text)
        }
    }

    fn temporal_stage() -> Box<dyn AnalysisStage> {
        Box::new(TemporalStage::new(rules_from_json(json!({
            "century_map": {"XVII": 1600},
            "part_map": {}
        }))))
    }

    #[test]
    fn failing_stage_does_not_affect_others() {
        let registry = StageRegistry::new(vec![Box::new(FailingStage), temporal_stage()], vec![]);
        let (analyses, diagnostics) = registry.analyze("doc1", "Em 1650 a vila cresceu.");

        assert!(analyses.themes.is_none());
        assert_eq!(analyses.temporal.unwrap().representative_years, vec![1650]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].stage, StageKind::Themes);
        assert!(diagnostics[0].message.contains("keyword index corrupted"));
    }

    #[test]
    fn panicking_stage_is_contained() {
        let registry =
            StageRegistry::new(vec![Box::new(PanickingStage), Box::new(FixedNames)], vec![]);
        let (analyses, diagnostics) = registry.analyze("doc1", "texto");

        assert!(analyses.places.is_none());
        assert!(analyses.names.is_some());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].stage, StageKind::Places);
        assert!(diagnostics[0].message.contains("place index out of bounds"));
    }

    #[test]
    fn finding_of_another_kind_is_a_stage_failure() {
        let registry = StageRegistry::new(vec![Box::new(MislabeledStage)], vec![]);
        let (analyses, diagnostics) = registry.analyze("doc1", "texto");

        assert!(analyses.names.is_none());
        assert!(analyses.themes.is_none());
        assert_eq!(diagnostics[0].stage, StageKind::Themes);
        assert!(diagnostics[0].message.contains("names finding"));
    }

    #[test]
    fn unavailable_stages_come_from_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("date_config.json"),
            r#"{"century_map": {"XVII": 1600}, "part_map": {"meio": [33, 66]}}"#,
        )
        .unwrap();

        let registry = StageRegistry::from_catalog(Catalog::load(dir.path()));
        assert_eq!(
            registry.available(),
            vec![StageKind::Temporal, StageKind::References]
        );
        let missing: Vec<_> = registry.unavailable().iter().map(|u| u.stage).collect();
        assert_eq!(
            missing,
            vec![StageKind::Names, StageKind::Themes, StageKind::Places]
        );
    }

    #[test]
    fn no_stages_yields_empty_analyses() {
        let registry = StageRegistry::new(vec![], vec![]);
        let (analyses, diagnostics) = registry.analyze("doc1", "Em 1650");
        assert!(analyses.is_empty());
        assert!(diagnostics.is_empty());
    }
}
