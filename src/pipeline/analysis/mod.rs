//! Content analysis stages.
//!
//! Each stage turns raw document text into at most one finding. Stages are
//! independent: one failing or panicking on a document leaves the others
//! untouched, and a stage whose configuration failed to load is never built.

pub mod error;
pub mod names;
pub mod places;
pub mod references;
pub mod registry;
pub mod temporal;
pub mod temporal_stats;
pub mod themes;

pub use error::StageError;
pub use names::NameStage;
pub use places::PlaceStage;
pub use references::ReferenceStage;
pub use registry::{StageRegistry, UnavailableStage};
pub use temporal::TemporalStage;
pub use themes::ThemeStage;

use crate::models::{
    Analyses, NameFinding, PlaceFinding, ReferenceFinding, StageKind, TemporalFinding, ThemeFinding,
};

/// One analysis stage with its configuration bound at construction.
pub trait AnalysisStage: Send + Sync {
    /// Which stage this is.
    fn kind(&self) -> StageKind;

    /// Analyze one document. `Ok(None)` means nothing was found.
    fn analyze(&self, text: &str) -> Result<Option<Finding>, StageError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    Temporal(TemporalFinding),
    Names(NameFinding),
    Themes(ThemeFinding),
    Places(PlaceFinding),
    References(ReferenceFinding),
}

impl Finding {
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Temporal(_) => StageKind::Temporal,
            Self::Names(_) => StageKind::Names,
            Self::Themes(_) => StageKind::Themes,
            Self::Places(_) => StageKind::Places,
            Self::References(_) => StageKind::References,
        }
    }

    pub fn record_into(self, analyses: &mut Analyses) {
        match self {
            Self::Temporal(f) => analyses.temporal = Some(f),
            Self::Names(f) => analyses.names = Some(f),
            Self::Themes(f) => analyses.themes = Some(f),
            Self::Places(f) => analyses.places = Some(f),
            Self::References(f) => analyses.references = Some(f),
        }
    }
}
