use std::collections::BTreeMap;

use super::{AnalysisStage, Finding, StageError};
use crate::models::{PlaceFinding, StageKind};
use crate::pipeline::catalog::PlaceList;

pub struct PlaceStage {
    places: PlaceList,
}

impl PlaceStage {
    pub fn new(places: PlaceList) -> Self {
        Self { places }
    }
}

impl AnalysisStage for PlaceStage {
    fn kind(&self) -> StageKind {
        StageKind::Places
    }

    fn analyze(&self, text: &str) -> Result<Option<Finding>, StageError> {
        let place_counts: BTreeMap<String, usize> = self
            .places
            .places
            .iter()
            .map(|p| (p.term.clone(), p.count_in(text)))
            .filter(|(_, count)| *count > 0)
            .collect();

        if place_counts.is_empty() {
            return Ok(None);
        }
        Ok(Some(Finding::Places(PlaceFinding {
            total_occurrences: place_counts.values().sum(),
            place_counts,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> PlaceStage {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.txt");
        std::fs::write(&path, "Bahia\nOlinda\nRio de Janeiro\n").unwrap();
        PlaceStage::new(PlaceList::load(&path).unwrap())
    }

    #[test]
    fn counts_each_listed_place() {
        let finding = stage()
            .analyze("De Olinda à Bahia, e da bahia ao Rio de Janeiro.")
            .unwrap();
        let Some(Finding::Places(p)) = finding else {
            panic!("expected place finding");
        };
        assert_eq!(p.place_counts["Bahia"], 2);
        assert_eq!(p.place_counts["Olinda"], 1);
        assert_eq!(p.place_counts["Rio de Janeiro"], 1);
        assert_eq!(p.total_occurrences, 4);
    }

    #[test]
    fn unlisted_places_find_nothing() {
        assert_eq!(stage().analyze("Lisboa e Porto").unwrap(), None);
    }
}
