use std::collections::HashSet;

use super::{AnalysisStage, Finding, StageError};
use crate::models::{NameFinding, StageKind};
use crate::pipeline::catalog::lexicon::capitalize;
use crate::pipeline::catalog::NameLexicon;

const STRIP_CHARS: &[char] = &[
    '.', ',', ';', '!', '?', '(', ')', '[', ']', '{', '}', '"', ':', '\'',
];

/// Dictionary-driven personal name extraction.
///
/// A name starts at a known first name and continues through first names,
/// surnames, or a single preposition followed by a surname. A preposition
/// not followed by a surname discards the pending name.
pub struct NameStage {
    lexicon: NameLexicon,
}

impl NameStage {
    pub fn new(lexicon: NameLexicon) -> Self {
        Self { lexicon }
    }

    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for token in text.split_whitespace() {
            let cleaned = token.trim_matches(STRIP_CHARS);
            if cleaned.is_empty() {
                self.flush(&mut current, &mut found);
                continue;
            }

            let capitalized = capitalize(cleaned);
            let lower = cleaned.to_lowercase();
            let is_first = self.lexicon.first_names.contains(&capitalized);
            let is_second = self.lexicon.second_names.contains(&capitalized);
            let is_prep = self.lexicon.prepositions.contains(&lower);

            if current.is_empty() {
                if is_first {
                    current.push(capitalized);
                }
                continue;
            }

            let after_prep = current
                .last()
                .is_some_and(|last| self.lexicon.prepositions.contains(last));

            if after_prep {
                if is_second {
                    current.push(capitalized);
                    continue;
                }
            } else if is_first || is_second {
                current.push(capitalized);
                continue;
            } else if is_prep {
                current.push(lower);
                continue;
            }

            self.flush(&mut current, &mut found);
            if is_first {
                current.push(capitalized);
            }
        }
        self.flush(&mut current, &mut found);

        let mut seen = HashSet::new();
        found.retain(|name| seen.insert(name.clone()));
        found
    }

    /// Emit the pending name. A name left dangling on a preposition is
    /// discarded whole.
    fn flush(&self, current: &mut Vec<String>, found: &mut Vec<String>) {
        let dangling = current
            .last()
            .is_some_and(|last| self.lexicon.prepositions.contains(last));
        if !current.is_empty() && !dangling {
            found.push(current.join(" "));
        }
        current.clear();
    }
}

impl AnalysisStage for NameStage {
    fn kind(&self) -> StageKind {
        StageKind::Names
    }

    fn analyze(&self, text: &str) -> Result<Option<Finding>, StageError> {
        let names = self.extract(text);
        if names.is_empty() {
            return Ok(None);
        }
        Ok(Some(Finding::Names(NameFinding {
            count: names.len(),
            names,
        })))
    }
}
