// Shared word-class types.
//
// `PartOfSpeech` is the coarse tag produced by `analysis::guess_pos` and
// consumed by the grammar and verb-presence metrics in `gutenku_engine`.

use serde::{Deserialize, Serialize};

/// Coarse part of speech assigned by the lexicon and suffix heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    /// Determiners, pronouns, prepositions, conjunctions.
    Function,
}

impl PartOfSpeech {
    /// Content words carry imagery; function words do not.
    pub fn is_content(self) -> bool {
        !matches!(self, PartOfSpeech::Function)
    }
}
