// English text toolkit for the GutenKu haiku engine.
//
// Everything the engine needs to know about English lives here, with no
// dependency on the GA or the Markov model, so the same rules apply to pool
// extraction, validation, training, and scoring.
//
// Architecture:
// - `text.rs`: abbreviation cleanup, sentence and clause segmentation, word
//   tokenization, whitespace normalization
// - `syllables.rs`: the single syllable counter used project-wide
// - `analysis.rs`: part-of-speech guesses, sentiment, first-sound phonetics,
//   word-class membership
// - `wordlists.rs`: sorted static word tables (nature, sensory, names,
//   sentiment, verbs, adjectives, function words, conjunctions)
// - `types.rs`: `PartOfSpeech`
//
// Determinism constraint: nothing in this crate may depend on hashing order,
// locale, or the clock. Scores computed here feed reproducible GA runs.

pub mod analysis;
pub mod syllables;
pub mod text;
pub mod types;
pub mod wordlists;

// Re-export the functions most callers need at the crate root.
pub use analysis::{guess_pos, phonetic_key, sentiment_score};
pub use syllables::{count_syllables, count_text_syllables};
pub use text::{
    clean_abbreviations, normalize_key, normalize_whitespace, split_clauses, split_sentences,
    tokenize_lower, tokenize_words,
};
pub use types::PartOfSpeech;
