// Lightweight lexical analysis: part-of-speech guesses, sentiment, phonetics,
// and word-class membership tests.
//
// None of this is a real tagger. The heuristics only need to rank candidate
// haiku consistently, so they favour being cheap and deterministic over
// being right about every word.

use crate::types::PartOfSpeech;
use crate::wordlists::{
    COMMON_ADJECTIVES, COMMON_NAMES, COMMON_VERBS, FANBOYS, FUNCTION_WORDS, NATURE_WORDS,
    NEGATIVE_WORDS, POSITIVE_WORDS, SENSORY_WORDS, contains,
};

const ADJECTIVE_SUFFIXES: &[&str] = &["able", "ful", "ible", "ish", "ive", "less", "ous"];

/// Guess the part of speech of a single word.
///
/// Lookup order: common verbs, function words, common adjectives, then
/// suffix rules (`-ly` adverb, `-ing`/`-ed` verb, adjective suffixes), with
/// noun as the fallback for any other alphabetic word.
pub fn guess_pos(word: &str) -> PartOfSpeech {
    let w = word.to_lowercase();
    if !w.chars().any(char::is_alphabetic) {
        return PartOfSpeech::Function;
    }
    if contains(COMMON_VERBS, &w) {
        return PartOfSpeech::Verb;
    }
    if contains(FUNCTION_WORDS, &w) {
        return PartOfSpeech::Function;
    }
    if contains(COMMON_ADJECTIVES, &w) {
        return PartOfSpeech::Adjective;
    }
    let len = w.chars().count();
    if len > 4 && w.ends_with("ly") {
        return PartOfSpeech::Adverb;
    }
    if (len > 4 && w.ends_with("ing")) || (len > 3 && w.ends_with("ed")) {
        return PartOfSpeech::Verb;
    }
    if len > 5 && ADJECTIVE_SUFFIXES.iter().any(|s| w.ends_with(s)) {
        return PartOfSpeech::Adjective;
    }
    PartOfSpeech::Noun
}

/// Normalized valence of a run of words in [0, 1], 0.5 meaning neutral.
///
/// `0.5 + 0.5 * (pos - neg) / (pos + neg)` over words found in the sentiment
/// tables; 0.5 when no word carries sentiment.
pub fn sentiment_score<S: AsRef<str>>(words: &[S]) -> f64 {
    let mut positive = 0u32;
    let mut negative = 0u32;
    for word in words {
        let w = word.as_ref().to_lowercase();
        if contains(POSITIVE_WORDS, &w) {
            positive += 1;
        } else if contains(NEGATIVE_WORDS, &w) {
            negative += 1;
        }
    }
    let matched = positive + negative;
    if matched == 0 {
        return 0.5;
    }
    0.5 + 0.5 * (positive as f64 - negative as f64) / matched as f64
}

/// First sound of a word, approximating the leading metaphone code.
///
/// Silent or merged onsets are folded: `ph`→f, `kn`/`gn`→n, `wr`→r, `ps`→s,
/// soft `c` (before e, i, y)→s, hard `c` and `q`→k. Returns `None` for words
/// with no ASCII letter.
pub fn phonetic_key(word: &str) -> Option<char> {
    let lower = word.to_lowercase();
    let mut letters = lower.chars().filter(char::is_ascii_lowercase);
    let first = letters.next()?;
    let second = letters.next();
    let key = match (first, second) {
        ('p', Some('h')) => 'f',
        ('k', Some('n')) | ('g', Some('n')) => 'n',
        ('w', Some('r')) => 'r',
        ('p', Some('s')) => 's',
        ('c', Some('e' | 'i' | 'y')) => 's',
        ('c', _) | ('q', _) => 'k',
        (c, _) => c,
    };
    Some(key)
}

pub fn is_nature_word(word: &str) -> bool {
    contains(NATURE_WORDS, &word.to_lowercase())
}

pub fn is_sensory_word(word: &str) -> bool {
    contains(SENSORY_WORDS, &word.to_lowercase())
}

pub fn is_common_name(word: &str) -> bool {
    contains(COMMON_NAMES, &word.to_lowercase())
}

/// Coordinating conjunction (for, and, nor, but, or, yet, so).
pub fn is_fanboy(word: &str) -> bool {
    contains(FANBOYS, &word.to_lowercase())
}
