// Sentence, clause, and word segmentation for English prose.
//
// Chapters arrive as raw Project Gutenberg text. Two segmentations are used:
// - `split_sentences` feeds the Markov trainer (full sentences, newlines
//   folded into spaces).
// - `split_clauses` feeds verse-pool extraction: it also breaks on commas and
//   semicolons, since haiku lines are usually clause-sized.
//
// Both run `clean_abbreviations` first so "Mr. Darcy" is not read as a
// sentence end.

use std::sync::LazyLock;

use regex::Regex;

use crate::wordlists::ABBREVIATIONS;

static ABBREVIATION_DOT: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = ABBREVIATIONS.join("|");
    Regex::new(&format!(r"\b({alternatives})\.")).expect("abbreviation pattern is valid")
});

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("sentence pattern is valid"));

static CLAUSE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.?!,;]+\s+").expect("clause pattern is valid"));

/// Strip the trailing dot from title abbreviations (Mr., Mrs., Dr., St.).
pub fn clean_abbreviations(text: &str) -> String {
    ABBREVIATION_DOT.replace_all(text, "$1").into_owned()
}

/// Split prose into sentences. Newlines become spaces, abbreviation dots
/// are removed, and empty segments are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let flattened = clean_abbreviations(&text.replace(['\r', '\n'], " "));
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_END.find_iter(&flattened) {
        push_trimmed(&mut sentences, &flattened[start..boundary.end()]);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, &flattened[start..]);
    sentences
}

/// Split prose into clause-sized candidates on `[.?!,;]+` followed by
/// whitespace. Punctuation at the split points is consumed.
pub fn split_clauses(text: &str) -> Vec<String> {
    let cleaned = clean_abbreviations(text);
    let mut clauses = Vec::new();
    for piece in CLAUSE_END.split(&cleaned) {
        push_trimmed(&mut clauses, piece);
    }
    clauses
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Extract words: runs of alphanumerics, keeping inner apostrophes
/// ("don't"). Case is preserved.
pub fn tokenize_words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '\u{2019}'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lower-cased `tokenize_words`.
pub fn tokenize_lower(text: &str) -> Vec<String> {
    tokenize_words(text)
        .into_iter()
        .map(|w| w.to_lowercase())
        .collect()
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Dedup key for verse pools: lower-cased, whitespace-normalized text.
pub fn normalize_key(text: &str) -> String {
    normalize_whitespace(text).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_lose_their_dot() {
        assert_eq!(
            clean_abbreviations("Mr. Darcy met Mrs. Bennet and Dr. Watson on St. James"),
            "Mr Darcy met Mrs Bennet and Dr Watson on St James"
        );
        assert_eq!(clean_abbreviations("The end."), "The end.");
    }

    #[test]
    fn sentences_ignore_abbreviation_dots() {
        let s = split_sentences("Mr. Smith walked home.\nIt was late! Was it?  Yes");
        assert_eq!(
            s,
            vec!["Mr Smith walked home.", "It was late!", "Was it?", "Yes"]
        );
    }

    #[test]
    fn sentences_handle_closing_quotes() {
        let s = split_sentences("He said \"stop.\" Then silence.");
        assert_eq!(s, vec!["He said \"stop.\"", "Then silence."]);
    }

    #[test]
    fn clauses_split_on_commas_and_semicolons() {
        let c = split_clauses("The old pond, a frog jumps in; the sound of water. ");
        assert_eq!(c, vec!["The old pond", "a frog jumps in", "the sound of water"]);
    }

    #[test]
    fn clauses_drop_empty_pieces() {
        assert!(split_clauses("   ").is_empty());
        assert_eq!(split_clauses("... , hello"), vec!["hello"]);
        assert_eq!(split_clauses("Night falls. Silence"), vec!["Night falls", "Silence"]);
    }

    #[test]
    fn words_keep_inner_apostrophes() {
        assert_eq!(
            tokenize_words("Don't stop -- the 'cold' night!"),
            vec!["Don't", "stop", "the", "cold", "night"]
        );
        assert_eq!(tokenize_lower("The Cat"), vec!["the", "cat"]);
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_whitespace("  a \t b\n c "), "a b c");
        assert_eq!(normalize_key("The  Old Pond"), "the old pond");
    }
}
