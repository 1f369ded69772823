// Verse value object and the five/seven-syllable candidate pools.
//
// A `Verse` is a real clause lifted from a chapter, validated once and then
// immutable. Validation rejects text that would read badly as a haiku line
// (quotes, digits, dialogue tags, truncated names, over-long clauses) and
// then checks the syllable count against the expected 5 or 7 using
// `gutenku_lang::count_text_syllables`, the same counter `Chromosome`
// re-checks with.
//
// `VersePools::from_chapters` is the extraction step: each chapter is split
// into clauses, every clause that validates as 5 or 7 syllables lands in its
// pool with its corpus-wide clause index (used by the verse-distance
// metric), and duplicates are dropped by normalized text.
//
// See also: `chromosome.rs` (genes index into these pools), `fitness.rs`.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use gutenku_lang::{count_text_syllables, normalize_key, normalize_whitespace, split_clauses};

use crate::corpus::Chapter;
use crate::error::{EngineError, Result, ValidationError};

/// Verses this long (in characters) or longer are rejected.
pub const VERSE_MAX_LENGTH: usize = 30;

static BLACKLISTED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[0-9@#\[\]|(){}"“”'‘’/:,_—+=*$%\r\n;~&]|--|\b(?:Mr|Mrs|Dr)\b"#)
        .expect("blacklist pattern is valid")
});
static UPPERCASE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z\s!:.?]+$").expect("uppercase pattern is valid"));
static INVALID_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:said|cried|inquired)\b").expect("start pattern is valid")
});
static INVALID_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:or|and|of)$").expect("end pattern is valid"));
static LOST_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]\b$").expect("lost letter pattern is valid"));
static CONJUNCTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:and|but|or|of)\b").expect("conjunction pattern is valid")
});

/// Where a verse came from in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Index of the chapter in the corpus slice.
    pub chapter: usize,
    /// Corpus-wide position of the clause, counting every extracted clause.
    pub quote_index: usize,
}

/// A validated haiku line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    text: String,
    cleaned: String,
    syllables: u32,
    provenance: Option<Provenance>,
}

impl Verse {
    /// Validate `text` as a verse of exactly `expected_syllables`.
    ///
    /// `is_first` additionally rejects a leading conjunction, which reads
    /// badly as the opening line of a haiku.
    pub fn new(
        text: &str,
        expected_syllables: u32,
        is_first: bool,
    ) -> std::result::Result<Self, ValidationError> {
        let text = normalize_whitespace(text);
        check_content(&text, is_first)?;

        let syllables = count_text_syllables(&text);
        if syllables != expected_syllables {
            return Err(ValidationError::InvalidSyllableCount {
                expected: vec![expected_syllables],
                actual: vec![syllables],
            });
        }

        let cleaned = clean_text(&text);
        Ok(Verse {
            text,
            cleaned,
            syllables,
            provenance: None,
        })
    }

    /// Attach corpus provenance.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Normalized source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Display form: trailing punctuation stripped, first letter capitalized.
    pub fn cleaned_text(&self) -> &str {
        &self.cleaned
    }

    pub fn syllables(&self) -> u32 {
        self.syllables
    }

    pub fn provenance(&self) -> Option<Provenance> {
        self.provenance
    }

    /// Dedup key: lower-cased display text, so trailing punctuation does
    /// not make two copies of a clause distinct.
    pub fn key(&self) -> String {
        normalize_key(&self.cleaned)
    }
}

fn invalid(text: &str, reason: &'static str) -> ValidationError {
    ValidationError::InvalidVerse {
        text: text.to_string(),
        reason,
    }
}

fn check_content(text: &str, is_first: bool) -> std::result::Result<(), ValidationError> {
    if text.is_empty() {
        return Err(invalid(text, "empty"));
    }
    if BLACKLISTED_CHARS.is_match(text) {
        return Err(invalid(text, "blacklisted characters"));
    }
    if UPPERCASE_TEXT.is_match(text) {
        return Err(invalid(text, "all uppercase"));
    }
    if INVALID_START.is_match(text) {
        return Err(invalid(text, "invalid start word"));
    }
    if INVALID_END.is_match(text) {
        return Err(invalid(text, "invalid end word"));
    }
    if LOST_LETTER.is_match(text) {
        return Err(invalid(text, "lost letter"));
    }
    if text.chars().count() >= VERSE_MAX_LENGTH {
        return Err(invalid(text, "too long"));
    }
    if is_first && CONJUNCTION_START.is_match(text) {
        return Err(invalid(text, "conjunction start"));
    }
    Ok(())
}

fn clean_text(text: &str) -> String {
    let trimmed = text
        .trim_start_matches('\'')
        .trim_end_matches(['.', ',', '!', ';', '?', '\'']);
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether text would be rejected by verse validation regardless of its
/// syllable count. Used by the blacklisted-verses fitness metric.
pub fn has_blacklisted_content(text: &str) -> bool {
    BLACKLISTED_CHARS.is_match(text)
        || INVALID_START.is_match(text)
        || INVALID_END.is_match(text)
        || LOST_LETTER.is_match(text)
}

/// Candidate verses grouped by syllable count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersePools {
    pub five: Vec<Verse>,
    pub seven: Vec<Verse>,
    /// Number of clauses seen during extraction, valid or not.
    pub total_quotes: usize,
}

impl VersePools {
    /// Extract five- and seven-syllable verses from every chapter.
    pub fn from_chapters(chapters: &[Chapter]) -> Self {
        let mut pools = VersePools::default();
        let mut seen = FxHashSet::default();
        let mut quote_index = 0;

        for (chapter_idx, chapter) in chapters.iter().enumerate() {
            for clause in split_clauses(&chapter.content) {
                let provenance = Provenance {
                    chapter: chapter_idx,
                    quote_index,
                };
                quote_index += 1;

                let verse = match count_text_syllables(&clause) {
                    5 => Verse::new(&clause, 5, true),
                    7 => Verse::new(&clause, 7, false),
                    _ => continue,
                };
                let Ok(verse) = verse else { continue };
                if !seen.insert(verse.key()) {
                    continue;
                }
                let verse = verse.with_provenance(provenance);
                if verse.syllables() == 5 {
                    pools.five.push(verse);
                } else {
                    pools.seven.push(verse);
                }
            }
        }
        pools.total_quotes = quote_index;

        debug!(
            chapters = chapters.len(),
            clauses = quote_index,
            five = pools.five.len(),
            seven = pools.seven.len(),
            "extracted verse pools"
        );
        pools
    }

    /// Build pools from literal lines, validating each. Texts that fail
    /// validation are reported, not skipped.
    pub fn from_texts(five: &[&str], seven: &[&str]) -> Result<Self> {
        let mut pools = VersePools::default();
        for (i, text) in five.iter().enumerate() {
            let verse = Verse::new(text, 5, true)?;
            pools.five.push(verse.with_provenance(Provenance {
                chapter: 0,
                quote_index: i,
            }));
        }
        for (i, text) in seven.iter().enumerate() {
            let verse = Verse::new(text, 7, false)?;
            pools.seven.push(verse.with_provenance(Provenance {
                chapter: 0,
                quote_index: five.len() + i,
            }));
        }
        pools.total_quotes = five.len() + seven.len();
        Ok(pools)
    }

    /// Fail fast unless the pools can form at least one haiku with two
    /// distinct five-syllable verses.
    pub fn ensure_viable(&self) -> Result<()> {
        if self.five.len() < 2 || self.seven.is_empty() {
            return Err(EngineError::InsufficientCorpus {
                five: self.five.len(),
                seven: self.seven.len(),
            });
        }
        Ok(())
    }

    /// Number of distinct chromosomes the pools can express
    /// (ordered five pairs times sevens), saturating.
    pub fn combinations(&self) -> usize {
        let five = self.five.len();
        five.saturating_mul(five.saturating_sub(1))
            .saturating_mul(self.seven.len())
    }

    /// Stable fingerprint of the pool contents, used to derive a seed when
    /// the caller does not supply one.
    pub fn fingerprint(&self) -> u32 {
        let mut label = String::new();
        for verse in self.five.iter().chain(&self.seven) {
            label.push_str(verse.text());
            label.push('\n');
        }
        gutenku_prng::seed_from_label(&label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_verse_is_cleaned() {
        let v = Verse::new("the old silent pond.", 5, true).unwrap();
        assert_eq!(v.text(), "the old silent pond.");
        assert_eq!(v.cleaned_text(), "The old silent pond");
        assert_eq!(v.syllables(), 5);
        assert!(v.provenance().is_none());
    }

    #[test]
    fn whitespace_is_normalized() {
        let v = Verse::new("  An old\nsilent   pond ", 5, false).unwrap();
        assert_eq!(v.text(), "An old silent pond");
        assert_eq!(v.key(), "an old silent pond");
    }

    #[test]
    fn wrong_syllable_count_is_rejected_not_coerced() {
        let err = Verse::new("An old silent pond", 7, false).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidSyllableCount {
                expected: vec![7],
                actual: vec![5],
            }
        );
    }

    fn reason(text: &str, is_first: bool) -> &'static str {
        match Verse::new(text, 5, is_first) {
            Err(ValidationError::InvalidVerse { reason, .. }) => reason,
            other => panic!("expected content rejection for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn content_rules() {
        assert_eq!(reason("In 1865 it rained", false), "blacklisted characters");
        assert_eq!(reason("Mr Smith sat down there", false), "blacklisted characters");
        assert_eq!(reason("old pond, frog jumps", false), "blacklisted characters");
        assert_eq!(reason("\"Hello\" said the frog", false), "blacklisted characters");
        assert_eq!(reason("THE OLD SILENT POND", false), "all uppercase");
        assert_eq!(reason("said the little frog", false), "invalid start word");
        assert_eq!(reason("the pond and the frog and", false), "invalid end word");
        assert_eq!(reason("the pond belonged to J", false), "lost letter");
        assert_eq!(reason("extraordinarily unbelievable sky", false), "too long");
        assert_eq!(reason("and the old pond sat", true), "conjunction start");
        assert_eq!(reason("", false), "empty");
    }

    #[test]
    fn word_boundaries_protect_real_words() {
        // "door" ends in "or", "Dreams" starts with "Dr", "Orchard" starts
        // with "or": none of them are the banned words.
        assert!(Verse::new("rain on the old door", 5, true).is_ok());
        assert!(Verse::new("Dreams of the old pond", 5, true).is_ok());
    }

    #[test]
    fn blacklisted_content_check() {
        assert!(has_blacklisted_content("a, b"));
        assert!(has_blacklisted_content("inquired the duke"));
        assert!(!has_blacklisted_content("the old pond"));
    }

    #[test]
    fn pools_from_chapters_dedup_and_track_provenance() {
        let chapters = vec![
            Chapter::new("An old silent pond. A frog jumps into the pond. Splash!"),
            Chapter::new("an old silent pond; the wind blows over the hill."),
        ];
        let pools = VersePools::from_chapters(&chapters);
        let fives: Vec<&str> = pools.five.iter().map(|v| v.text()).collect();
        let sevens: Vec<&str> = pools.seven.iter().map(|v| v.text()).collect();
        assert_eq!(fives, vec!["An old silent pond"]);
        assert_eq!(
            sevens,
            vec!["A frog jumps into the pond", "the wind blows over the hill."]
        );
        assert_eq!(pools.total_quotes, 5);
        assert_eq!(
            pools.seven[1].provenance(),
            Some(Provenance {
                chapter: 1,
                quote_index: 4
            })
        );
    }

    #[test]
    fn viability() {
        let pools = VersePools::from_texts(
            &["An old silent pond", "The wind in the pines"],
            &["A frog jumps into the pond"],
        )
        .unwrap();
        assert!(pools.ensure_viable().is_ok());
        assert_eq!(pools.combinations(), 2);

        let pools =
            VersePools::from_texts(&["An old silent pond"], &["A frog jumps into the pond"])
                .unwrap();
        match pools.ensure_viable() {
            Err(EngineError::InsufficientCorpus { five: 1, seven: 1 }) => {}
            other => panic!("expected InsufficientCorpus, got {other:?}"),
        }
    }

    #[test]
    fn fingerprint_is_content_sensitive() {
        let a = VersePools::from_texts(&["An old silent pond"], &[]).unwrap();
        let b = VersePools::from_texts(&["The wind in the pines"], &[]).unwrap();
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
