// Bigram/trigram word model trained from chapter text.
//
// The model stores raw counts only: `bigrams[w1][w2]`, `trigrams["w1 w2"][w3]`,
// per-key totals, global totals, and the vocabulary. Probabilities are derived
// at scoring time (`count / total`, see `evaluator.rs`), never stored.
//
// Training a text: strip abbreviation dots, split into sentences, tokenize
// each sentence into lower-cased words, drop the coordinating conjunctions
// (for, and, nor, but, or, yet, so), then count every adjacent pair and
// triple within the sentence.
//
// Every map is a `BTreeMap`, so iteration order and JSON output are fully
// deterministic. `merge` is plain key-wise addition plus a set union; it is
// associative and commutative, which is what lets the parallel trainer split
// the corpus into any batches and still produce a byte-identical model.
//
// `WirePayload` is the tuple-array form exchanged with training workers. It
// exists only at that boundary; the in-memory model is always the map form.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use gutenku_lang::analysis::is_fanboy;
use gutenku_lang::{split_sentences, tokenize_lower};

use crate::error::Result;

/// Next-word counts following one context.
pub type TransitionTable = BTreeMap<String, u64>;

/// Counted n-gram statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkovModel {
    pub bigrams: BTreeMap<String, TransitionTable>,
    pub trigrams: BTreeMap<String, TransitionTable>,
    pub bigram_totals: BTreeMap<String, u64>,
    pub trigram_totals: BTreeMap<String, u64>,
    pub total_bigrams: u64,
    pub total_trigrams: u64,
    pub vocabulary: BTreeSet<String>,
}

/// Summary sizes of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStats {
    pub bigram_keys: usize,
    pub trigram_keys: usize,
    pub vocabulary: usize,
    pub total_bigrams: u64,
    pub total_trigrams: u64,
}

/// `(context, [(next word, count)])` rows.
pub type WireRows = Vec<(String, Vec<(String, u64)>)>;

/// Tuple-array encoding of a model for transfer out of a worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePayload {
    pub bigrams: WireRows,
    pub trigrams: WireRows,
    pub bigram_totals: Vec<(String, u64)>,
    pub trigram_totals: Vec<(String, u64)>,
    pub total_bigrams: u64,
    pub total_trigrams: u64,
    pub vocabulary: Vec<String>,
}

/// Lower-cased words of a text with coordinating conjunctions removed.
/// This is the token stream both training and scoring walk over.
pub fn transition_tokens(text: &str) -> Vec<String> {
    tokenize_lower(text)
        .into_iter()
        .filter(|w| !is_fanboy(w))
        .collect()
}

/// Key of a trigram context.
pub fn trigram_key(first: &str, second: &str) -> String {
    format!("{first} {second}")
}

impl MarkovModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Train incrementally on one more text (typically a chapter).
    pub fn train_text(&mut self, text: &str) {
        for sentence in split_sentences(text) {
            let words = transition_tokens(&sentence);
            self.add_sequence(&words);
        }
    }

    /// Count the transitions of one token sequence.
    pub fn add_sequence(&mut self, words: &[String]) {
        for word in words {
            if !self.vocabulary.contains(word) {
                self.vocabulary.insert(word.clone());
            }
        }
        for pair in words.windows(2) {
            bump(&mut self.bigrams, &mut self.bigram_totals, &pair[0], &pair[1], 1);
            self.total_bigrams += 1;
        }
        for triple in words.windows(3) {
            let key = trigram_key(&triple[0], &triple[1]);
            bump(&mut self.trigrams, &mut self.trigram_totals, &key, &triple[2], 1);
            self.total_trigrams += 1;
        }
    }

    /// Add another model's counts into this one.
    pub fn merge(&mut self, other: &MarkovModel) {
        merge_tables(&mut self.bigrams, &other.bigrams);
        merge_tables(&mut self.trigrams, &other.trigrams);
        merge_totals(&mut self.bigram_totals, &other.bigram_totals);
        merge_totals(&mut self.trigram_totals, &other.trigram_totals);
        self.total_bigrams += other.total_bigrams;
        self.total_trigrams += other.total_trigrams;
        self.vocabulary.extend(other.vocabulary.iter().cloned());
    }

    /// Merge a sequence of partial models in order.
    pub fn merged<'a>(parts: impl IntoIterator<Item = &'a MarkovModel>) -> MarkovModel {
        let mut model = MarkovModel::new();
        for part in parts {
            model.merge(part);
        }
        model
    }

    /// Transition count and context total for `from → to`.
    pub fn bigram_count(&self, from: &str, to: &str) -> (u64, u64) {
        lookup(&self.bigrams, &self.bigram_totals, from, to)
    }

    /// Transition count and context total for `(first, second) → to`.
    pub fn trigram_count(&self, first: &str, second: &str, to: &str) -> (u64, u64) {
        lookup(&self.trigrams, &self.trigram_totals, &trigram_key(first, second), to)
    }

    pub fn is_empty(&self) -> bool {
        self.total_bigrams == 0 && self.vocabulary.is_empty()
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            bigram_keys: self.bigrams.len(),
            trigram_keys: self.trigrams.len(),
            vocabulary: self.vocabulary.len(),
            total_bigrams: self.total_bigrams,
            total_trigrams: self.total_trigrams,
        }
    }

    /// Encode as tuple arrays for the worker boundary.
    pub fn to_wire(&self) -> WirePayload {
        WirePayload {
            bigrams: table_to_rows(&self.bigrams),
            trigrams: table_to_rows(&self.trigrams),
            bigram_totals: self.bigram_totals.clone().into_iter().collect(),
            trigram_totals: self.trigram_totals.clone().into_iter().collect(),
            total_bigrams: self.total_bigrams,
            total_trigrams: self.total_trigrams,
            vocabulary: self.vocabulary.iter().cloned().collect(),
        }
    }

    /// Decode a worker payload back into the map form.
    pub fn from_wire(payload: WirePayload) -> Self {
        MarkovModel {
            bigrams: rows_to_table(payload.bigrams),
            trigrams: rows_to_table(payload.trigrams),
            bigram_totals: payload.bigram_totals.into_iter().collect(),
            trigram_totals: payload.trigram_totals.into_iter().collect(),
            total_bigrams: payload.total_bigrams,
            total_trigrams: payload.total_trigrams,
            vocabulary: payload.vocabulary.into_iter().collect(),
        }
    }

    /// Write the model as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        let stats = self.stats();
        info!(
            path = %path.display(),
            bigram_keys = stats.bigram_keys,
            trigram_keys = stats.trigram_keys,
            vocabulary = stats.vocabulary,
            "saved markov model"
        );
        Ok(())
    }

    /// Load a model written by `save`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let model: MarkovModel = serde_json::from_str(&data)?;
        info!(path = %path.display(), vocabulary = model.vocabulary.len(), "loaded markov model");
        Ok(model)
    }
}

fn bump(
    table: &mut BTreeMap<String, TransitionTable>,
    totals: &mut BTreeMap<String, u64>,
    from: &str,
    to: &str,
    by: u64,
) {
    *table
        .entry(from.to_string())
        .or_default()
        .entry(to.to_string())
        .or_insert(0) += by;
    *totals.entry(from.to_string()).or_insert(0) += by;
}

fn table_to_rows(table: &BTreeMap<String, TransitionTable>) -> WireRows {
    table
        .iter()
        .map(|(key, next)| (key.clone(), next.clone().into_iter().collect()))
        .collect()
}

fn rows_to_table(rows: WireRows) -> BTreeMap<String, TransitionTable> {
    rows.into_iter()
        .map(|(key, entries)| (key, entries.into_iter().collect()))
        .collect()
}

fn merge_tables(
    into: &mut BTreeMap<String, TransitionTable>,
    from: &BTreeMap<String, TransitionTable>,
) {
    for (key, next) in from {
        let target = into.entry(key.clone()).or_default();
        for (word, count) in next {
            *target.entry(word.clone()).or_insert(0) += count;
        }
    }
}

fn merge_totals(into: &mut BTreeMap<String, u64>, from: &BTreeMap<String, u64>) {
    for (key, count) in from {
        *into.entry(key.clone()).or_insert(0) += count;
    }
}

fn lookup(
    table: &BTreeMap<String, TransitionTable>,
    totals: &BTreeMap<String, u64>,
    from: &str,
    to: &str,
) -> (u64, u64) {
    let count = table
        .get(from)
        .and_then(|next| next.get(to))
        .copied()
        .unwrap_or(0);
    let total = totals.get(from).copied().unwrap_or(0);
    (count, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_pairs_and_triples_within_sentences() {
        let mut model = MarkovModel::new();
        model.train_text("The cat sat on the mat. The cat ran.");
        assert_eq!(model.bigram_count("the", "cat"), (2, 3));
        assert_eq!(model.bigram_count("the", "mat"), (1, 3));
        // No transition across the sentence boundary.
        assert_eq!(model.bigram_count("mat", "the"), (0, 0));
        assert_eq!(model.trigram_count("the", "cat", "sat"), (1, 2));
        assert_eq!(model.trigram_count("the", "cat", "ran"), (1, 2));
        assert_eq!(model.total_bigrams, 7);
        assert_eq!(model.total_trigrams, 5);
        assert_eq!(model.vocabulary.len(), 6);
    }

    #[test]
    fn conjunctions_are_dropped_from_sequences() {
        let mut model = MarkovModel::new();
        model.train_text("Bread and butter, yet jam.");
        assert_eq!(model.bigram_count("bread", "butter"), (1, 1));
        assert_eq!(model.bigram_count("butter", "jam"), (1, 1));
        assert!(!model.vocabulary.contains("and"));
        assert!(!model.vocabulary.contains("yet"));
    }

    #[test]
    fn abbreviations_do_not_split_sentences() {
        let mut model = MarkovModel::new();
        model.train_text("Mr. Smith smiled.");
        assert_eq!(model.bigram_count("mr", "smith"), (1, 1));
    }

    #[test]
    fn merge_is_order_independent() {
        let mut a = MarkovModel::new();
        a.train_text("The old pond. A frog jumps in.");
        let mut b = MarkovModel::new();
        b.train_text("The old man and the sea.");
        let mut c = MarkovModel::new();
        c.train_text("A frog jumps over the old log.");

        let abc = MarkovModel::merged([&a, &b, &c]);
        let cba = MarkovModel::merged([&c, &b, &a]);
        assert_eq!(abc, cba);

        let mut whole = MarkovModel::new();
        whole.train_text("The old pond. A frog jumps in.");
        whole.train_text("The old man and the sea.");
        whole.train_text("A frog jumps over the old log.");
        assert_eq!(
            serde_json::to_string(&whole).unwrap(),
            serde_json::to_string(&abc).unwrap()
        );
    }

    #[test]
    fn wire_roundtrip_preserves_model() {
        let mut model = MarkovModel::new();
        model.train_text("Snow falls on the quiet field. The field sleeps.");
        let wire = model.to_wire();
        assert_eq!(wire.vocabulary.len(), model.vocabulary.len());
        assert_eq!(MarkovModel::from_wire(wire), model);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/markov.json");
        let mut model = MarkovModel::new();
        model.train_text("Snow falls on the quiet field.");
        model.save(&path).unwrap();
        let loaded = MarkovModel::load(&path).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.stats(), model.stats());
    }

    #[test]
    fn stats_of_empty_model() {
        let model = MarkovModel::new();
        assert!(model.is_empty());
        assert_eq!(
            model.stats(),
            ModelStats {
                bigram_keys: 0,
                trigram_keys: 0,
                vocabulary: 0,
                total_bigrams: 0,
                total_trigrams: 0,
            }
        );
    }
}
