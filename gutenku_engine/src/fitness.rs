// Fitness evaluation: reduce a chromosome to named metrics and one scalar.
//
// Metrics fall into three groups:
//
// Counts (penalized or rewarded per occurrence): nature words, words
//   repeated across verses, weak openings, blacklisted verses, unexplained
//   proper nouns, over-long verses.
// Ratios in [0, 1]: sentiment, grammar plausibility, lexical uniqueness,
//   alliteration, verse distance in the source, line length balance,
//   imagery density, semantic coherence, verb presence.
// Markov flows in [0, 10]: bigram ("markov") and trigram flow from
//   `MarkovEvaluator`. Without an evaluator both are 0.
//
// `total_score` is the dot product of the metrics with `FitnessWeights`
// (sentiment enters as `sentiment - 0.5`, so neutral text is unweighted).
// Weights are plain configuration with tuned defaults.
//
// `FitnessEvaluator` attaches metrics to a chromosome exactly once and
// memoizes them by chromosome id, so a chromosome that reappears in a later
// generation is not rescored. Optional `HardThresholds` turn a metric into
// an outright rejection by forcing the fitness to `REJECTED_FITNESS`.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use gutenku_lang::analysis::{is_common_name, is_nature_word, is_sensory_word};
use gutenku_lang::wordlists::{ALLOWED_REPEATS, TITLES, contains};
use gutenku_lang::{PartOfSpeech, guess_pos, phonetic_key, sentiment_score, tokenize_lower};

use crate::chromosome::Chromosome;
use crate::error::Result;
use crate::evaluator::MarkovEvaluator;
use crate::verse::{VERSE_MAX_LENGTH, Verse, VersePools, has_blacklisted_content};

/// Fitness assigned to chromosomes that fail a hard threshold.
pub const REJECTED_FITNESS: f64 = -1.0e6;

/// Sensory words needed for full imagery density.
const IMAGERY_SATURATION: f64 = 6.0;

static WEAK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:it|there|this|that|they|we|he|she|i|and|or|but)\s")
        .expect("weak start pattern is valid")
});

/// Per-chromosome quality breakdown. Attached once, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub nature_words: u32,
    pub repeated_words: u32,
    pub weak_starts: u32,
    pub blacklisted_verses: u32,
    pub proper_nouns: u32,
    pub verse_length_penalty: u32,
    pub sentiment: f64,
    pub grammar: f64,
    pub trigram_flow: f64,
    pub markov_flow: f64,
    pub uniqueness: f64,
    pub alliteration: f64,
    pub verse_distance: f64,
    pub line_length_balance: f64,
    pub imagery_density: f64,
    pub semantic_coherence: f64,
    pub verb_presence: f64,
    pub total_score: f64,
}

/// Linear weights combining `QualityMetrics` into `total_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    pub nature: f64,
    pub repeated: f64,
    pub weak_start: f64,
    pub blacklisted: f64,
    pub proper_noun: f64,
    pub verse_length: f64,
    /// Applied to `sentiment - 0.5`.
    pub sentiment: f64,
    pub grammar: f64,
    pub trigram_flow: f64,
    pub markov_flow: f64,
    pub uniqueness: f64,
    pub alliteration: f64,
    pub verse_distance: f64,
    pub line_length_balance: f64,
    pub imagery: f64,
    pub coherence: f64,
    pub verb: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights {
            // Counts
            nature: 2.0,
            repeated: -2.0,
            weak_start: -2.0,
            blacklisted: -3.0,
            proper_noun: -2.0,
            verse_length: -3.0,

            // Ratios
            sentiment: 4.0,
            grammar: 1.5,
            uniqueness: 2.0,
            alliteration: 1.5,
            verse_distance: 4.0,
            line_length_balance: 1.5,
            imagery: 1.5,
            coherence: 2.0,
            verb: 1.0,

            // Flows are on a 0-10 scale
            trigram_flow: 0.2,
            markov_flow: 0.5,
        }
    }
}

impl FitnessWeights {
    /// Weighted sum of `m`, ignoring `m.total_score`.
    pub fn total(&self, m: &QualityMetrics) -> f64 {
        self.nature * m.nature_words as f64
            + self.repeated * m.repeated_words as f64
            + self.weak_start * m.weak_starts as f64
            + self.blacklisted * m.blacklisted_verses as f64
            + self.proper_noun * m.proper_nouns as f64
            + self.verse_length * m.verse_length_penalty as f64
            + self.sentiment * (m.sentiment - 0.5)
            + self.grammar * m.grammar
            + self.trigram_flow * m.trigram_flow
            + self.markov_flow * m.markov_flow
            + self.uniqueness * m.uniqueness
            + self.alliteration * m.alliteration
            + self.verse_distance * m.verse_distance
            + self.line_length_balance * m.line_length_balance
            + self.imagery * m.imagery_density
            + self.coherence * m.semantic_coherence
            + self.verb * m.verb_presence
    }
}

/// Optional outright rejections. Every bound is off by default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardThresholds {
    pub min_grammar: Option<f64>,
    pub min_markov_flow: Option<f64>,
    pub max_blacklisted_verses: Option<u32>,
    pub max_proper_nouns: Option<u32>,
}

impl HardThresholds {
    pub fn rejects(&self, m: &QualityMetrics) -> bool {
        self.min_grammar.is_some_and(|min| m.grammar < min)
            || self.min_markov_flow.is_some_and(|min| m.markov_flow < min)
            || self
                .max_blacklisted_verses
                .is_some_and(|max| m.blacklisted_verses > max)
            || self.max_proper_nouns.is_some_and(|max| m.proper_nouns > max)
    }
}

/// Scores chromosomes against one set of pools.
pub struct FitnessEvaluator<'m> {
    weights: FitnessWeights,
    thresholds: Option<HardThresholds>,
    markov: Option<&'m MarkovEvaluator>,
    cache: Option<FxHashMap<String, QualityMetrics>>,
    evaluations: u64,
    cache_hits: u64,
}

impl<'m> FitnessEvaluator<'m> {
    pub fn new(weights: FitnessWeights) -> Self {
        FitnessEvaluator {
            weights,
            thresholds: None,
            markov: None,
            cache: Some(FxHashMap::default()),
            evaluations: 0,
            cache_hits: 0,
        }
    }

    pub fn with_markov(mut self, markov: &'m MarkovEvaluator) -> Self {
        self.markov = Some(markov);
        self
    }

    pub fn with_thresholds(mut self, thresholds: HardThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Enable or disable the metrics memo.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(FxHashMap::default);
        self
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Metric computations performed (cache misses).
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    /// Score `chromosome` if it has not been scored yet and return its
    /// fitness.
    pub fn evaluate(&mut self, chromosome: &mut Chromosome, pools: &VersePools) -> Result<f64> {
        if let Some(fitness) = chromosome.fitness().filter(|_| chromosome.is_evaluated()) {
            return Ok(fitness);
        }

        let cached = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get(chromosome.id()))
            .cloned();
        let metrics = match cached {
            Some(metrics) => {
                self.cache_hits += 1;
                metrics
            }
            None => {
                let verses = chromosome.verses(pools)?;
                let metrics = self.compute_metrics(verses, pools.total_quotes)?;
                self.evaluations += 1;
                if let Some(cache) = self.cache.as_mut() {
                    cache.insert(chromosome.id().to_string(), metrics.clone());
                }
                metrics
            }
        };

        let fitness = self.fitness_of(&metrics);
        chromosome.attach_evaluation(metrics, fitness);
        Ok(fitness)
    }

    /// Scalar fitness of already-computed metrics.
    pub fn fitness_of(&self, metrics: &QualityMetrics) -> f64 {
        match &self.thresholds {
            Some(t) if t.rejects(metrics) => REJECTED_FITNESS,
            _ => metrics.total_score,
        }
    }

    /// Compute every metric for three verses.
    pub fn compute_metrics(&self, verses: [&Verse; 3], total_quotes: usize) -> Result<QualityMetrics> {
        let texts = verses.map(Verse::text);
        let verse_tokens = texts.map(tokenize_lower);
        let all_tokens: Vec<&str> = verse_tokens.iter().flatten().map(String::as_str).collect();

        let (markov_flow, trigram_flow) = match self.markov {
            Some(markov) => (markov.bigram_flow(&texts)?, markov.trigram_flow(&texts)?),
            None => (0.0, 0.0),
        };

        let mut metrics = QualityMetrics {
            nature_words: all_tokens.iter().filter(|w| is_nature_word(w)).count() as u32,
            repeated_words: repeated_words(&all_tokens),
            weak_starts: texts.iter().filter(|t| WEAK_START.is_match(t)).count() as u32,
            blacklisted_verses: texts.iter().filter(|t| has_blacklisted_content(t)).count() as u32,
            proper_nouns: texts.iter().map(|t| proper_nouns(t)).sum(),
            verse_length_penalty: texts
                .iter()
                .filter(|t| t.chars().count() >= VERSE_MAX_LENGTH)
                .count() as u32,
            sentiment: sentiment_score(&all_tokens),
            grammar: grammar(&verse_tokens),
            trigram_flow,
            markov_flow,
            uniqueness: uniqueness(&all_tokens),
            alliteration: alliteration(&all_tokens),
            verse_distance: verse_distance(&verses, total_quotes),
            line_length_balance: line_length_balance(&texts),
            imagery_density: (all_tokens.iter().filter(|w| is_sensory_word(w)).count() as f64
                / IMAGERY_SATURATION)
                .min(1.0),
            semantic_coherence: semantic_coherence(&verse_tokens),
            verb_presence: verb_presence(&verse_tokens),
            total_score: 0.0,
        };
        metrics.total_score = self.weights.total(&metrics);
        Ok(metrics)
    }
}

/// Words already seen earlier in the haiku, not counting allowed repeats.
fn repeated_words(words: &[&str]) -> u32 {
    let mut seen = FxHashSet::default();
    let mut repeated = 0;
    for word in words {
        if contains(ALLOWED_REPEATS, word) {
            continue;
        }
        if !seen.insert(*word) {
            repeated += 1;
        }
    }
    repeated
}

/// Capitalized words past the first, plus a first word that is a known
/// given name. Honorifics are skipped.
fn proper_nouns(text: &str) -> u32 {
    let mut count = 0;
    for (i, word) in text.split_whitespace().enumerate() {
        let bare: String = word.chars().filter(|c| c.is_alphabetic()).collect();
        if bare.is_empty() || contains(TITLES, &bare.to_lowercase()) {
            continue;
        }
        let capitalized = bare.chars().next().is_some_and(char::is_uppercase);
        if (i == 0 && is_common_name(&bare)) || (i > 0 && capitalized) {
            count += 1;
        }
    }
    count
}

/// Part-of-speech pattern plausibility averaged over verses.
fn grammar(verse_tokens: &[Vec<String>; 3]) -> f64 {
    let total: f64 = verse_tokens
        .iter()
        .map(|tokens| {
            let tags: Vec<PartOfSpeech> = tokens.iter().map(|w| guess_pos(w)).collect();
            let noun = tags.contains(&PartOfSpeech::Noun);
            let verb = tags.contains(&PartOfSpeech::Verb);
            let adjective = tags.contains(&PartOfSpeech::Adjective);
            match (noun, verb, adjective) {
                (true, true, _) => 1.0,
                (true, false, true) => 0.8,
                (true, false, false) => 0.5,
                (false, true, _) => 0.3,
                _ => 0.0,
            }
        })
        .sum();
    total / verse_tokens.len() as f64
}

fn uniqueness(words: &[&str]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let unique: FxHashSet<&str> = words.iter().copied().collect();
    unique.len() as f64 / words.len() as f64
}

/// Share of words whose first sound occurs more than once.
fn alliteration(words: &[&str]) -> f64 {
    let keys: Vec<char> = words.iter().filter_map(|w| phonetic_key(w)).collect();
    if keys.len() < 2 {
        return 0.0;
    }
    let mut counts: FxHashMap<char, u32> = FxHashMap::default();
    for key in &keys {
        *counts.entry(*key).or_insert(0) += 1;
    }
    let repeated: u32 = counts.values().filter(|&&n| n > 1).sum();
    repeated as f64 / keys.len() as f64
}

/// 1 when the verses come from one spot in the corpus, falling towards 0 as
/// their spread approaches the whole corpus.
fn verse_distance(verses: &[&Verse; 3], total_quotes: usize) -> f64 {
    let indices: Vec<usize> = verses
        .iter()
        .filter_map(|v| v.provenance())
        .map(|p| p.quote_index)
        .collect();
    if indices.len() < 2 || total_quotes == 0 {
        return 1.0;
    }
    let (Some(min), Some(max)) = (indices.iter().min(), indices.iter().max()) else {
        return 1.0;
    };
    (1.0 - (max - min) as f64 / total_quotes as f64).max(0.0)
}

/// `1 - cv` of the character lengths.
fn line_length_balance(texts: &[&str; 3]) -> f64 {
    let lengths = texts.map(|t| t.chars().count() as f64);
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    (1.0 - variance.sqrt() / mean).max(0.0)
}

/// Mean Jaccard similarity over the three verse pairs, using words longer
/// than two characters.
fn semantic_coherence(verse_tokens: &[Vec<String>; 3]) -> f64 {
    let sets = verse_tokens.each_ref().map(|tokens| {
        tokens
            .iter()
            .filter(|w| w.chars().count() > 2)
            .map(String::as_str)
            .collect::<FxHashSet<&str>>()
    });
    let pairs = [(0, 1), (0, 2), (1, 2)];
    let total: f64 = pairs
        .iter()
        .map(|&(a, b)| {
            let union = sets[a].union(&sets[b]).count();
            if union == 0 {
                0.0
            } else {
                sets[a].intersection(&sets[b]).count() as f64 / union as f64
            }
        })
        .sum();
    total / pairs.len() as f64
}

fn verb_presence(verse_tokens: &[Vec<String>; 3]) -> f64 {
    let with_verb = verse_tokens
        .iter()
        .filter(|tokens| tokens.iter().any(|w| guess_pos(w) == PartOfSpeech::Verb))
        .count();
    (with_verb as f64 / 3.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::ModelNotReadyPolicy;

    fn pools() -> VersePools {
        VersePools::from_texts(
            &["An old silent pond", "The wind in the pines", "Cold rain on the hill"],
            &["A frog jumps into the pond", "The moon shines over the hill"],
        )
        .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn metrics_of_a_known_haiku() {
        let pools = pools();
        let chromosome = Chromosome::new([0, 0, 1], 0, &pools).unwrap();
        let evaluator = FitnessEvaluator::new(FitnessWeights::default());
        let m = evaluator
            .compute_metrics(chromosome.verses(&pools).unwrap(), pools.total_quotes)
            .unwrap();

        // pond, frog, pond, wind
        assert_eq!(m.nature_words, 4);
        // second "pond"
        assert_eq!(m.repeated_words, 1);
        assert_eq!(m.weak_starts, 0);
        assert_eq!(m.blacklisted_verses, 0);
        assert_eq!(m.proper_nouns, 0);
        assert_eq!(m.verse_length_penalty, 0);
        assert!(approx(m.sentiment, 0.5));
        // 12 distinct of 15 words
        assert!(approx(m.uniqueness, 0.8));
        // quote indices 0, 3, 1 of 5
        assert!(approx(m.verse_distance, 0.4));
        // only "silent" is sensory
        assert!(approx(m.imagery_density, 1.0 / 6.0));
        // {pond} of 7, nothing, {the} of 7
        assert!(approx(m.semantic_coherence, 2.0 / 21.0));
        assert_eq!(m.markov_flow, 0.0);
        assert!(approx(m.total_score, FitnessWeights::default().total(&m)));
    }

    #[test]
    fn weak_starts_and_proper_nouns() {
        assert!(WEAK_START.is_match("It was a dark night"));
        assert!(WEAK_START.is_match("there the river bends"));
        assert!(!WEAK_START.is_match("Iris blooms alone"));

        assert_eq!(proper_nouns("Mary walked to London"), 2);
        assert_eq!(proper_nouns("the Mr Smith house"), 1);
        assert_eq!(proper_nouns("Autumn comes at last"), 0);
    }

    #[test]
    fn alliteration_counts_shared_first_sounds() {
        assert!(approx(alliteration(&["silver", "city", "stone", "moon"]), 0.75));
        assert!(approx(alliteration(&["phantom", "fire"]), 1.0));
        assert_eq!(alliteration(&["moon"]), 0.0);
    }

    #[test]
    fn grammar_rewards_noun_and_verb() {
        let tokens = [
            vec!["the".to_string(), "frog".to_string(), "sat".to_string()],
            vec!["old".to_string(), "pond".to_string()],
            vec!["the".to_string(), "of".to_string()],
        ];
        assert!(approx(grammar(&tokens), (1.0 + 0.8 + 0.0) / 3.0));
        assert!(approx(verb_presence(&tokens), 1.0 / 3.0));
    }

    #[test]
    fn equal_lines_are_balanced() {
        assert!(approx(line_length_balance(&["abcd", "efgh", "ijkl"]), 1.0));
        assert!(line_length_balance(&["a", "abcdefghijklmnop", "ab"]) < 0.5);
    }

    #[test]
    fn evaluation_is_cached_by_id() {
        let pools = pools();
        let mut evaluator = FitnessEvaluator::new(FitnessWeights::default());
        let mut a = Chromosome::new([0, 1, 2], 0, &pools).unwrap();
        let mut b = Chromosome::new([0, 1, 2], 4, &pools).unwrap();
        let fa = evaluator.evaluate(&mut a, &pools).unwrap();
        let fb = evaluator.evaluate(&mut b, &pools).unwrap();
        assert_eq!(fa, fb);
        assert_eq!(evaluator.evaluations(), 1);
        assert_eq!(evaluator.cache_hits(), 1);

        // Already evaluated: neither recomputed nor looked up.
        evaluator.evaluate(&mut a, &pools).unwrap();
        assert_eq!(evaluator.evaluations(), 1);
        assert_eq!(evaluator.cache_hits(), 1);

        let mut uncached = FitnessEvaluator::new(FitnessWeights::default()).with_cache(false);
        let mut c = Chromosome::new([0, 1, 2], 0, &pools).unwrap();
        let mut d = Chromosome::new([0, 1, 2], 0, &pools).unwrap();
        uncached.evaluate(&mut c, &pools).unwrap();
        uncached.evaluate(&mut d, &pools).unwrap();
        assert_eq!(uncached.evaluations(), 2);
    }

    #[test]
    fn hard_threshold_rejects() {
        let pools = pools();
        let thresholds = HardThresholds {
            min_grammar: Some(2.0),
            ..HardThresholds::default()
        };
        let mut evaluator = FitnessEvaluator::new(FitnessWeights::default()).with_thresholds(thresholds);
        let mut c = Chromosome::new([0, 1, 2], 0, &pools).unwrap();
        assert_eq!(evaluator.evaluate(&mut c, &pools).unwrap(), REJECTED_FITNESS);
        assert!(c.metrics().unwrap().total_score > REJECTED_FITNESS);
    }

    #[test]
    fn markov_flows_feed_the_score() {
        let pools = pools();
        let mut markov = MarkovEvaluator::new(ModelNotReadyPolicy::Fail);
        markov.train("An old silent pond. A frog jumps into the pond. The wind in the pines.");
        let mut evaluator = FitnessEvaluator::new(FitnessWeights::default()).with_markov(&markov);
        let mut c = Chromosome::new([0, 0, 1], 0, &pools).unwrap();
        evaluator.evaluate(&mut c, &pools).unwrap();
        let m = c.metrics().unwrap();
        assert!(m.markov_flow > 0.0);
        assert!(m.trigram_flow > 0.0);

        let unready = MarkovEvaluator::new(ModelNotReadyPolicy::Fail);
        let mut strict = FitnessEvaluator::new(FitnessWeights::default()).with_markov(&unready);
        let mut d = Chromosome::new([0, 0, 1], 0, &pools).unwrap();
        assert!(strict.evaluate(&mut d, &pools).is_err());
    }
}
