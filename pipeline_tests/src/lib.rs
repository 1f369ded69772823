// Test-only corpus fixtures for end-to-end pipeline tests.
//
// Builds small chapters whose clauses validate as five- and seven-syllable
// verses, writes them to a temporary directory the way the CLI reads a
// corpus, and wraps the real `ParallelTrainer`, `VersePools`, and
// `Evolution` behind a few helpers. Nothing here reimplements engine logic;
// the helpers only pick sizes and seeds that keep debug-build tests fast.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use gutenku_engine::{
    Chapter, EvolutionResult, GaConfig, MarkovEvaluator, ModelNotReadyPolicy, ParallelTrainer,
    VersePools,
};

/// Clauses that validate as five-syllable verses.
pub const FIVE_SYLLABLE: &[&str] = &[
    "An old silent pond",
    "The wind in the pines",
    "Cold rain on the hill",
    "Dreams of the old pond",
    "Snow falls on the roof",
    "Leaves drift in the stream",
    "Birds sing in the trees",
];

/// Clauses that validate as seven-syllable verses.
pub const SEVEN_SYLLABLE: &[&str] = &[
    "A frog jumps into the pond",
    "The moon shines over the hill",
    "The river runs to the sea",
    "She walked along the river",
];

/// A chapter whose sentences are the fixture clauses, rotated by `index`
/// so chapters differ but share vocabulary.
pub fn haiku_chapter(index: usize) -> Chapter {
    let mut sentences = Vec::new();
    for i in 0..FIVE_SYLLABLE.len().max(SEVEN_SYLLABLE.len()) {
        sentences.push(FIVE_SYLLABLE[(index + i) % FIVE_SYLLABLE.len()]);
        sentences.push(SEVEN_SYLLABLE[(index + i) % SEVEN_SYLLABLE.len()]);
    }
    let content = sentences
        .iter()
        .map(|s| format!("{s}."))
        .collect::<Vec<_>>()
        .join(" ");
    Chapter::titled(format!("Chapter {}", index + 1), content)
}

/// `count` fixture chapters.
pub fn haiku_corpus(count: usize) -> Vec<Chapter> {
    (0..count).map(haiku_chapter).collect()
}

/// A chapter repeating one sentence `times` times.
pub fn repeated_chapter(sentence: &str, times: usize) -> Chapter {
    Chapter::new(vec![sentence; times].join(" "))
}

/// Write chapters as `chapter_NN.txt` files in a fresh temporary directory.
/// The directory is removed when the returned handle drops.
pub fn write_corpus_dir(chapters: &[Chapter]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp corpus dir");
    for (i, chapter) in chapters.iter().enumerate() {
        let path = dir.path().join(format!("chapter_{i:02}.txt"));
        fs::write(&path, &chapter.content).expect("write chapter file");
    }
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Train a model with `workers` threads and wrap it in an evaluator that
/// fails loudly if it is ever asked to score without a model.
pub fn trained_evaluator(chapters: &[Chapter], workers: usize) -> MarkovEvaluator {
    let model = ParallelTrainer::new(workers)
        .train(chapters, |_, _| {})
        .expect("training fixture corpus");
    MarkovEvaluator::with_model(model, ModelNotReadyPolicy::Fail)
}

/// A small, seeded config that runs all of its generations.
pub fn quick_config(seed: u32, generations: u32) -> GaConfig {
    GaConfig {
        population_size: 16,
        elitism_count: 2,
        max_generations: generations,
        early_stop: false,
        return_count: 3,
        seed: Some(seed),
        ..GaConfig::default()
    }
}

/// Serialize a result for byte-level comparison.
pub fn result_json(result: &EvolutionResult) -> String {
    serde_json::to_string(result).expect("serialize evolution result")
}

/// Pools extracted from `haiku_corpus(chapters)`.
pub fn fixture_pools(chapters: usize) -> VersePools {
    VersePools::from_chapters(&haiku_corpus(chapters))
}
