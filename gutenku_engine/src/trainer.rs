// Parallel Markov trainer.
//
// Splits the chapters round-robin into `min(worker_count, chapters)` batches
// and trains each batch on its own named OS thread. Workers are stateless:
// they take ownership of their batch, post exactly one message on an mpsc
// channel (the batch's model as a `WirePayload`, or an error string), and
// exit. The orchestrator waits for every worker, then either merges all
// partial models in batch order or, if any worker reported an error or
// panicked, rejects the whole run with `EngineError::Worker`. There is no
// partial merge; the caller retries the full run (or trains sequentially).
//
// Because `MarkovModel::merge` is associative and commutative, the merged
// model is identical for any worker count, including the sequential path.
//
// `train_sequential` is the fallback for small corpora and constrained
// environments. It calls `thread::yield_now` every few chapters so a long
// training run does not monopolize its core.

use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::GaConfig;
use crate::corpus::Chapter;
use crate::error::{EngineError, Result};
use crate::markov::{MarkovModel, WirePayload};

/// Chapters trained between cooperative yields on the sequential path.
pub const DEFAULT_YIELD_EVERY: usize = 10;

/// Worker entry point: train one batch of chapter texts.
pub type WorkerFn = fn(&[String]) -> std::result::Result<WirePayload, String>;

/// `max(1, logical CPUs - 1)`, leaving one core for the caller.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// The per-worker algorithm: train a fresh model on every text in the batch
/// and encode it for transfer.
pub fn train_batch(texts: &[String]) -> std::result::Result<WirePayload, String> {
    let mut model = MarkovModel::new();
    for text in texts {
        model.train_text(text);
    }
    Ok(model.to_wire())
}

/// Round-robin chapters into at most `worker_count` non-empty batches.
pub fn make_batches(chapters: &[Chapter], worker_count: usize) -> Vec<Vec<String>> {
    let batch_count = worker_count.max(1).min(chapters.len());
    let mut batches = vec![Vec::new(); batch_count];
    for (i, chapter) in chapters.iter().enumerate() {
        batches[i % batch_count].push(chapter.content.clone());
    }
    batches.retain(|b| !b.is_empty());
    batches
}

/// Train on every chapter in the calling thread.
pub fn train_sequential(
    chapters: &[Chapter],
    yield_every: usize,
    mut on_progress: impl FnMut(usize, usize),
) -> MarkovModel {
    let start = Instant::now();
    let mut model = MarkovModel::new();
    let total = chapters.len();
    for (i, chapter) in chapters.iter().enumerate() {
        model.train_text(&chapter.content);
        on_progress(i + 1, total);
        if yield_every > 0 && (i + 1) % yield_every == 0 {
            thread::yield_now();
        }
    }
    let stats = model.stats();
    info!(
        chapters = total,
        vocabulary = stats.vocabulary,
        total_bigrams = stats.total_bigrams,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "sequential markov training complete"
    );
    model
}

/// Multi-threaded trainer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelTrainer {
    worker_count: usize,
}

impl Default for ParallelTrainer {
    fn default() -> Self {
        ParallelTrainer::new(default_worker_count())
    }
}

impl ParallelTrainer {
    /// A trainer using `worker_count` threads (at least one).
    pub fn new(worker_count: usize) -> Self {
        ParallelTrainer {
            worker_count: worker_count.max(1),
        }
    }

    /// A trainer sized by `config.worker_count`.
    pub fn from_config(config: &GaConfig) -> Self {
        ParallelTrainer::new(config.workers())
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Train on `chapters`, reporting `on_progress(completed, total)` as
    /// batches finish.
    pub fn train(
        &self,
        chapters: &[Chapter],
        on_progress: impl FnMut(usize, usize),
    ) -> Result<MarkovModel> {
        self.train_with(chapters, train_batch, on_progress)
    }

    /// `train` with an explicit worker function.
    pub fn train_with(
        &self,
        chapters: &[Chapter],
        worker: WorkerFn,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<MarkovModel> {
        let start = Instant::now();
        let batches = make_batches(chapters, self.worker_count);
        let total = batches.len();
        info!(
            chapters = chapters.len(),
            batches = total,
            workers = self.worker_count,
            "starting parallel markov training"
        );
        if total == 0 {
            return Ok(MarkovModel::new());
        }

        let (tx, rx) = mpsc::channel::<(usize, std::result::Result<WirePayload, String>)>();
        let mut handles = Vec::with_capacity(total);
        for (index, batch) in batches.into_iter().enumerate() {
            let tx = tx.clone();
            let handle = thread::Builder::new()
                .name(format!("markov-worker-{index}"))
                .spawn(move || {
                    // A closed channel means the orchestrator is gone; the
                    // result has nowhere to go.
                    let _ = tx.send((index, worker(&batch)));
                })
                .map_err(|e| EngineError::Worker(format!("failed to spawn worker {index}: {e}")))?;
            handles.push(handle);
        }
        drop(tx);

        let mut payloads: Vec<Option<WirePayload>> = vec![None; total];
        let mut failures = Vec::new();
        let mut completed = 0;
        while let Ok((index, result)) = rx.recv() {
            completed += 1;
            on_progress(completed, total);
            match result {
                Ok(payload) => payloads[index] = Some(payload),
                Err(message) => {
                    warn!(worker = index, %message, "markov worker reported an error");
                    failures.push(format!("worker {index}: {message}"));
                }
            }
        }

        for (index, handle) in handles.into_iter().enumerate() {
            if let Err(panic) = handle.join() {
                let message = panic_message(panic.as_ref());
                warn!(worker = index, %message, "markov worker panicked");
                failures.push(format!("worker {index} panicked: {message}"));
            }
        }
        if !failures.is_empty() {
            return Err(EngineError::Worker(failures.join("; ")));
        }

        let mut model = MarkovModel::new();
        for (index, payload) in payloads.into_iter().enumerate() {
            let payload = payload
                .ok_or_else(|| EngineError::Worker(format!("worker {index} sent no result")))?;
            model.merge(&MarkovModel::from_wire(payload));
            debug!(worker = index, "merged partial model");
        }

        let stats = model.stats();
        info!(
            batches = total,
            bigram_keys = stats.bigram_keys,
            trigram_keys = stats.trigram_keys,
            vocabulary = stats.vocabulary,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "parallel markov training complete"
        );
        Ok(model)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters(n: usize) -> Vec<Chapter> {
        (0..n)
            .map(|i| Chapter::new(format!("Chapter {i} begins. The wind moves over the water {i}.")))
            .collect()
    }

    #[test]
    fn batches_are_round_robin_and_never_empty() {
        let batches = make_batches(&chapters(5), 3);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 2);
        assert_eq!(batches[2].len(), 1);
        assert!(batches[0][1].contains("Chapter 3"));

        assert_eq!(make_batches(&chapters(2), 8).len(), 2);
        assert!(make_batches(&[], 4).is_empty());
    }

    #[test]
    fn worker_count_is_at_least_one() {
        assert_eq!(ParallelTrainer::new(0).worker_count(), 1);
        assert!(default_worker_count() >= 1);
    }

    #[test]
    fn config_sets_worker_count() {
        let config = GaConfig {
            worker_count: Some(3),
            ..GaConfig::default()
        };
        assert_eq!(ParallelTrainer::from_config(&config).worker_count(), 3);
        assert_eq!(
            ParallelTrainer::from_config(&GaConfig::default()).worker_count(),
            default_worker_count()
        );
    }

    #[test]
    fn parallel_matches_sequential() {
        let corpus = chapters(7);
        let sequential = train_sequential(&corpus, 2, |_, _| {});
        for workers in [1, 2, 3, 4, 8] {
            let parallel = ParallelTrainer::new(workers).train(&corpus, |_, _| {}).unwrap();
            assert_eq!(parallel, sequential, "worker count {workers}");
        }
    }

    #[test]
    fn progress_reports_every_batch() {
        let mut seen = Vec::new();
        ParallelTrainer::new(3)
            .train(&chapters(6), |done, total| seen.push((done, total)))
            .unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    fn failing_worker(texts: &[String]) -> std::result::Result<WirePayload, String> {
        if texts.iter().any(|t| t.contains("poison")) {
            return Err("bad chapter".to_string());
        }
        train_batch(texts)
    }

    fn panicking_worker(texts: &[String]) -> std::result::Result<WirePayload, String> {
        if texts.iter().any(|t| t.contains("poison")) {
            panic!("worker blew up");
        }
        train_batch(texts)
    }

    #[test]
    fn any_worker_error_rejects_the_run() {
        let mut corpus = chapters(4);
        corpus.push(Chapter::new("This chapter is poison."));
        let err = ParallelTrainer::new(3)
            .train_with(&corpus, failing_worker, |_, _| {})
            .unwrap_err();
        match err {
            EngineError::Worker(message) => assert!(message.contains("bad chapter")),
            other => panic!("expected worker error, got {other:?}"),
        }
    }

    #[test]
    fn worker_panic_rejects_the_run() {
        let mut corpus = chapters(4);
        corpus.push(Chapter::new("This chapter is poison."));
        let err = ParallelTrainer::new(2)
            .train_with(&corpus, panicking_worker, |_, _| {})
            .unwrap_err();
        match err {
            EngineError::Worker(message) => assert!(message.contains("worker blew up")),
            other => panic!("expected worker error, got {other:?}"),
        }
    }

    #[test]
    fn empty_corpus_trains_empty_model() {
        let model = ParallelTrainer::new(4).train(&[], |_, _| {}).unwrap();
        assert!(model.is_empty());
    }
}
