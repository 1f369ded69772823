// GA orchestrator: drives a `PopulationManager` from initialization to
// termination and packages the outcome.
//
// States: Initialize -> Evaluate -> (stop?) -> Select/Crossover/Mutate ->
// Evaluate -> ... The loop ends when `max_generations` is reached, when the
// run has converged or spent its evaluation budget (both only with
// `early_stop`), or when the caller trips the `StopSignal`. The signal is
// checked between generations, so a stopped run still returns its
// best-so-far. The result records which of these ended the run.
//
// The loop is single-threaded and does no I/O. Independent runs can go in
// parallel (`run_batch`, rayon) because each run owns its PRNG stream and
// only shares the read-only pools and Markov model.
//
// `generate` is the one-call entry point used by request handlers: run,
// take the best chromosome, wrap it in a `HaikuAggregate`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use gutenku_prng::seed_from_label;

use crate::chromosome::Chromosome;
use crate::config::GaConfig;
use crate::error::{EngineError, Result};
use crate::evaluator::MarkovEvaluator;
use crate::fitness::QualityMetrics;
use crate::haiku::{BookRef, ChapterRef, HaikuAggregate};
use crate::population::{GenerationStats, PopulationManager};
use crate::verse::VersePools;

/// Cooperative cancellation flag shared between a run and its caller.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to stop after the current generation.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxGenerations,
    Converged,
    EvaluationBudget,
    Signal,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::MaxGenerations => "max_generations",
            StopReason::Converged => "converged",
            StopReason::EvaluationBudget => "evaluation_budget",
            StopReason::Signal => "signal",
        }
    }
}

/// Terminal output of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Distinct chromosomes, best first, at most `return_count`.
    pub best_chromosomes: Vec<Chromosome>,
    pub generations_run: u32,
    pub stop_reason: StopReason,
    pub evaluations: u64,
    pub history: Option<Vec<GenerationStats>>,
    pub seed: u32,
}

impl EvolutionResult {
    pub fn best(&self) -> Option<&Chromosome> {
        self.best_chromosomes.first()
    }

    pub fn converged(&self) -> bool {
        self.stop_reason == StopReason::Converged
    }

    /// Ended by the stop signal or the evaluation budget.
    pub fn stopped_early(&self) -> bool {
        matches!(
            self.stop_reason,
            StopReason::Signal | StopReason::EvaluationBudget
        )
    }
}

pub struct Evolution;

impl Evolution {
    /// Run one evolution over `pools`.
    pub fn run(
        pools: &VersePools,
        markov: Option<&MarkovEvaluator>,
        config: &GaConfig,
        stop: Option<&StopSignal>,
    ) -> Result<EvolutionResult> {
        Self::run_with_progress(pools, markov, config, stop, |_| {})
    }

    /// `run`, calling `on_generation` with the stats of the initial
    /// population and of every generation after it.
    pub fn run_with_progress(
        pools: &VersePools,
        markov: Option<&MarkovEvaluator>,
        config: &GaConfig,
        stop: Option<&StopSignal>,
        mut on_generation: impl FnMut(&GenerationStats),
    ) -> Result<EvolutionResult> {
        let config = config.sanitized();
        pools.ensure_viable()?;
        let seed = config.seed.unwrap_or_else(|| pools.fingerprint());
        let budget = config.evaluation_budget();
        let start = Instant::now();
        info!(
            seed,
            five = pools.five.len(),
            seven = pools.seven.len(),
            population = config.population_size,
            max_generations = config.max_generations,
            ?budget,
            "starting evolution"
        );

        let mut manager = PopulationManager::new(pools, markov, &config, seed)?;
        manager.initialize()?;
        if let Some(stats) = manager.history().last() {
            on_generation(stats);
        }

        let mut stop_reason = StopReason::MaxGenerations;
        while manager.generation() < config.max_generations {
            if stop.is_some_and(StopSignal::is_stopped) {
                info!(generation = manager.generation(), "stop signal received");
                stop_reason = StopReason::Signal;
                break;
            }
            if budget.is_some_and(|cap| manager.evaluations() >= cap) {
                info!(
                    generation = manager.generation(),
                    evaluations = manager.evaluations(),
                    "evaluation budget spent"
                );
                stop_reason = StopReason::EvaluationBudget;
                break;
            }
            manager.evolve()?;
            if let Some(stats) = manager.history().last() {
                on_generation(stats);
            }
            if config.early_stop && manager.has_converged() {
                stop_reason = StopReason::Converged;
                break;
            }
        }

        let result = EvolutionResult {
            best_chromosomes: manager.top(config.return_count),
            generations_run: manager.generation(),
            stop_reason,
            evaluations: manager.evaluations(),
            history: config.record_history.then(|| manager.history().to_vec()),
            seed,
        };
        info!(
            generations = result.generations_run,
            stop_reason = stop_reason.as_str(),
            evaluations = result.evaluations,
            best = result.best().and_then(Chromosome::fitness),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "evolution finished"
        );
        Ok(result)
    }
}

/// Run several independent evolutions in parallel. A config without a seed
/// gets one derived from the pools and its position, so the runs differ but
/// stay reproducible.
pub fn run_batch(
    pools: &VersePools,
    markov: Option<&MarkovEvaluator>,
    configs: &[GaConfig],
) -> Vec<Result<EvolutionResult>> {
    let fingerprint = pools.fingerprint();
    configs
        .par_iter()
        .enumerate()
        .map(|(index, config)| {
            let mut config = config.clone();
            if config.seed.is_none() {
                config.seed = Some(seed_from_label(&format!("{fingerprint}:{index}")));
            }
            Evolution::run(pools, markov, &config, None)
        })
        .collect()
}

/// Everything `generate` needs for one haiku.
pub struct GenerateRequest<'a> {
    pub pools: &'a VersePools,
    pub markov: Option<&'a MarkovEvaluator>,
    pub config: GaConfig,
    pub book: BookRef,
    pub chapter: ChapterRef,
    pub stop: Option<&'a StopSignal>,
}

/// Evolve and wrap the best chromosome as a haiku.
pub fn generate(request: &GenerateRequest<'_>) -> Result<HaikuAggregate> {
    let start = Instant::now();
    let result = Evolution::run(request.pools, request.markov, &request.config, request.stop)?;
    let best = result.best().ok_or(EngineError::InsufficientCorpus {
        five: request.pools.five.len(),
        seven: request.pools.seven.len(),
    })?;
    Ok(HaikuAggregate::from_chromosome(
        request.book.clone(),
        request.chapter.clone(),
        best,
        request.pools,
        request.config.cache_evaluations,
        start.elapsed(),
    )?)
}

/// A chromosome resolved back to text, with its score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedHaiku {
    pub id: String,
    pub verses: [String; 3],
    pub fitness: Option<f64>,
    pub metrics: Option<QualityMetrics>,
}

pub fn decode(chromosome: &Chromosome, pools: &VersePools) -> Result<DecodedHaiku> {
    Ok(DecodedHaiku {
        id: chromosome.id().to_string(),
        verses: chromosome.texts(pools)?,
        fitness: chromosome.fitness(),
        metrics: chromosome.metrics().cloned(),
    })
}
