// GA run configuration.
//
// One explicit struct threaded through every call; the engine has no global
// configuration state. Every field has a documented default and the whole
// struct is `#[serde(default)]`, so a JSON config file only needs the keys it
// overrides. `sanitized()` clamps out-of-range values instead of failing,
// which is what the CLI applies after merging its flags.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::fitness::{FitnessWeights, HardThresholds};
use crate::operators::{CrossoverMethod, MutationMethod, SelectionMethod};
use crate::trainer::default_worker_count;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Chromosomes per generation. Constant across generations.
    pub population_size: usize,
    /// Best chromosomes copied unchanged into the next generation.
    pub elitism_count: usize,
    pub max_generations: u32,
    /// Mean per-generation best-fitness improvement below which the run
    /// counts as converged.
    pub convergence_threshold: f64,
    /// Generations averaged by the convergence check.
    pub convergence_window: usize,
    /// Stop on convergence. Off for exhaustive runs.
    pub early_stop: bool,
    pub selection: SelectionMethod,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub crossover: CrossoverMethod,
    pub mutation_rate: f64,
    pub mutation: MutationMethod,
    /// Memoize metrics by chromosome id.
    pub cache_evaluations: bool,
    /// Distinct chromosomes returned from a run.
    pub return_count: usize,
    pub record_history: bool,
    /// `None` derives the seed from the verse pools.
    pub seed: Option<u32>,
    /// Metric computations after which the run stops early. Only enforced
    /// with `early_stop`; `None` removes the budget.
    pub max_evaluations: Option<u64>,
    /// Markov training threads. `None` uses the available parallelism.
    pub worker_count: Option<usize>,
    /// Share of distinct chromosomes below which fresh ones are injected.
    pub min_diversity: f64,
    pub weights: FitnessWeights,
    pub thresholds: Option<HardThresholds>,
}

impl Default for GaConfig {
    fn default() -> Self {
        GaConfig {
            population_size: 150,
            elitism_count: 6,
            max_generations: 500,
            convergence_threshold: 0.005,
            convergence_window: 30,
            early_stop: true,
            selection: SelectionMethod::Tournament,
            tournament_size: 7,
            crossover_rate: 0.9,
            crossover: CrossoverMethod::SinglePoint,
            mutation_rate: 0.12,
            mutation: MutationMethod::RandomReset,
            cache_evaluations: true,
            return_count: 5,
            record_history: true,
            seed: None,
            max_evaluations: Some(50_000),
            worker_count: None,
            min_diversity: 0.08,
            weights: FitnessWeights::default(),
            thresholds: None,
        }
    }
}

impl GaConfig {
    /// Read a (partial) config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| {
            EngineError::InvalidConfig(format!("{}: {e}", path.display()))
        })
    }

    /// Copy with every field clamped into its valid range.
    pub fn sanitized(&self) -> Self {
        let defaults = GaConfig::default();
        let population_size = self.population_size.max(2);
        GaConfig {
            population_size,
            elitism_count: self.elitism_count.min(population_size - 1),
            convergence_threshold: finite_or(self.convergence_threshold, defaults.convergence_threshold)
                .max(0.0),
            convergence_window: self.convergence_window.max(1),
            tournament_size: self.tournament_size.max(1),
            crossover_rate: clamp_rate(self.crossover_rate, defaults.crossover_rate),
            mutation_rate: clamp_rate(self.mutation_rate, defaults.mutation_rate),
            return_count: self.return_count.max(1),
            min_diversity: clamp_rate(self.min_diversity, defaults.min_diversity),
            worker_count: self.worker_count.map(|n| n.max(1)),
            ..self.clone()
        }
    }

    /// Training threads this config asks for.
    pub fn workers(&self) -> usize {
        self.worker_count.unwrap_or_else(default_worker_count).max(1)
    }

    /// The evaluation cap that applies to a run, if any.
    pub fn evaluation_budget(&self) -> Option<u64> {
        if self.early_stop { self.max_evaluations } else { None }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

fn clamp_rate(value: f64, fallback: f64) -> f64 {
    finite_or(value, fallback).clamp(0.0, 1.0)
}
