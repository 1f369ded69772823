// One evolving population and its per-generation bookkeeping.
//
// `PopulationManager` owns everything that changes during a run: the
// current generation, the PRNG stream, the fitness evaluator (and its
// cache), and the stats history. It borrows the verse pools and the Markov
// evaluator, which stay read-only for the whole run.
//
// Generation step (`evolve`):
//   1. Elitism: the top `elitism_count` chromosomes are carried over with
//      their fitness, so best fitness never decreases.
//   2. Until the next generation is full: select two parents, cross them
//      over, mutate both children, push child 1, push child 2 if room.
//   3. If diversity (share of distinct ids) fell below `min_diversity`,
//      duplicates outside the elite are replaced with fresh random
//      chromosomes.
//   4. Evaluate everything new and sort by fitness, best first.
//
// Population size is constant: replacement, never growth.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gutenku_prng::SeededRandom;

use crate::chromosome::{Chromosome, ChromosomeFactory, MAX_SAMPLING_RETRIES};
use crate::config::GaConfig;
use crate::error::Result;
use crate::evaluator::MarkovEvaluator;
use crate::fitness::FitnessEvaluator;
use crate::verse::VersePools;

/// Fitness summary of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    pub best: f64,
    pub worst: f64,
    pub average: f64,
    pub median: f64,
    pub std_dev: f64,
    /// Distinct chromosome ids / population size.
    pub diversity: f64,
}

impl GenerationStats {
    /// Stats of an evaluated population. Unevaluated chromosomes are ignored.
    pub fn of(generation: u32, population: &[Chromosome]) -> Self {
        let mut fitness: Vec<f64> = population.iter().filter_map(Chromosome::fitness).collect();
        fitness.sort_by(f64::total_cmp);
        let n = fitness.len();
        if n == 0 {
            return GenerationStats {
                generation,
                best: 0.0,
                worst: 0.0,
                average: 0.0,
                median: 0.0,
                std_dev: 0.0,
                diversity: diversity(population),
            };
        }
        let average = fitness.iter().sum::<f64>() / n as f64;
        let variance = fitness.iter().map(|f| (f - average).powi(2)).sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (fitness[n / 2 - 1] + fitness[n / 2]) / 2.0
        } else {
            fitness[n / 2]
        };
        GenerationStats {
            generation,
            best: fitness[n - 1],
            worst: fitness[0],
            average,
            median,
            std_dev: variance.sqrt(),
            diversity: diversity(population),
        }
    }
}

/// Share of distinct chromosome ids.
pub fn diversity(population: &[Chromosome]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let distinct: FxHashSet<&str> = population.iter().map(Chromosome::id).collect();
    distinct.len() as f64 / population.len() as f64
}

pub struct PopulationManager<'p, 'm> {
    config: GaConfig,
    pools: &'p VersePools,
    factory: ChromosomeFactory<'p>,
    evaluator: FitnessEvaluator<'m>,
    rng: SeededRandom,
    population: Vec<Chromosome>,
    generation: u32,
    history: Vec<GenerationStats>,
}

impl<'p, 'm> PopulationManager<'p, 'm> {
    /// Fails with `InsufficientCorpus` if the pools cannot form a haiku.
    pub fn new(
        pools: &'p VersePools,
        markov: Option<&'m MarkovEvaluator>,
        config: &GaConfig,
        seed: u32,
    ) -> Result<Self> {
        let config = config.sanitized();
        let mut evaluator =
            FitnessEvaluator::new(config.weights.clone()).with_cache(config.cache_evaluations);
        if let Some(markov) = markov {
            evaluator = evaluator.with_markov(markov);
        }
        if let Some(thresholds) = &config.thresholds {
            evaluator = evaluator.with_thresholds(thresholds.clone());
        }
        Ok(PopulationManager {
            factory: ChromosomeFactory::new(pools)?,
            pools,
            evaluator,
            rng: SeededRandom::new(seed),
            population: Vec::new(),
            generation: 0,
            history: Vec::new(),
            config,
        })
    }

    /// Sample and evaluate generation 0.
    pub fn initialize(&mut self) -> Result<()> {
        self.generation = 0;
        self.history.clear();
        self.population =
            self.factory
                .population(self.config.population_size, 0, &mut self.rng)?;
        self.evaluate_all()?;
        self.record_stats();
        Ok(())
    }

    /// Produce, evaluate, and record the next generation.
    pub fn evolve(&mut self) -> Result<()> {
        let next_gen = self.generation + 1;
        let size = self.config.population_size;
        let elites = self.config.elitism_count.min(self.population.len());

        let mut next: Vec<Chromosome> = Vec::with_capacity(size);
        next.extend(self.population[..elites].iter().map(|c| c.cloned_for(next_gen)));

        while next.len() < size {
            let (Some(i), Some(j)) = (
                self.select_parent(),
                self.select_parent(),
            ) else {
                break;
            };
            let (c1, c2) = self.config.crossover.crossover(
                (&self.population[i], &self.population[j]),
                self.config.crossover_rate,
                next_gen,
                &self.factory,
                &mut self.rng,
            );
            let c1 = self
                .config
                .mutation
                .mutate(c1, self.config.mutation_rate, &self.factory, &mut self.rng);
            let c2 = self
                .config
                .mutation
                .mutate(c2, self.config.mutation_rate, &self.factory, &mut self.rng);
            next.push(c1);
            if next.len() < size {
                next.push(c2);
            }
        }

        self.population = next;
        self.generation = next_gen;
        self.inject_diversity(elites)?;
        self.evaluate_all()?;
        self.record_stats();
        Ok(())
    }

    fn select_parent(&mut self) -> Option<usize> {
        self.config
            .selection
            .select(&self.population, self.config.tournament_size, &mut self.rng)
    }

    /// Replace non-elite duplicates with fresh chromosomes when diversity
    /// has collapsed.
    fn inject_diversity(&mut self, elites: usize) -> Result<()> {
        let before = diversity(&self.population);
        if before >= self.config.min_diversity {
            return Ok(());
        }
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut injected = 0;
        for i in 0..self.population.len() {
            if seen.insert(self.population[i].id().to_string()) || i < elites {
                continue;
            }
            let fresh = self.factory.random(self.generation, &mut self.rng)?;
            seen.insert(fresh.id().to_string());
            self.population[i] = fresh;
            injected += 1;
        }
        debug!(
            generation = self.generation,
            before,
            after = diversity(&self.population),
            injected,
            "diversity injection"
        );
        Ok(())
    }

    /// Evaluate every chromosome, resampling ones that fail validation, then
    /// sort best first.
    fn evaluate_all(&mut self) -> Result<()> {
        for i in 0..self.population.len() {
            let mut attempts = 0;
            loop {
                match self.evaluator.evaluate(&mut self.population[i], self.pools) {
                    Ok(_) => break,
                    Err(e) if e.is_recoverable() && attempts < MAX_SAMPLING_RETRIES => {
                        attempts += 1;
                        warn!(error = %e, "discarding invalid chromosome");
                        self.population[i] = self.factory.random(self.generation, &mut self.rng)?;
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        // Stable: equal fitness keeps insertion order, so runs replay exactly.
        self.population
            .sort_by(|a, b| b.fitness_or_min().total_cmp(&a.fitness_or_min()));
        Ok(())
    }

    fn record_stats(&mut self) {
        let stats = GenerationStats::of(self.generation, &self.population);
        debug!(
            generation = stats.generation,
            best = stats.best,
            average = stats.average,
            std_dev = stats.std_dev,
            diversity = stats.diversity,
            "generation evaluated"
        );
        self.history.push(stats);
    }

    /// True when the best fitness improved by less than
    /// `convergence_threshold` per generation, on average, over the last
    /// `convergence_window` generations.
    pub fn has_converged(&self) -> bool {
        let window = self.config.convergence_window;
        if self.history.len() <= window {
            return false;
        }
        let recent = &self.history[self.history.len() - window - 1..];
        let improvement: f64 = recent.windows(2).map(|w| w[1].best - w[0].best).sum();
        improvement / (window as f64) < self.config.convergence_threshold
    }

    /// Up to `k` chromosomes with distinct ids, best first.
    pub fn top(&self, k: usize) -> Vec<Chromosome> {
        let mut seen = FxHashSet::default();
        self.population
            .iter()
            .filter(|c| seen.insert(c.id()))
            .take(k)
            .cloned()
            .collect()
    }

    pub fn best(&self) -> Option<&Chromosome> {
        self.population.first()
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    /// Generations evolved since `initialize` (0 right after it).
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Metric computations so far (cache hits excluded).
    pub fn evaluations(&self) -> u64 {
        self.evaluator.evaluations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pools() -> VersePools {
        VersePools::from_texts(
            &[
                "An old silent pond",
                "The wind in the pines",
                "Cold rain on the hill",
                "Dreams of the old pond",
            ],
            &["A frog jumps into the pond", "The moon shines over the hill"],
        )
        .unwrap()
    }

    fn config() -> GaConfig {
        GaConfig {
            population_size: 20,
            elitism_count: 2,
            ..GaConfig::default()
        }
    }

    #[test]
    fn stats_of_known_fitness() {
        let pools = pools();
        let mut population = Vec::new();
        for (genes, fitness) in [([0, 0, 1], 1.0), ([1, 0, 2], 3.0), ([2, 1, 3], 2.0), ([0, 0, 1], 6.0)] {
            let mut c = Chromosome::new(genes, 0, &pools).unwrap();
            c.attach_evaluation(Default::default(), fitness);
            population.push(c);
        }
        let stats = GenerationStats::of(7, &population);
        assert_eq!(stats.generation, 7);
        assert_eq!(stats.best, 6.0);
        assert_eq!(stats.worst, 1.0);
        assert_eq!(stats.average, 3.0);
        assert_eq!(stats.median, 2.5);
        assert!((stats.std_dev - 3.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.diversity, 0.75);
    }

    #[test]
    fn size_is_constant_and_sorted() {
        let pools = pools();
        let mut manager = PopulationManager::new(&pools, None, &config(), 42).unwrap();
        manager.initialize().unwrap();
        for _ in 0..5 {
            manager.evolve().unwrap();
            let population = manager.population();
            assert_eq!(population.len(), 20);
            assert!(population.iter().all(Chromosome::is_evaluated));
            for pair in population.windows(2) {
                assert!(pair[0].fitness_or_min() >= pair[1].fitness_or_min());
            }
        }
        assert_eq!(manager.generation(), 5);
        assert_eq!(manager.history().len(), 6);
    }

    #[test]
    fn elitism_keeps_best_monotonic() {
        let pools = pools();
        let mut manager = PopulationManager::new(&pools, None, &config(), 7).unwrap();
        manager.initialize().unwrap();
        for _ in 0..10 {
            manager.evolve().unwrap();
        }
        for pair in manager.history().windows(2) {
            assert!(pair[1].best >= pair[0].best, "{pair:?}");
        }
    }

    #[test]
    fn top_returns_distinct_ids() {
        let pools = pools();
        let mut manager = PopulationManager::new(&pools, None, &config(), 3).unwrap();
        manager.initialize().unwrap();
        let top = manager.top(5);
        assert!(top.len() <= 5);
        let ids: FxHashSet<&str> = top.iter().map(Chromosome::id).collect();
        assert_eq!(ids.len(), top.len());
        assert_eq!(top[0].id(), manager.best().unwrap().id());
    }

    #[test]
    fn convergence_needs_a_full_flat_window() {
        let pools = pools();
        let config = GaConfig {
            convergence_window: 3,
            ..config()
        };
        let mut manager = PopulationManager::new(&pools, None, &config, 1).unwrap();
        manager.initialize().unwrap();
        assert!(!manager.has_converged());
        manager.history = (0..4)
            .map(|g| GenerationStats {
                generation: g,
                best: 5.0,
                worst: 0.0,
                average: 1.0,
                median: 1.0,
                std_dev: 0.0,
                diversity: 1.0,
            })
            .collect();
        assert!(manager.has_converged());
        manager.history[3].best = 6.0;
        assert!(!manager.has_converged());
    }

    #[test]
    fn insufficient_pools_fail_fast() {
        let pools =
            VersePools::from_texts(&["An old silent pond"], &["A frog jumps into the pond"])
                .unwrap();
        assert!(PopulationManager::new(&pools, None, &config(), 1).is_err());
    }
}
