// GA individual: a candidate haiku encoded as three pool indices.
//
// Genes are `[five, seven, five]` indices into `VersePools`. Construction is
// the only way in and it enforces the haiku invariant: genes in range, the
// two five-syllable slots holding different verses, and the looked-up verses
// counting exactly [5, 7, 5] syllables. Anything else is a
// `ValidationError`, never a silently repaired chromosome.
//
// `ChromosomeFactory` draws random individuals through `SeededRandom`,
// resampling a bounded number of times before giving up with
// `InsufficientCorpus`.

use serde::{Deserialize, Serialize};

use gutenku_prng::SeededRandom;

use crate::error::{EngineError, Result, ValidationError};
use crate::fitness::QualityMetrics;
use crate::verse::{Verse, VersePools};

/// Required syllables per line.
pub const HAIKU_PATTERN: [u32; 3] = [5, 7, 5];

/// Random draws attempted before sampling gives up on the pools.
pub const MAX_SAMPLING_RETRIES: usize = 100;

/// Check a syllable sequence against the 5-7-5 pattern.
pub fn validate_pattern(actual: &[u32]) -> std::result::Result<(), ValidationError> {
    if actual.len() != HAIKU_PATTERN.len() {
        return Err(ValidationError::InvalidVerseCount(actual.len()));
    }
    if actual != HAIKU_PATTERN {
        return Err(ValidationError::InvalidSyllableCount {
            expected: HAIKU_PATTERN.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

/// One candidate haiku.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    genes: [usize; 3],
    id: String,
    fitness: Option<f64>,
    metrics: Option<QualityMetrics>,
    generation: u32,
    parent_ids: Option<(String, String)>,
}

impl Chromosome {
    /// Build a chromosome, validating it against the pools.
    pub fn new(
        genes: [usize; 3],
        generation: u32,
        pools: &VersePools,
    ) -> std::result::Result<Self, ValidationError> {
        if genes[0] == genes[2] {
            return Err(ValidationError::DuplicateVerse(genes[0]));
        }
        let verses = lookup(genes, pools)?;
        validate_pattern(&verses.map(Verse::syllables))?;
        Ok(Chromosome {
            genes,
            id: gene_id(genes),
            fitness: None,
            metrics: None,
            generation,
            parent_ids: None,
        })
    }

    /// Build an offspring with recorded parents.
    pub fn offspring(
        genes: [usize; 3],
        generation: u32,
        parents: (&Chromosome, &Chromosome),
        pools: &VersePools,
    ) -> std::result::Result<Self, ValidationError> {
        let mut child = Chromosome::new(genes, generation, pools)?;
        child.parent_ids = Some((parents.0.id.clone(), parents.1.id.clone()));
        Ok(child)
    }

    /// Same lineage, new genes. Fitness and metrics start over.
    pub fn with_genes(
        &self,
        genes: [usize; 3],
        pools: &VersePools,
    ) -> std::result::Result<Self, ValidationError> {
        let mut child = Chromosome::new(genes, self.generation, pools)?;
        child.parent_ids = self.parent_ids.clone();
        Ok(child)
    }

    /// Carry this individual into `generation` unchanged (elitism, or a
    /// crossover that did not fire). Fitness and metrics are kept.
    pub fn cloned_for(&self, generation: u32) -> Self {
        Chromosome {
            generation,
            parent_ids: Some((self.id.clone(), self.id.clone())),
            ..self.clone()
        }
    }

    pub fn genes(&self) -> [usize; 3] {
        self.genes
    }

    /// `"g0-g1-g2"`, identical for identical genes.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fitness, or `None` before evaluation.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Fitness for ranking; unevaluated chromosomes rank last.
    pub fn fitness_or_min(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }

    pub fn metrics(&self) -> Option<&QualityMetrics> {
        self.metrics.as_ref()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn parent_ids(&self) -> Option<(&str, &str)> {
        self.parent_ids
            .as_ref()
            .map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn is_evaluated(&self) -> bool {
        self.metrics.is_some()
    }

    /// Attach evaluation results. Metrics are set once; later calls on an
    /// evaluated chromosome are ignored.
    pub(crate) fn attach_evaluation(&mut self, metrics: QualityMetrics, fitness: f64) {
        if self.metrics.is_none() {
            self.metrics = Some(metrics);
            self.fitness = Some(fitness);
        }
    }

    /// The three verses this chromosome encodes.
    pub fn verses<'p>(
        &self,
        pools: &'p VersePools,
    ) -> std::result::Result<[&'p Verse; 3], ValidationError> {
        lookup(self.genes, pools)
    }

    /// Display text of the three verses.
    pub fn texts(&self, pools: &VersePools) -> std::result::Result<[String; 3], ValidationError> {
        Ok(self.verses(pools)?.map(|v| v.cleaned_text().to_string()))
    }
}

fn gene_id(genes: [usize; 3]) -> String {
    format!("{}-{}-{}", genes[0], genes[1], genes[2])
}

fn lookup(
    genes: [usize; 3],
    pools: &VersePools,
) -> std::result::Result<[&Verse; 3], ValidationError> {
    Ok([
        pool_get(&pools.five, genes[0])?,
        pool_get(&pools.seven, genes[1])?,
        pool_get(&pools.five, genes[2])?,
    ])
}

fn pool_get(pool: &[Verse], index: usize) -> std::result::Result<&Verse, ValidationError> {
    pool.get(index).ok_or(ValidationError::GeneOutOfRange {
        index,
        pool_len: pool.len(),
    })
}

/// Draws random chromosomes from a fixed set of pools.
pub struct ChromosomeFactory<'p> {
    pools: &'p VersePools,
}

impl<'p> ChromosomeFactory<'p> {
    /// Fails with `InsufficientCorpus` if the pools cannot form a haiku.
    pub fn new(pools: &'p VersePools) -> Result<Self> {
        pools.ensure_viable()?;
        Ok(ChromosomeFactory { pools })
    }

    pub fn pools(&self) -> &'p VersePools {
        self.pools
    }

    /// Random five-syllable gene.
    pub fn random_five(&self, rng: &mut SeededRandom) -> usize {
        rng.next_int(0, self.pools.five.len())
    }

    /// Random seven-syllable gene.
    pub fn random_seven(&self, rng: &mut SeededRandom) -> usize {
        rng.next_int(0, self.pools.seven.len())
    }

    /// Draw a valid chromosome, resampling rejected draws up to
    /// `MAX_SAMPLING_RETRIES` times.
    pub fn random(&self, generation: u32, rng: &mut SeededRandom) -> Result<Chromosome> {
        for _ in 0..MAX_SAMPLING_RETRIES {
            let genes = [
                self.random_five(rng),
                self.random_seven(rng),
                self.random_five(rng),
            ];
            if let Ok(chromosome) = Chromosome::new(genes, generation, self.pools) {
                return Ok(chromosome);
            }
        }
        Err(EngineError::InsufficientCorpus {
            five: self.pools.five.len(),
            seven: self.pools.seven.len(),
        })
    }

    /// Draw `size` chromosomes.
    pub fn population(
        &self,
        size: usize,
        generation: u32,
        rng: &mut SeededRandom,
    ) -> Result<Vec<Chromosome>> {
        (0..size).map(|_| self.random(generation, rng)).collect()
    }
}
