// GA operators: selection, crossover, mutation.
//
// Each operator family is an enum and dispatch is a `match`, so the set of
// operators is closed and checked at compile time. The enums are serde
// `snake_case` (for config files) and `FromStr` (for CLI flags).
//
// Every stochastic choice draws from the caller's `SeededRandom`, in a fixed
// order, so identical seeds replay identical evolutions.
//
// Crossover works on whole verses (gene slots), never on text. A child that
// would use the same five-syllable verse twice is repaired by redrawing
// slot 2; if the redraws run out the child falls back to a parent clone.
// Operators never produce an invalid chromosome.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use gutenku_prng::SeededRandom;

use crate::chromosome::{Chromosome, ChromosomeFactory, MAX_SAMPLING_RETRIES};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Best of `tournament_size` uniform draws with replacement.
    #[default]
    Tournament,
    /// Fitness-proportional, shifted positive when needed.
    Roulette,
    /// Proportional to rank (worst = 1).
    Rank,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMethod {
    /// Swap every slot from a cut point in 1..=2 onward.
    #[default]
    SinglePoint,
    /// Swap each slot independently with probability 0.5.
    Uniform,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationMethod {
    /// Each slot, with probability `rate`, gets a fresh verse from its pool.
    #[default]
    RandomReset,
    /// With probability `rate`, swap the two five-syllable verses.
    Swap,
}

impl SelectionMethod {
    /// Index of the selected chromosome, or `None` for an empty population.
    pub fn select(
        self,
        population: &[Chromosome],
        tournament_size: usize,
        rng: &mut SeededRandom,
    ) -> Option<usize> {
        if population.is_empty() {
            return None;
        }
        Some(match self {
            SelectionMethod::Tournament => tournament(population, tournament_size, rng),
            SelectionMethod::Roulette => roulette(population, rng),
            SelectionMethod::Rank => rank(population, rng),
        })
    }
}

fn tournament(population: &[Chromosome], size: usize, rng: &mut SeededRandom) -> usize {
    let mut best = rng.next_int(0, population.len());
    for _ in 1..size.max(1) {
        let candidate = rng.next_int(0, population.len());
        if population[candidate].fitness_or_min() > population[best].fitness_or_min() {
            best = candidate;
        }
    }
    best
}

fn roulette(population: &[Chromosome], rng: &mut SeededRandom) -> usize {
    let fitness: Vec<f64> = population
        .iter()
        .map(|c| c.fitness().unwrap_or(0.0))
        .collect();
    let min = fitness.iter().copied().fold(f64::INFINITY, f64::min);
    let shift = if min <= 0.0 { min.abs() + 1.0 } else { 0.0 };
    let total: f64 = fitness.iter().map(|f| f + shift).sum();
    let spin = rng.next_f64() * total;
    let mut cumulative = 0.0;
    for (i, f) in fitness.iter().enumerate() {
        cumulative += f + shift;
        if cumulative >= spin {
            return i;
        }
    }
    population.len() - 1
}

fn rank(population: &[Chromosome], rng: &mut SeededRandom) -> usize {
    let mut order: Vec<usize> = (0..population.len()).collect();
    order.sort_by(|&a, &b| {
        population[a]
            .fitness_or_min()
            .total_cmp(&population[b].fitness_or_min())
    });
    let n = order.len() as f64;
    let spin = rng.next_f64() * n * (n + 1.0) / 2.0;
    let mut cumulative = 0.0;
    for (rank, &index) in order.iter().enumerate() {
        cumulative += (rank + 1) as f64;
        if cumulative >= spin {
            return index;
        }
    }
    order[order.len() - 1]
}

impl CrossoverMethod {
    /// Recombine two parents into two children born in `generation`.
    ///
    /// With probability `1 - rate` no crossover happens and the children are
    /// clones of the parents.
    pub fn crossover(
        self,
        parents: (&Chromosome, &Chromosome),
        rate: f64,
        generation: u32,
        factory: &ChromosomeFactory<'_>,
        rng: &mut SeededRandom,
    ) -> (Chromosome, Chromosome) {
        let (p1, p2) = parents;
        if rng.next_f64() > rate {
            return (p1.cloned_for(generation), p2.cloned_for(generation));
        }

        let (a, b) = (p1.genes(), p2.genes());
        let (mut g1, mut g2) = (a, b);
        match self {
            CrossoverMethod::SinglePoint => {
                let cut = rng.next_int(1, 3);
                for i in cut..3 {
                    g1[i] = b[i];
                    g2[i] = a[i];
                }
            }
            CrossoverMethod::Uniform => {
                for i in 0..3 {
                    if rng.next_bool(0.5) {
                        g1[i] = b[i];
                        g2[i] = a[i];
                    }
                }
            }
        }

        let c1 = build_child(g1, generation, parents, p1, factory, rng);
        let c2 = build_child(g2, generation, (p2, p1), p2, factory, rng);
        (c1, c2)
    }
}

/// Repair and validate a child, falling back to a clone of `fallback`.
fn build_child(
    mut genes: [usize; 3],
    generation: u32,
    parents: (&Chromosome, &Chromosome),
    fallback: &Chromosome,
    factory: &ChromosomeFactory<'_>,
    rng: &mut SeededRandom,
) -> Chromosome {
    if genes[0] == genes[2] {
        match redraw_distinct_five(genes[0], factory, rng) {
            Some(five) => genes[2] = five,
            None => {
                warn!(genes = ?genes, "crossover repair exhausted, cloning parent");
                return fallback.cloned_for(generation);
            }
        }
    }
    Chromosome::offspring(genes, generation, parents, factory.pools())
        .unwrap_or_else(|_| fallback.cloned_for(generation))
}

/// A five-syllable gene different from `other`, if one turns up within the
/// retry budget.
fn redraw_distinct_five(
    other: usize,
    factory: &ChromosomeFactory<'_>,
    rng: &mut SeededRandom,
) -> Option<usize> {
    (0..MAX_SAMPLING_RETRIES)
        .map(|_| factory.random_five(rng))
        .find(|&five| five != other)
}

impl MutationMethod {
    /// Possibly mutate `child`. A changed child loses its fitness; an
    /// unchanged one is returned as is.
    pub fn mutate(
        self,
        child: Chromosome,
        rate: f64,
        factory: &ChromosomeFactory<'_>,
        rng: &mut SeededRandom,
    ) -> Chromosome {
        let original = child.genes();
        let mut genes = original;
        match self {
            MutationMethod::RandomReset => {
                for slot in 0..3 {
                    if !rng.next_bool(rate) {
                        continue;
                    }
                    if slot == 1 {
                        genes[1] = factory.random_seven(rng);
                    } else if let Some(five) = redraw_distinct_five(genes[2 - slot], factory, rng)
                    {
                        genes[slot] = five;
                    }
                }
            }
            MutationMethod::Swap => {
                if rng.next_bool(rate) {
                    genes.swap(0, 2);
                }
            }
        }

        if genes == original {
            return child;
        }
        child.with_genes(genes, factory.pools()).unwrap_or(child)
    }
}

macro_rules! method_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = EngineError;

            /// Accepts `snake_case` or `kebab-case`, any letter case.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|m| m.name() == wanted)
                    .ok_or_else(|| {
                        let names: Vec<&str> = $ty::ALL.iter().map(|m| m.name()).collect();
                        EngineError::InvalidConfig(format!(
                            "unknown {} {s:?}, expected one of: {}",
                            stringify!($ty),
                            names.join(", ")
                        ))
                    })
            }
        }
    };
}

method_names!(SelectionMethod {
    Tournament => "tournament",
    Roulette => "roulette",
    Rank => "rank",
});
method_names!(CrossoverMethod {
    SinglePoint => "single_point",
    Uniform => "uniform",
});
method_names!(MutationMethod {
    RandomReset => "random_reset",
    Swap => "swap",
});
