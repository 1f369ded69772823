// GutenKu haiku engine
//
// Composes 5-7-5 haiku from real sentences in public-domain books. Clauses
// extracted from chapters form five- and seven-syllable verse pools; a
// genetic algorithm searches over verse triples, scored by rule-based
// linguistic metrics blended with a bigram/trigram Markov model trained on
// the same corpus.
//
// Architecture:
// - error.rs: ValidationError (recoverable, candidate-level) and EngineError
// - corpus.rs: Chapter input and plain-text loading for the CLI
// - verse.rs: Verse validation and five/seven-syllable pool extraction
// - chromosome.rs: GA individual (three pool indices) + random factory
// - markov.rs: N-gram count model, merge, wire encoding, JSON persistence
// - trainer.rs: Parallel (OS threads, mpsc) and sequential Markov training
// - evaluator.rs: Markov flow scoring with an explicit not-ready policy
// - fitness.rs: Quality metrics, weights, memoized fitness evaluation
// - operators.rs: Selection / crossover / mutation enums
// - config.rs: GaConfig with defaults and clamping
// - population.rs: PopulationManager (one generation step, stats, convergence)
// - evolution.rs: Run orchestration, stop signal, batch runs, generate/decode
// - haiku.rs: HaikuAggregate and its DTO
//
// Every stochastic choice goes through `gutenku_prng::SeededRandom`, so a
// run is a pure function of pools, model, and config (including the seed).

pub mod chromosome;
pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluator;
pub mod evolution;
pub mod fitness;
pub mod haiku;
pub mod markov;
pub mod operators;
pub mod population;
pub mod trainer;
pub mod verse;

pub use chromosome::{Chromosome, ChromosomeFactory};
pub use config::GaConfig;
pub use corpus::Chapter;
pub use error::{EngineError, Result, ValidationError};
pub use evaluator::{MarkovEvaluator, ModelNotReadyPolicy};
pub use evolution::{
    DecodedHaiku, Evolution, EvolutionResult, GenerateRequest, StopReason, StopSignal, decode,
    generate, run_batch,
};
pub use fitness::{FitnessEvaluator, FitnessWeights, QualityMetrics};
pub use haiku::{BookRef, ChapterRef, HaikuAggregate};
pub use markov::MarkovModel;
pub use trainer::ParallelTrainer;
pub use verse::{Verse, VersePools};
