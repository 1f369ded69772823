// Engine error types.
//
// `ValidationError` covers candidate-level rejections (bad verse, wrong
// syllable pattern, wrong verse count). Inside the GA loop these are
// recoverable: the offending candidate is discarded and resampled. Every
// other `EngineError` variant is fatal for the call that produced it and is
// propagated unmodified to the caller (CLI or API layer).

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a verse, chromosome, or haiku failed construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Verse text failed a content rule (blacklisted characters, bad start
    /// or end word, too long, ...).
    #[error("invalid verse {text:?}: {reason}")]
    InvalidVerse { text: String, reason: &'static str },

    /// Syllable counts do not match the required pattern.
    #[error("invalid syllable count: expected {expected:?}, got {actual:?}")]
    InvalidSyllableCount { expected: Vec<u32>, actual: Vec<u32> },

    /// A haiku must have exactly three verses.
    #[error("a haiku needs exactly 3 verses, got {0}")]
    InvalidVerseCount(usize),

    /// The same pool verse appears twice in one chromosome.
    #[error("verse {0} is used twice in one haiku")]
    DuplicateVerse(usize),

    /// A gene points outside its verse pool.
    #[error("gene {index} out of range for pool of {pool_len}")]
    GeneOutOfRange { index: usize, pool_len: usize },
}

/// Errors surfaced by training, scoring, and evolution.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The verse pools cannot produce a single valid chromosome.
    #[error(
        "insufficient corpus: need at least 2 five-syllable and 1 seven-syllable verse, \
         found {five} and {seven}"
    )]
    InsufficientCorpus { five: usize, seven: usize },

    /// A training worker failed or exited abnormally. The whole parallel run
    /// is rejected; retry it (or train sequentially).
    #[error("training worker failed: {0}")]
    Worker(String),

    /// Scoring was requested before any model was trained or loaded, and the
    /// evaluator is configured to fail in that case.
    #[error("markov model is not ready: train or load a model first")]
    ModelNotReady,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl EngineError {
    /// Candidate-level errors that the GA absorbs by resampling.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}
