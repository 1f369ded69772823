// Markov "flow" scoring against a trained model.
//
// `MarkovEvaluator` owns an optional `MarkovModel`. Until a model has been
// trained, imported, or loaded the evaluator is not ready, and what scoring
// does then is an explicit `ModelNotReadyPolicy`: `Neutral` scores every
// flow as 0.0, `Fail` returns `EngineError::ModelNotReady`.
//
// Scoring tokenizes exactly as training does (`markov::transition_tokens`)
// over the joined verses, so transitions across verse boundaries count too.
// Each transition contributes `count / total` for its context, 0 when the
// context or next word was never seen. A flow is the mean over all
// transitions scaled by 10, so it lands in [0, 10].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::markov::{MarkovModel, ModelStats, transition_tokens};

/// Scale applied to the mean transition probability.
pub const FLOW_SCALE: f64 = 10.0;

/// What scoring does before a model is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelNotReadyPolicy {
    /// Every flow scores 0.0.
    #[default]
    Neutral,
    /// Scoring fails with `ModelNotReady`.
    Fail,
}

#[derive(Debug, Clone, Default)]
pub struct MarkovEvaluator {
    model: Option<MarkovModel>,
    policy: ModelNotReadyPolicy,
}

impl MarkovEvaluator {
    /// An evaluator with no model yet.
    pub fn new(policy: ModelNotReadyPolicy) -> Self {
        MarkovEvaluator {
            model: None,
            policy,
        }
    }

    pub fn with_model(model: MarkovModel, policy: ModelNotReadyPolicy) -> Self {
        MarkovEvaluator {
            model: Some(model),
            policy,
        }
    }

    /// Load a model saved by `save`.
    pub fn load(path: &Path, policy: ModelNotReadyPolicy) -> Result<Self> {
        Ok(Self::with_model(MarkovModel::load(path)?, policy))
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn policy(&self) -> ModelNotReadyPolicy {
        self.policy
    }

    pub fn model(&self) -> Option<&MarkovModel> {
        self.model.as_ref()
    }

    /// Train incrementally on one more text.
    pub fn train(&mut self, text: &str) {
        self.model.get_or_insert_with(MarkovModel::new).train_text(text);
    }

    /// Replace the model with a pre-merged one (e.g. from `ParallelTrainer`).
    pub fn import_training_data(&mut self, model: MarkovModel) {
        self.model = Some(model);
    }

    /// Persist the current model. Fails with `ModelNotReady` if there is none.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.model
            .as_ref()
            .ok_or(EngineError::ModelNotReady)?
            .save(path)
    }

    pub fn stats(&self) -> Option<ModelStats> {
        self.model.as_ref().map(MarkovModel::stats)
    }

    /// Scaled mean bigram probability across the joined verses.
    pub fn bigram_flow<S: AsRef<str>>(&self, verses: &[S]) -> Result<f64> {
        let Some(model) = self.ready_model()? else {
            return Ok(0.0);
        };
        let tokens = joined_tokens(verses);
        Ok(mean_flow(tokens.windows(2).map(|w| {
            probability(model.bigram_count(&w[0], &w[1]))
        })))
    }

    /// Scaled mean trigram probability across the joined verses.
    pub fn trigram_flow<S: AsRef<str>>(&self, verses: &[S]) -> Result<f64> {
        let Some(model) = self.ready_model()? else {
            return Ok(0.0);
        };
        let tokens = joined_tokens(verses);
        Ok(mean_flow(tokens.windows(3).map(|w| {
            probability(model.trigram_count(&w[0], &w[1], &w[2]))
        })))
    }

    /// Probability that the last word of `from` is followed by the first
    /// word of `to`. Unscaled, in [0, 1].
    pub fn evaluate_transition(&self, from: &str, to: &str) -> Result<f64> {
        let Some(model) = self.ready_model()? else {
            return Ok(0.0);
        };
        let last = transition_tokens(from).pop();
        let first = transition_tokens(to).into_iter().next();
        Ok(match (last, first) {
            (Some(last), Some(first)) => probability(model.bigram_count(&last, &first)),
            _ => 0.0,
        })
    }

    /// The model, `None` under the neutral policy, or an error under `Fail`.
    fn ready_model(&self) -> Result<Option<&MarkovModel>> {
        match (&self.model, self.policy) {
            (Some(model), _) => Ok(Some(model)),
            (None, ModelNotReadyPolicy::Neutral) => Ok(None),
            (None, ModelNotReadyPolicy::Fail) => Err(EngineError::ModelNotReady),
        }
    }
}

fn joined_tokens<S: AsRef<str>>(verses: &[S]) -> Vec<String> {
    let joined: Vec<&str> = verses.iter().map(AsRef::as_ref).collect();
    transition_tokens(&joined.join(" "))
}

fn probability((count, total): (u64, u64)) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn mean_flow(probabilities: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = probabilities.fold((0.0, 0usize), |(sum, n), p| (sum + p, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64 * FLOW_SCALE
    }
}
