//! Feature-group selection.
//!
//! Groups are scored by a full cross-validation run on the corpus restricted
//! to them. `greedy` grows or shrinks a selection one group at a time;
//! `ranking` scores groups individually.
pub mod greedy;
pub mod ranking;

use crate::data_handling::Corpus;
use crate::error::Result;
use crate::experiment::{precision_for_configuration, EvaluationConfig};
use crate::strategy::PredictionStrategy;

/// Scores a subset of feature groups; higher is better.
pub trait SubsetScorer: Sync {
    fn score(&self, groups: &[String]) -> Result<f64>;
}

/// Accuracy of a strategy under a fixed evaluation configuration.
pub struct CrossValidationScorer<'a, S: ?Sized> {
    corpus: &'a Corpus,
    strategy: &'a S,
    config: &'a EvaluationConfig,
}

impl<'a, S> CrossValidationScorer<'a, S>
where
    S: PredictionStrategy + ?Sized,
{
    pub fn new(corpus: &'a Corpus, strategy: &'a S, config: &'a EvaluationConfig) -> Self {
        Self {
            corpus,
            strategy,
            config,
        }
    }
}

impl<'a, S> SubsetScorer for CrossValidationScorer<'a, S>
where
    S: PredictionStrategy + ?Sized,
{
    fn score(&self, groups: &[String]) -> Result<f64> {
        let precision =
            precision_for_configuration(self.corpus, self.strategy, Some(groups), self.config)?;
        log::debug!("[{}] -> {:.4}", groups.join(", "), precision);
        Ok(precision)
    }
}
