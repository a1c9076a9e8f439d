//! Runs a prediction strategy over every split of an experiment.
//!
//! Splits are independent, so they are evaluated in parallel; results are
//! concatenated in split order.
use rayon::prelude::*;

use crate::data_handling::Split;
use crate::error::Result;
use crate::strategy::PredictionStrategy;

/// Predicted labels and ground truth, index for index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrossValidation {
    pub predictions: Vec<String>,
    pub truth: Vec<String>,
}

/// Hard-label predictions for every held-out document of every split.
pub fn cross_validate<S>(splits: &[Split], strategy: &S) -> Result<CrossValidation>
where
    S: PredictionStrategy + ?Sized,
{
    let per_split: Vec<Vec<String>> = splits
        .par_iter()
        .map(|split| strategy.predict(&split.train, &split.held_out.features))
        .collect::<Result<_>>()?;

    let mut result = CrossValidation::default();
    for (split, predictions) in splits.iter().zip(per_split) {
        result.predictions.extend(predictions);
        result.truth.extend(split.held_out.labels.iter().cloned());
    }
    log::debug!(
        "{}: cross-validated {} splits, {} predictions",
        strategy.name(),
        splits.len(),
        result.predictions.len()
    );
    Ok(result)
}

/// Rank of the true author for every held-out document of every split.
pub fn cross_validate_ranked<S>(splits: &[Split], strategy: &S) -> Result<Vec<usize>>
where
    S: PredictionStrategy + ?Sized,
{
    let per_split: Vec<Vec<usize>> = splits
        .par_iter()
        .map(|split| {
            strategy.predict_ranked(
                &split.train,
                &split.held_out.features,
                &split.held_out.labels,
            )
        })
        .collect::<Result<_>>()?;
    Ok(per_split.into_iter().flatten().collect())
}
