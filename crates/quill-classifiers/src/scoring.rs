//! Turning predictions into accuracy and precision-at-rank figures.
use crate::error::{EvalError, Result};

/// Fraction of rankings whose true author sits at position `i` or better,
/// for every `i` in `0..author_count`.
///
/// Non-decreasing, and 1.0 at the last index whenever every rank is below
/// `author_count`.
pub fn precision_at_rank(ranks: &[usize], author_count: usize) -> Result<Vec<f64>> {
    if ranks.is_empty() {
        return Err(EvalError::EmptyEvaluation);
    }
    let total = ranks.len() as f64;
    Ok((0..author_count)
        .map(|i| ranks.iter().filter(|&&r| r <= i).count() as f64 / total)
        .collect())
}

/// Fraction of exact matches between predictions and ground truth.
pub fn accuracy<T: PartialEq>(predictions: &[T], truth: &[T]) -> Result<f64> {
    if predictions.len() != truth.len() {
        return Err(EvalError::LengthMismatch {
            left: predictions.len(),
            right: truth.len(),
        });
    }
    if truth.is_empty() {
        return Err(EvalError::EmptyEvaluation);
    }
    let hits = predictions.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(hits as f64 / truth.len() as f64)
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
