use ndarray::Array2;

use crate::error::{EvalError, Result};

/// Check the shapes handed to `fit`.
pub fn validate_fit_inputs(x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(EvalError::LengthMismatch {
            left: x.nrows(),
            right: y.len(),
        });
    }
    if x.nrows() == 0 {
        return Err(EvalError::InvalidConfig(
            "cannot fit a model on zero training rows".to_string(),
        ));
    }
    if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
        return Err(EvalError::InvalidConfig(format!(
            "class index {} out of range for {} classes",
            bad, n_classes
        )));
    }
    Ok(())
}

/// Check a query matrix against the fitted width.
pub fn validate_query(x: &Array2<f64>, width: usize) -> Result<()> {
    if x.ncols() != width {
        return Err(EvalError::DimensionMismatch {
            expected: width,
            found: x.ncols(),
        });
    }
    Ok(())
}

/// Index of the largest value per row; the lowest index wins ties.
pub fn argmax_rows(p: &Array2<f64>) -> Vec<usize> {
    p.rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for (k, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = k;
                }
            }
            best
        })
        .collect()
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / total).collect()
}

/// Scale a row of non-negative weights to sum to one; all-zero rows become uniform.
pub fn normalize_distribution(weights: &mut [f64]) {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter_mut().for_each(|w| *w /= total);
    } else if !weights.is_empty() {
        let uniform = 1.0 / weights.len() as f64;
        weights.iter_mut().for_each(|w| *w = uniform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn argmax_prefers_lowest_index_on_tie() {
        let p = array![[0.5, 0.5], [0.2, 0.8]];
        assert_eq!(argmax_rows(&p), vec![0, 1]);
    }

    #[test]
    fn softmax_sums_to_one() {
        let s = softmax(&[1.0, 2.0, 1000.0]);
        assert!((s.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(s[2] > 0.99);
    }

    #[test]
    fn zero_weights_become_uniform() {
        let mut w = vec![0.0, 0.0];
        normalize_distribution(&mut w);
        assert_eq!(w, vec![0.5, 0.5]);
    }
}
