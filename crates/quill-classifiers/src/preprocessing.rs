//! Feature preprocessing fitted on a training matrix and replayed on any
//! later vector: prune all-zero columns, standardize, then project onto the
//! leading principal components.
//!
//! The fitted parameters are plain data (`Preprocessor`); nothing is ever
//! refit on held-out rows.

use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{EvalError, Result};

/// Which preprocessing stages run, and the projection target width.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessConfig {
    pub standardize: bool,
    pub project: bool,
    pub components: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            standardize: true,
            project: true,
            components: 30,
        }
    }
}

impl PreprocessConfig {
    pub fn new(standardize: bool, project: bool, components: usize) -> Self {
        Self {
            standardize,
            project,
            components,
        }
    }
}

/// Per-column mean / population standard deviation.
#[derive(Clone, Debug, PartialEq)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Divisor used for zero-variance columns.
    pub const ZERO_STD_SUBSTITUTE: f64 = f64::EPSILON;

    pub fn fit(x: &Array2<f64>) -> Self {
        let mut mean = Vec::with_capacity(x.ncols());
        let mut std = Vec::with_capacity(x.ncols());
        for column in x.columns() {
            mean.push(column.iter().mean());
            let sd = column.iter().population_std_dev();
            std.push(if sd == 0.0 {
                Self::ZERO_STD_SUBSTITUTE
            } else {
                sd
            });
        }
        Scaler { mean, std }
    }

    fn apply(&self, v: &mut [f64]) {
        for (c, value) in v.iter_mut().enumerate() {
            *value = (*value - self.mean[c]) / self.std[c];
        }
    }
}

/// A fitted principal-component projection.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub mean: Array1<f64>,
    /// One component per row, unit length.
    pub components: Array2<f64>,
    pub explained_variance: Vec<f64>,
}

impl Projection {
    const MAX_ITER: usize = 1000;
    const TOLERANCE: f64 = 1e-10;
    const SEED: u64 = 0x5eed;

    /// Fit up to `k` leading components by power iteration, orthogonalizing
    /// against the components already found. Stops early once the remaining
    /// variance vanishes.
    pub fn fit(x: &Array2<f64>, k: usize) -> Option<Self> {
        let (n, d) = x.dim();
        let mean = x.mean_axis(Axis(0))?;
        let centered = x - &mean;
        let total_variance = centered.iter().map(|v| v * v).sum::<f64>() / n as f64;
        let k = k.min(n).min(d);

        let mut rng = ChaCha8Rng::seed_from_u64(Self::SEED);
        let mut found: Vec<Array1<f64>> = Vec::with_capacity(k);
        let mut variances = Vec::with_capacity(k);

        for _ in 0..k {
            let mut v = Array1::from_shape_fn(d, |_| rng.gen_range(-1.0..1.0));
            orthogonalize(&mut v, &found);
            if !normalize_in_place(&mut v) {
                break;
            }

            let mut eigenvalue = 0.0;
            for _ in 0..Self::MAX_ITER {
                let xv = centered.dot(&v);
                let mut w = centered.t().dot(&xv) / n as f64;
                orthogonalize(&mut w, &found);
                let norm = w.dot(&w).sqrt();
                if norm <= f64::MIN_POSITIVE {
                    eigenvalue = 0.0;
                    break;
                }
                w /= norm;
                let delta: f64 = w.iter().zip(v.iter()).map(|(a, b)| (a - b).abs()).sum();
                v = w;
                eigenvalue = norm;
                if delta < Self::TOLERANCE {
                    break;
                }
            }

            if eigenvalue <= total_variance * 1e-12 {
                break;
            }

            // sign convention: largest-magnitude loading is positive
            let pivot = v
                .iter()
                .copied()
                .fold(0.0_f64, |acc, a| if a.abs() > acc.abs() { a } else { acc });
            if pivot < 0.0 {
                v.mapv_inplace(|a| -a);
            }
            found.push(v);
            variances.push(eigenvalue);
        }

        if found.is_empty() {
            return None;
        }

        let m = found.len();
        let flat: Vec<f64> = found.iter().flat_map(|c| c.iter().copied()).collect();
        let components = Array2::from_shape_vec((m, d), flat).ok()?;
        Some(Projection {
            mean,
            components,
            explained_variance: variances,
        })
    }

    fn apply(&self, v: &[f64]) -> Vec<f64> {
        let centered = Array1::from_iter(v.iter().zip(self.mean.iter()).map(|(a, m)| a - m));
        self.components.dot(&centered).to_vec()
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }
}

fn orthogonalize(v: &mut Array1<f64>, basis: &[Array1<f64>]) {
    for b in basis {
        let overlap = v.dot(b);
        v.scaled_add(-overlap, b);
    }
}

fn normalize_in_place(v: &mut Array1<f64>) -> bool {
    let norm = v.dot(v).sqrt();
    if norm <= f64::MIN_POSITIVE {
        return false;
    }
    *v /= norm;
    true
}

/// Fitted prune → standardize → project pipeline.
#[derive(Clone, Debug)]
pub struct Preprocessor {
    input_width: usize,
    kept: Vec<usize>,
    pruned: Vec<usize>,
    scaler: Option<Scaler>,
    projection: Option<Projection>,
}

impl Preprocessor {
    /// Fit all stages on `x` (rows are documents).
    pub fn fit(x: &Array2<f64>, config: &PreprocessConfig) -> Result<Self> {
        let (nrows, ncols) = x.dim();
        if nrows == 0 {
            return Err(EvalError::InvalidConfig(
                "cannot fit a preprocessor on an empty training matrix".to_string(),
            ));
        }

        let (kept, pruned): (Vec<usize>, Vec<usize>) = (0..ncols)
            .partition(|&c| x.column(c).iter().any(|&v| v != 0.0));
        log::trace!("Pruning {} all-zero columns of {}", pruned.len(), ncols);

        let mut working = x.select(Axis(1), &kept);

        let scaler = if config.standardize {
            let scaler = Scaler::fit(&working);
            for mut row in working.rows_mut() {
                if let Some(slice) = row.as_slice_mut() {
                    scaler.apply(slice);
                }
            }
            Some(scaler)
        } else {
            None
        };

        let projection = if config.project {
            let projection = Projection::fit(&working, config.components);
            if projection.is_none() {
                log::warn!("Training matrix has no variance left to project; skipping projection");
            }
            projection
        } else {
            None
        };

        Ok(Self {
            input_width: ncols,
            kept,
            pruned,
            scaler,
            projection,
        })
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn output_width(&self) -> usize {
        match &self.projection {
            Some(p) => p.n_components(),
            None => self.kept.len(),
        }
    }

    pub fn pruned_columns(&self) -> &[usize] {
        &self.pruned
    }

    pub fn scaler(&self) -> Option<&Scaler> {
        self.scaler.as_ref()
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn normalize(&self, vector: &[f64]) -> Result<Vec<f64>> {
        if vector.len() != self.input_width {
            return Err(EvalError::DimensionMismatch {
                expected: self.input_width,
                found: vector.len(),
            });
        }
        let mut v: Vec<f64> = self.kept.iter().map(|&c| vector[c]).collect();
        if let Some(scaler) = &self.scaler {
            scaler.apply(&mut v);
        }
        Ok(match &self.projection {
            Some(p) => p.apply(&v),
            None => v,
        })
    }

    pub fn normalize_batch(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.input_width {
            return Err(EvalError::DimensionMismatch {
                expected: self.input_width,
                found: x.ncols(),
            });
        }
        let width = self.output_width();
        let mut flat = Vec::with_capacity(x.nrows() * width);
        for row in x.rows() {
            flat.extend(self.normalize(&row.to_vec())?);
        }
        Ok(Array2::from_shape_vec((x.nrows(), width), flat)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn scaler_uses_population_std() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let sc = Scaler::fit(&x);
        assert!((sc.mean[0] - 2.5).abs() < 1e-12);
        assert!((sc.std[0] - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_column_uses_epsilon() {
        let x = array![[3.0, 1.0], [3.0, 2.0]];
        let sc = Scaler::fit(&x);
        assert_eq!(sc.std[0], f64::EPSILON);
    }

    #[test]
    fn projection_recovers_dominant_axis() {
        let x = array![[-2.0, 0.1], [-1.0, -0.1], [0.0, 0.0], [1.0, 0.1], [2.0, -0.1]];
        let p = Projection::fit(&x, 1).unwrap();
        assert_eq!(p.n_components(), 1);
        assert!(p.components[(0, 0)] > 0.99);
    }

    #[test]
    fn projection_stops_at_rank() {
        // rank one after centering
        let x = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [3.0, 6.0, 9.0]];
        let p = Projection::fit(&x, 3).unwrap();
        assert_eq!(p.n_components(), 1);
    }

    #[test]
    fn preprocessor_rejects_wrong_length() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let pp = Preprocessor::fit(&x, &PreprocessConfig::default()).unwrap();
        assert!(matches!(
            pp.normalize(&[1.0]),
            Err(EvalError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        ));
    }
}
