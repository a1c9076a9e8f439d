use std::cmp::Ordering;

use ndarray::Array2;

use crate::config::ModelType;
use crate::error::{EvalError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{normalize_distribution, validate_fit_inputs, validate_query};

/// Brute-force k-nearest-neighbour classifier with inverse-distance weights.
pub struct KNeighborsClassifier {
    n_neighbors: usize,
    p: f64,
    train: Option<(Vec<Vec<f64>>, Vec<usize>, usize)>,
}

impl KNeighborsClassifier {
    pub fn new(model_type: &ModelType) -> Result<Self> {
        match model_type {
            ModelType::KNeighbors { n_neighbors, p } => {
                if *n_neighbors == 0 || *p < 1.0 {
                    return Err(EvalError::InvalidConfig(
                        "k-NN needs n_neighbors > 0 and p >= 1".to_string(),
                    ));
                }
                Ok(Self {
                    n_neighbors: *n_neighbors,
                    p: *p,
                    train: None,
                })
            }
            other => Err(EvalError::InvalidConfig(format!(
                "Expected ModelType::KNeighbors params, got {:?}",
                other
            ))),
        }
    }

    fn minkowski(&self, a: &[f64], b: &[f64]) -> f64 {
        if self.p == 1.0 {
            return a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
        }
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs().powf(self.p))
            .sum::<f64>()
            .powf(1.0 / self.p)
    }
}

impl ClassifierModel for KNeighborsClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        validate_fit_inputs(x, y, n_classes)?;
        let rows = x.rows().into_iter().map(|r| r.to_vec()).collect();
        self.train = Some((rows, y.to_vec(), n_classes));
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (rows, labels, n_classes) = self
            .train
            .as_ref()
            .ok_or_else(|| EvalError::InvalidConfig("k-NN used before fit".to_string()))?;
        validate_query(x, rows.first().map_or(0, Vec::len))?;
        let k = self.n_neighbors.min(rows.len());

        let mut flat = Vec::with_capacity(x.nrows() * n_classes);
        for query in x.rows() {
            let query = query.to_vec();
            let mut distances: Vec<(f64, usize)> = rows
                .iter()
                .enumerate()
                .map(|(i, r)| (self.minkowski(r, &query), i))
                .collect();
            distances.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            let neighbours = &distances[..k];

            let mut votes = vec![0.0; *n_classes];
            // exact matches take all the weight
            if neighbours.iter().any(|(d, _)| *d == 0.0) {
                for (d, i) in neighbours {
                    if *d == 0.0 {
                        votes[labels[*i]] += 1.0;
                    }
                }
            } else {
                for (d, i) in neighbours {
                    votes[labels[*i]] += 1.0 / d;
                }
            }
            normalize_distribution(&mut votes);
            flat.extend(votes);
        }
        Ok(Array2::from_shape_vec((x.nrows(), *n_classes), flat)?)
    }

    fn name(&self) -> &str {
        "knn"
    }
}
