use ndarray::Array2;

use crate::config::ModelType;
use crate::error::{EvalError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::DecisionTreeClassifier;
use crate::models::utils::{softmax, validate_fit_inputs, validate_query};

/// Multi-class AdaBoost (SAMME) over shallow entropy trees.
pub struct AdaBoostClassifier {
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
    estimators: Vec<(DecisionTreeClassifier, f64)>,
    width: usize,
    n_classes: usize,
}

impl AdaBoostClassifier {
    pub fn new(model_type: &ModelType) -> Result<Self> {
        match model_type {
            ModelType::AdaBoost {
                n_estimators,
                learning_rate,
                max_depth,
            } => {
                if *n_estimators == 0 || *learning_rate <= 0.0 {
                    return Err(EvalError::InvalidConfig(
                        "AdaBoost needs n_estimators > 0 and learning_rate > 0".to_string(),
                    ));
                }
                Ok(Self {
                    n_estimators: *n_estimators,
                    learning_rate: *learning_rate,
                    max_depth: (*max_depth).max(1),
                    estimators: Vec::new(),
                    width: 0,
                    n_classes: 0,
                })
            }
            other => Err(EvalError::InvalidConfig(format!(
                "Expected ModelType::AdaBoost params, got {:?}",
                other
            ))),
        }
    }

    pub fn n_fitted_estimators(&self) -> usize {
        self.estimators.len()
    }
}

impl ClassifierModel for AdaBoostClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        validate_fit_inputs(x, y, n_classes)?;
        self.width = x.ncols();
        self.n_classes = n_classes;
        self.estimators.clear();

        let n = y.len();
        let k = n_classes as f64;
        let mut weights = vec![1.0 / n as f64; n];

        for round in 0..self.n_estimators {
            let mut tree = DecisionTreeClassifier::with_params(2, Some(self.max_depth));
            tree.fit_weighted(x, y, &weights, n_classes)?;
            let predicted = tree.predict(x)?;

            let total: f64 = weights.iter().sum();
            let error: f64 = predicted
                .iter()
                .zip(y)
                .zip(&weights)
                .filter(|((p, t), _)| p != t)
                .map(|(_, w)| *w)
                .sum::<f64>()
                / total;

            if error <= 0.0 {
                self.estimators.push((tree, 1.0));
                break;
            }
            if error >= 1.0 - 1.0 / k {
                // no better than chance; keep a first learner so prediction still works
                if self.estimators.is_empty() {
                    self.estimators.push((tree, 1.0));
                }
                log::debug!("AdaBoost stopped at round {} (error {:.3})", round, error);
                break;
            }

            let alpha = self.learning_rate * (((1.0 - error) / error).ln() + (k - 1.0).ln());
            for (w, (p, t)) in weights.iter_mut().zip(predicted.iter().zip(y)) {
                if p != t {
                    *w *= alpha.exp();
                }
            }
            let total: f64 = weights.iter().sum();
            weights.iter_mut().for_each(|w| *w /= total);
            self.estimators.push((tree, alpha));
        }
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.estimators.is_empty() {
            return Err(EvalError::InvalidConfig("AdaBoost used before fit".to_string()));
        }
        validate_query(x, self.width)?;

        let mut decision = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        let mut total_alpha = 0.0;
        for (tree, alpha) in &self.estimators {
            for (row, class) in tree.predict(x)?.into_iter().enumerate() {
                decision[(row, class)] += alpha;
            }
            total_alpha += alpha;
        }

        let scale = if self.n_classes > 1 {
            total_alpha * (self.n_classes - 1) as f64
        } else {
            1.0
        };
        let mut flat = Vec::with_capacity(x.nrows() * self.n_classes);
        for row in decision.rows() {
            let scores: Vec<f64> = row.iter().map(|d| d / scale).collect();
            flat.extend(softmax(&scores));
        }
        Ok(Array2::from_shape_vec((x.nrows(), self.n_classes), flat)?)
    }

    fn name(&self) -> &str {
        "adaboost"
    }
}
