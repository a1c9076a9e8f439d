use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;

use crate::config::ModelType;
use crate::error::{EvalError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{normalize_distribution, validate_fit_inputs, validate_query};

/// Gradient Boosting Decision Tree (GBDT) classifier.
///
/// Binary problems train a single model; more classes train one model per
/// class against the rest and renormalize the per-class probabilities.
pub struct GBDTClassifier {
    config: Config,
    models: Vec<GBDT>,
    width: usize,
    n_classes: usize,
}

impl GBDTClassifier {
    pub fn new(model_type: &ModelType) -> Result<Self> {
        match model_type {
            ModelType::GBDT {
                max_depth,
                num_boost_round,
                learning_rate,
                training_optimization_level,
                loss_type,
            } => {
                let mut config = Config::new();
                config.set_shrinkage(*learning_rate);
                config.set_max_depth(*max_depth);
                config.set_iterations(*num_boost_round as usize);
                config.set_debug(false);
                config.set_training_optimization_level(*training_optimization_level);
                config.set_loss(loss_type);
                Ok(GBDTClassifier {
                    config,
                    models: Vec::new(),
                    width: 0,
                    n_classes: 0,
                })
            }
            other => Err(EvalError::InvalidConfig(format!(
                "Expected ModelType::GBDT params, got {:?}",
                other
            ))),
        }
    }

    fn to_datavec(x: &Array2<f64>, targets: Option<&[f32]>) -> DataVec {
        let mut data = DataVec::new();
        for (i, row) in x.rows().into_iter().enumerate() {
            let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
            let label = targets.map_or(0.0, |t| t[i]);
            data.push(Data::new_training_data(features, 1.0, label, None));
        }
        data
    }

    /// Probability that each row belongs to the positive side of `model`.
    fn positive_probability(model: &GBDT, data: &DataVec) -> Vec<f64> {
        model.predict(data).into_iter().map(f64::from).collect()
    }
}

impl ClassifierModel for GBDTClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        validate_fit_inputs(x, y, n_classes)?;
        self.width = x.ncols();
        self.n_classes = n_classes;
        self.config.set_feature_size(x.ncols());
        self.models.clear();

        // LogLikelyhood expects labels in {-1, 1}
        let positives: Vec<usize> = if n_classes == 2 {
            vec![1]
        } else {
            (0..n_classes).collect()
        };
        for positive in positives {
            let targets: Vec<f32> = y
                .iter()
                .map(|&label| if label == positive { 1.0 } else { -1.0 })
                .collect();
            let mut train = Self::to_datavec(x, Some(&targets));
            let mut model = GBDT::new(&self.config);
            model.fit(&mut train);
            self.models.push(model);
        }
        log::trace!(
            "Fitted {} GBDT model(s) on {} rows",
            self.models.len(),
            x.nrows()
        );
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.models.is_empty() {
            return Err(EvalError::InvalidConfig("GBDT used before fit".to_string()));
        }
        validate_query(x, self.width)?;
        let data = Self::to_datavec(x, None);

        let per_model: Vec<Vec<f64>> = self
            .models
            .iter()
            .map(|m| Self::positive_probability(m, &data))
            .collect();

        let mut flat = Vec::with_capacity(x.nrows() * self.n_classes);
        for row in 0..x.nrows() {
            if self.n_classes == 2 {
                let p = per_model[0][row].clamp(0.0, 1.0);
                flat.extend([1.0 - p, p]);
            } else {
                let mut scores: Vec<f64> = per_model.iter().map(|p| p[row].max(0.0)).collect();
                normalize_distribution(&mut scores);
                flat.extend(scores);
            }
        }
        Ok(Array2::from_shape_vec((x.nrows(), self.n_classes), flat)?)
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}
