use linfa::dataset::Pr;
use linfa::traits::Predict;
use linfa::{Dataset, DatasetBase};
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, Array2};

use crate::config::ModelType;
use crate::error::{EvalError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{normalize_distribution, validate_fit_inputs, validate_query};

/// RBF support vector machine on `linfa_svm`, Platt-scaled probabilities.
///
/// Binary problems train one model for class 1; more classes train one
/// model per class against the rest and renormalize.
pub struct SVMClassifier {
    c: f64,
    gamma_scale: f64,
    eps: f64,
    models: Vec<Svm<f64, Pr>>,
    width: usize,
    n_classes: usize,
}

impl SVMClassifier {
    pub fn new(model_type: &ModelType) -> Result<Self> {
        match model_type {
            ModelType::SVM {
                c,
                gamma_scale,
                eps,
            } => {
                if *c <= 0.0 || *gamma_scale <= 0.0 || *eps <= 0.0 {
                    return Err(EvalError::InvalidConfig(
                        "SVM needs c > 0, gamma_scale > 0 and eps > 0".to_string(),
                    ));
                }
                Ok(SVMClassifier {
                    c: *c,
                    gamma_scale: *gamma_scale,
                    eps: *eps,
                    models: Vec::new(),
                    width: 0,
                    n_classes: 0,
                })
            }
            other => Err(EvalError::InvalidConfig(format!(
                "Expected ModelType::SVM params, got {:?}",
                other
            ))),
        }
    }

    /// linfa's gaussian kernel is `exp(-|a - b|^2 / eps)`, so `eps = 1 / gamma`.
    fn kernel_eps(&self, n_features: usize) -> f64 {
        n_features.max(1) as f64 / self.gamma_scale
    }

    fn positive_probability(model: &Svm<f64, Pr>, x: &Array2<f64>) -> Vec<f64> {
        let predictions: DatasetBase<Array2<f64>, Array1<Pr>> = model.predict(x.to_owned());
        predictions.targets().iter().map(|&p| f64::from(*p)).collect()
    }
}

impl ClassifierModel for SVMClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        validate_fit_inputs(x, y, n_classes)?;
        self.width = x.ncols();
        self.n_classes = n_classes;
        self.models.clear();

        let params: SvmParams<f64, Pr> = Svm::<f64, Pr>::params()
            .eps(self.eps)
            .pos_neg_weights(self.c, self.c)
            .gaussian_kernel(self.kernel_eps(x.ncols()));

        let positives: Vec<usize> = if n_classes == 2 {
            vec![1]
        } else {
            (0..n_classes).collect()
        };
        for positive in positives {
            let targets: Array1<bool> = y.iter().map(|&label| label == positive).collect();
            let dataset = Dataset::new(x.to_owned(), targets);
            let model = <SvmParams<f64, Pr> as linfa::traits::Fit<_, _, _>>::fit(&params, &dataset)
                .map_err(|e| EvalError::ModelFit(format!("svm (class {}): {}", positive, e)))?;
            self.models.push(model);
        }
        log::trace!(
            "Fitted {} SVM model(s) on {} rows (kernel eps={:.4})",
            self.models.len(),
            x.nrows(),
            self.kernel_eps(x.ncols())
        );
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.models.is_empty() {
            return Err(EvalError::InvalidConfig("SVM used before fit".to_string()));
        }
        validate_query(x, self.width)?;

        let per_model: Vec<Vec<f64>> = self
            .models
            .iter()
            .map(|m| Self::positive_probability(m, x))
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
        "svm"
    }
}
