//! Prediction strategies: preprocessing plus a statistical model behind one
//! contract, working on author names rather than class indices.
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array2;

use crate::config::{ModelConfig, ModelType};
use crate::data_handling::LabeledSet;
use crate::error::{EvalError, Result};
use crate::models::factory::build_model;
use crate::preprocessing::Preprocessor;

/// Maps author names to class indices in sorted name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl LabelEncoder {
    pub fn fit(labels: &[String]) -> Self {
        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { classes, index }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| EvalError::UnknownLabel(label.to_string()))
    }

    pub fn encode_all(&self, labels: &[String]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(l)).collect()
    }

    pub fn decode(&self, index: usize) -> &str {
        &self.classes[index]
    }
}

/// Contract every attribution method satisfies.
///
/// `predict` returns one author label per query row. `predict_ranked` returns,
/// per query row, the 0-based position of the true author in the method's
/// descending-confidence ordering over all authors seen in training.
pub trait PredictionStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, train: &LabeledSet, query: &Array2<f64>) -> Result<Vec<String>>;

    fn predict_ranked(
        &self,
        train: &LabeledSet,
        query: &Array2<f64>,
        truth: &[String],
    ) -> Result<Vec<usize>> {
        let _ = (train, query, truth);
        Err(EvalError::RankingUnsupported(self.name().to_string()))
    }
}

/// Strategy fitting a fresh preprocessor and model per call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStrategy {
    name: String,
    config: ModelConfig,
}

impl ModelStrategy {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            name: config.model_type.short_name().to_string(),
            config,
        }
    }

    pub fn from_model_type(model_type: ModelType) -> Self {
        Self::new(ModelConfig::new(model_type))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit on `train` and return class probabilities for `query` along with
    /// the encoder mapping their columns to authors.
    fn fit_predict_proba(
        &self,
        train: &LabeledSet,
        query: &Array2<f64>,
    ) -> Result<(Array2<f64>, LabelEncoder)> {
        let preprocessing = self.config.effective_preprocessing();
        let preprocessor = Preprocessor::fit(&train.features, &preprocessing)?;
        let train_x = preprocessor.normalize_batch(&train.features)?;
        let query_x = preprocessor.normalize_batch(query)?;

        let encoder = LabelEncoder::fit(&train.labels);
        let y = encoder.encode_all(&train.labels)?;

        let mut model = build_model(&self.config.model_type)?;
        model.fit(&train_x, &y, encoder.n_classes())?;
        log::trace!(
            "{}: fitted on {} rows x {} features, {} authors",
            self.name,
            train_x.nrows(),
            train_x.ncols(),
            encoder.n_classes()
        );
        Ok((model.predict_proba(&query_x)?, encoder))
    }
}

impl Default for ModelStrategy {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

/// Class indices of `row` ordered by descending probability; lower index
/// (earlier author name) first on ties.
pub fn rank_order(row: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| {
        row[b]
            .partial_cmp(&row[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    order
}

impl PredictionStrategy for ModelStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, train: &LabeledSet, query: &Array2<f64>) -> Result<Vec<String>> {
        let (proba, encoder) = self.fit_predict_proba(train, query)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                let best = rank_order(&row.to_vec())[0];
                encoder.decode(best).to_string()
            })
            .collect())
    }

    fn predict_ranked(
        &self,
        train: &LabeledSet,
        query: &Array2<f64>,
        truth: &[String],
    ) -> Result<Vec<usize>> {
        if truth.len() != query.nrows() {
            return Err(EvalError::LengthMismatch {
                left: query.nrows(),
                right: truth.len(),
            });
        }
        let (proba, encoder) = self.fit_predict_proba(train, query)?;
        proba
            .rows()
            .into_iter()
            .zip(truth)
            .map(|(row, label)| {
                let target = encoder.encode(label)?;
                let order = rank_order(&row.to_vec());
                Ok(order.iter().position(|&c| c == target).unwrap_or(order.len()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn train_set() -> LabeledSet {
        LabeledSet::new(
            array![
                [0.0, 0.1, 0.0],
                [0.2, 0.0, 0.1],
                [5.0, 5.1, 4.9],
                [5.2, 4.8, 5.0],
                [9.8, 0.2, 10.1],
                [10.0, 0.0, 9.9]
            ],
            ["carol", "carol", "alice", "alice", "bob", "bob"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn encoder_sorts_labels() {
        let enc = LabelEncoder::fit(&train_set().labels);
        assert_eq!(enc.classes(), &["alice", "bob", "carol"]);
        assert_eq!(enc.encode("carol").unwrap(), 2);
        assert!(matches!(enc.encode("dave"), Err(EvalError::UnknownLabel(_))));
    }

    #[test]
    fn rank_order_breaks_ties_by_index() {
        assert_eq!(rank_order(&[0.2, 0.4, 0.4]), vec![1, 2, 0]);
    }

    #[test]
    fn knn_strategy_predicts_and_ranks() {
        let strategy = ModelStrategy::from_model_type("knn".parse().unwrap());
        let query = array![[0.1, 0.0, 0.05], [9.9, 0.1, 10.0]];
        let labels = strategy.predict(&train_set(), &query).unwrap();
        assert_eq!(labels, vec!["carol".to_string(), "bob".to_string()]);

        let truth = vec!["carol".to_string(), "alice".to_string()];
        let ranks = strategy
            .predict_ranked(&train_set(), &query, &truth)
            .unwrap();
        assert_eq!(ranks[0], 0);
        assert!(ranks[1] >= 1);
    }

    #[test]
    fn unseen_truth_label_is_an_error() {
        let strategy = ModelStrategy::default();
        let query = array![[0.1, 0.0, 0.05]];
        let err = strategy.predict_ranked(&train_set(), &query, &["dave".to_string()]);
        assert!(matches!(err, Err(EvalError::UnknownLabel(l)) if l == "dave"));
    }

    struct HardLabelsOnly;

    impl PredictionStrategy for HardLabelsOnly {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict(&self, _train: &LabeledSet, query: &Array2<f64>) -> Result<Vec<String>> {
            Ok(vec!["alice".to_string(); query.nrows()])
        }
    }

    #[test]
    fn ranking_defaults_to_unsupported() {
        let err = HardLabelsOnly.predict_ranked(&train_set(), &array![[0.0, 0.0, 0.0]], &[]);
        assert!(matches!(err, Err(EvalError::RankingUnsupported(_))));
    }
}
