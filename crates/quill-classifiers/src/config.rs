use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::preprocessing::PreprocessConfig;

/// Central configuration for the statistical model behind a strategy.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    #[serde(flatten)]
    pub model_type: ModelType,

    /// Overrides the preprocessing the model type uses by default.
    #[serde(default)]
    pub preprocessing: Option<PreprocessConfig>,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    SVM {
        c: f64,
        /// RBF gamma is `gamma_scale / n_features`.
        gamma_scale: f64,
        /// Stopping tolerance of the SMO solver.
        eps: f64,
    },
    KNeighbors {
        n_neighbors: usize,
        /// Minkowski exponent.
        p: f64,
    },
    DecisionTree {
        min_samples_split: usize,
        max_depth: Option<usize>,
    },
    AdaBoost {
        n_estimators: usize,
        learning_rate: f64,
        max_depth: usize,
    },
    GBDT {
        max_depth: u32,
        num_boost_round: u32,
        learning_rate: f32,
        training_optimization_level: u8,
        loss_type: String,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::SVM {
            c: 2.4,
            gamma_scale: 0.7,
            eps: 1e-3,
        }
    }
}

impl ModelType {
    /// Short name used on the command line and in reports.
    pub fn short_name(&self) -> &'static str {
        match self {
            ModelType::SVM { .. } => "svm",
            ModelType::KNeighbors { .. } => "knn",
            ModelType::DecisionTree { .. } => "tree",
            ModelType::AdaBoost { .. } => "adaboost",
            ModelType::GBDT { .. } => "gbdt",
        }
    }

    /// Preprocessing the model is tuned for: standardize everywhere, project
    /// only for the decision tree.
    pub fn default_preprocessing(&self) -> PreprocessConfig {
        match self {
            ModelType::DecisionTree { .. } => PreprocessConfig::new(true, true, 30),
            _ => PreprocessConfig::new(true, false, 30),
        }
    }

    /// Boosted stumps used to tell regular from obfuscated texts.
    pub fn obfuscation_detector() -> Self {
        ModelType::AdaBoost {
            n_estimators: 80,
            learning_rate: 0.998,
            max_depth: 1,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "svm" => Ok(ModelType::default()),
            "knn" | "kneighbors" => Ok(ModelType::KNeighbors {
                n_neighbors: 4,
                p: 1.0,
            }),
            "tree" | "decisiontree" => Ok(ModelType::DecisionTree {
                min_samples_split: 2,
                max_depth: None,
            }),
            "adaboost" => Ok(ModelType::AdaBoost {
                n_estimators: 10,
                learning_rate: 0.998,
                max_depth: 1,
            }),
            "gbdt" => Ok(ModelType::GBDT {
                max_depth: 6,
                num_boost_round: 50,
                learning_rate: 0.1,
                training_optimization_level: 2,
                loss_type: "LogLikelyhood".to_string(),
            }),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: svm, knn, tree, adaboost, gbdt",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            model_type,
            preprocessing: None,
        }
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessConfig) -> Self {
        self.preprocessing = Some(preprocessing);
        self
    }

    pub fn effective_preprocessing(&self) -> PreprocessConfig {
        self.preprocessing
            .unwrap_or_else(|| self.model_type.default_preprocessing())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(ModelType::default())
    }
}
