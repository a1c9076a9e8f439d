//! Serialisable result records of the experiments.
//!
//! These are what the command line writes out; presentation is left to the
//! consumer.
use serde::{Deserialize, Serialize};

use crate::deobfuscation::DeobfuscationMode;
use crate::experiment::Intensity;
use crate::scoring::mean;

/// Accuracy of one strategy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StrategyAccuracy {
    pub strategy: String,
    pub accuracy: f64,
}

/// Outcome of a survey over several strategies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AccuracyReport {
    pub attack: bool,
    pub intensity: Intensity,
    /// Accuracy of guessing uniformly among the candidate authors.
    pub prior: f64,
    pub scores: Vec<StrategyAccuracy>,
}

/// Precision at every rank, with its mean as a one-number summary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrecisionCurve {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeobfuscationMode>,
    pub precision: Vec<f64>,
    pub mean: f64,
}

impl PrecisionCurve {
    pub fn new(label: impl Into<String>, precision: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            mode: None,
            mean: mean(&precision).unwrap_or(0.0),
            precision,
        }
    }

    pub fn with_mode(mut self, mode: DeobfuscationMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Score attached to one feature group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeatureScore {
    pub group: String,
    pub score: f64,
}

/// Feature groups ordered by a ranking method.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeatureRanking {
    pub method: String,
    /// Accuracy with every group selected; set for dropout rankings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<f64>,
    pub ranking: Vec<FeatureScore>,
}

/// One accepted step of a greedy search.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SelectionStep {
    pub group: String,
    pub precision: f64,
}

/// Final state of a greedy feature-subset search.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SelectionResult {
    pub direction: String,
    pub start_precision: f64,
    pub precision: f64,
    pub selection: Vec<String>,
    pub steps: Vec<SelectionStep>,
}
