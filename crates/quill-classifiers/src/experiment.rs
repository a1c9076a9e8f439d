//! Experiment runners tying partitioning, strategies and scoring together.
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cross_validation::{cross_validate, cross_validate_ranked};
use crate::data_handling::{Corpus, Split, DEFAULT_ATTACK_TAG, DEFAULT_EXCLUDED_TAGS};
use crate::deobfuscation::{deobfuscation_precision_at_rank, DeobfuscationMode, DeobfuscationPipeline};
use crate::error::{EvalError, Result};
use crate::partition::{AttackConfig, PairingConfig, Partitioner, RotationConfig, DEFAULT_SEED};
use crate::report::{AccuracyReport, PrecisionCurve, StrategyAccuracy};
use crate::scoring::{accuracy, precision_at_rank};
use crate::strategy::PredictionStrategy;

/// How much cross-validation an experiment spends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    /// 2 author samples, 1 split each: quick demo numbers.
    #[default]
    Light,
    /// 80 author samples, 13 splits each.
    Heavy,
}

impl Intensity {
    pub fn samples(&self) -> usize {
        match self {
            Intensity::Light => 2,
            Intensity::Heavy => 80,
        }
    }

    pub fn splits_per_sample(&self) -> usize {
        match self {
            Intensity::Light => 1,
            Intensity::Heavy => 13,
        }
    }
}

impl FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Intensity::Light),
            "heavy" => Ok(Intensity::Heavy),
            _ => Err(format!("Unknown intensity: {}. Valid options are: light, heavy", s)),
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Light => write!(f, "light"),
            Intensity::Heavy => write!(f, "heavy"),
        }
    }
}

/// Shared settings of every cross-validated experiment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    pub intensity: Intensity,
    /// Hold out attack texts instead of rotating clean ones.
    pub attack: bool,
    pub num_authors: usize,
    pub seed: u64,
    pub excluded_tags: Vec<String>,
    pub attack_tags: Vec<String>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            intensity: Intensity::Light,
            attack: false,
            num_authors: 40,
            seed: DEFAULT_SEED,
            excluded_tags: DEFAULT_EXCLUDED_TAGS.iter().map(|t| t.to_string()).collect(),
            attack_tags: vec![DEFAULT_ATTACK_TAG.to_string()],
        }
    }
}

impl EvaluationConfig {
    pub fn partitioner(&self) -> Partitioner {
        Partitioner::new(self.seed)
    }

    pub fn rotation_config(&self) -> RotationConfig {
        RotationConfig {
            samples: self.intensity.samples(),
            num_authors: self.num_authors,
            splits_per_sample: self.intensity.splits_per_sample(),
            excluded_tags: self.excluded_tags.clone(),
        }
    }

    pub fn attack_config(&self) -> AttackConfig {
        AttackConfig {
            samples: self.intensity.samples(),
            num_authors: self.num_authors,
            excluded_tags: self.excluded_tags.clone(),
            attack_tags: self.attack_tags.clone(),
        }
    }

    pub fn pairing_config(&self, samples: usize) -> PairingConfig {
        PairingConfig {
            samples,
            num_authors: self.num_authors,
            excluded_tags: self.excluded_tags.clone(),
            attack_tags: self.attack_tags.clone(),
        }
    }

    /// Rotation or attack splits, depending on `attack`.
    pub fn create_splits(&self, corpus: &Corpus) -> Result<Vec<Split>> {
        let partitioner = self.partitioner();
        if self.attack {
            partitioner.create_splits_attack(corpus, &self.attack_config())
        } else {
            partitioner.create_splits(corpus, &self.rotation_config())
        }
    }
}

/// `corpus` restricted to `groups`, or the whole corpus for `None`.
pub fn working_corpus<'a, S: AsRef<str>>(
    corpus: &'a Corpus,
    groups: Option<&[S]>,
) -> Result<Cow<'a, Corpus>> {
    match groups {
        Some(names) => Ok(Cow::Owned(corpus.select_groups(names)?)),
        None => Ok(Cow::Borrowed(corpus)),
    }
}

/// Accuracy of `strategy` on `corpus` restricted to `groups`.
pub fn precision_for_configuration<S, G>(
    corpus: &Corpus,
    strategy: &S,
    groups: Option<&[G]>,
    config: &EvaluationConfig,
) -> Result<f64>
where
    S: PredictionStrategy + ?Sized,
    G: AsRef<str>,
{
    let selected = working_corpus(corpus, groups)?;
    let splits = config.create_splits(&selected)?;
    let cv = cross_validate(&splits, strategy)?;
    accuracy(&cv.predictions, &cv.truth)
}

/// Precision-at-rank curve over the candidate authors of the first split.
pub fn precision_curve<S>(splits: &[Split], strategy: &S) -> Result<Vec<f64>>
where
    S: PredictionStrategy + ?Sized,
{
    let first = splits.first().ok_or(EvalError::EmptyEvaluation)?;
    let ranks = cross_validate_ranked(splits, strategy)?;
    precision_at_rank(&ranks, first.n_candidates())
}

/// Accuracy of several strategies on one shared split set, next to the
/// uniform prior of guessing among the split's candidate authors.
pub fn survey(
    corpus: &Corpus,
    strategies: &[Box<dyn PredictionStrategy>],
    config: &EvaluationConfig,
) -> Result<AccuracyReport> {
    let splits = config.create_splits(corpus)?;
    let first = splits.first().ok_or(EvalError::EmptyEvaluation)?;
    let prior = 1.0 / first.n_candidates().max(1) as f64;
    log::info!(
        "Surveying {} strategies on {} texts ({}, {} splits)",
        strategies.len(),
        if config.attack { "attack" } else { "natural" },
        config.intensity,
        splits.len()
    );

    let mut scores = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        let cv = cross_validate(&splits, strategy.as_ref())?;
        let acc = accuracy(&cv.predictions, &cv.truth)?;
        log::info!("{}: accuracy {:.4}", strategy.name(), acc);
        scores.push(StrategyAccuracy {
            strategy: strategy.name().to_string(),
            accuracy: acc,
        });
    }

    Ok(AccuracyReport {
        attack: config.attack,
        intensity: config.intensity,
        prior,
        scores,
    })
}

/// Precision-at-rank of one strategy on rotation or attack splits.
pub fn rank_experiment<S>(
    corpus: &Corpus,
    strategy: &S,
    config: &EvaluationConfig,
) -> Result<PrecisionCurve>
where
    S: PredictionStrategy + ?Sized,
{
    let splits = config.create_splits(corpus)?;
    log::info!(
        "Determining precision at rank for {} over {} splits",
        strategy.name(),
        splits.len()
    );
    let curve = PrecisionCurve::new(strategy.name(), precision_curve(&splits, strategy)?);
    log::info!("{}: mean precision {:.4}", curve.label, curve.mean);
    Ok(curve)
}

/// Precision-at-rank of attributing obfuscated documents under each
/// de-obfuscation mode. All modes share the same leave-one-out rounds.
pub fn deobfuscation_experiment<S>(
    corpus: &Corpus,
    strategy: &S,
    config: &EvaluationConfig,
    samples: usize,
    modes: &[DeobfuscationMode],
) -> Result<Vec<PrecisionCurve>>
where
    S: PredictionStrategy + ?Sized,
{
    let rounds = config
        .partitioner()
        .create_pairing_splits(corpus, &config.pairing_config(samples))?;
    log::info!("Running {} leave-one-out rounds", rounds.len());

    modes
        .iter()
        .map(|&mode| {
            let pipeline = DeobfuscationPipeline::new(mode);
            let precision = deobfuscation_precision_at_rank(&rounds, strategy, &pipeline)?;
            let curve = PrecisionCurve::new(strategy.name(), precision).with_mode(mode);
            log::info!("deobf:{}, ave(recall): {:.4}", mode, curve.mean);
            Ok(curve)
        })
        .collect()
}
