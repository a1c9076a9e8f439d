//! Detecting obfuscated documents and shifting them back towards their
//! author's regular style before attribution.
//!
//! The correction is one global offset: the mean, over all pairs, of
//! `mean(regular) - obfuscated`. It assumes obfuscation moves every author by
//! roughly the same additive amount in feature space.
use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ModelType;
use crate::data_handling::{ObfuscationPair, PairedSplit};
use crate::error::{EvalError, Result};
use crate::models::factory::build_model;
use crate::preprocessing::{PreprocessConfig, Preprocessor};
use crate::scoring::precision_at_rank;
use crate::strategy::PredictionStrategy;

/// When the learned offset is applied to a held-out document.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeobfuscationMode {
    Never,
    /// Only documents the detector classifies as obfuscated.
    Detect,
    Always,
}

impl DeobfuscationMode {
    pub const ALL: [DeobfuscationMode; 3] = [
        DeobfuscationMode::Never,
        DeobfuscationMode::Detect,
        DeobfuscationMode::Always,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeobfuscationMode::Never => "never",
            DeobfuscationMode::Detect => "detect",
            DeobfuscationMode::Always => "always",
        }
    }
}

impl FromStr for DeobfuscationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "never" => Ok(DeobfuscationMode::Never),
            "detect" => Ok(DeobfuscationMode::Detect),
            "always" => Ok(DeobfuscationMode::Always),
            _ => Err(format!(
                "Unknown de-obfuscation mode: {}. Valid options are: never, detect, always",
                s
            )),
        }
    }
}

impl fmt::Display for DeobfuscationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn mean_vector(rows: &[Vec<f64>], width: usize) -> Result<Vec<f64>> {
    let mut total = vec![0.0; width];
    for row in rows {
        if row.len() != width {
            return Err(EvalError::DimensionMismatch {
                expected: width,
                found: row.len(),
            });
        }
        total.iter_mut().zip(row).for_each(|(t, v)| *t += v);
    }
    let n = rows.len() as f64;
    Ok(total.into_iter().map(|t| t / n).collect())
}

/// Average over all pairs of `mean(regular) - obfuscated`.
///
/// Pairs without regular documents carry no signal and are ignored.
pub fn learn_obfuscation_offset(pairs: &[ObfuscationPair]) -> Result<Vec<f64>> {
    let usable: Vec<&ObfuscationPair> = pairs.iter().filter(|p| !p.regular.is_empty()).collect();
    let first = usable.first().ok_or(EvalError::NoObfuscationPairs)?;
    let width = first.obfuscated.len();

    let mut differences = Vec::with_capacity(usable.len());
    for pair in usable {
        if pair.obfuscated.len() != width {
            return Err(EvalError::DimensionMismatch {
                expected: width,
                found: pair.obfuscated.len(),
            });
        }
        let regular = mean_vector(&pair.regular, width)?;
        differences.push(
            regular
                .iter()
                .zip(&pair.obfuscated)
                .map(|(r, o)| r - o)
                .collect::<Vec<f64>>(),
        );
    }
    mean_vector(&differences, width)
}

/// `vector + offset`, element-wise.
pub fn apply_offset(vector: &[f64], offset: &[f64]) -> Result<Vec<f64>> {
    if vector.len() != offset.len() {
        return Err(EvalError::DimensionMismatch {
            expected: offset.len(),
            found: vector.len(),
        });
    }
    Ok(vector.iter().zip(offset).map(|(v, o)| v + o).collect())
}

/// Binary regular (0) vs obfuscated (1) classifier, trained per round on
/// the pooled pairs of the other authors. Defaults to AdaBoost over stumps
/// on standardized features.
#[derive(Debug, Clone, PartialEq)]
pub struct ObfuscationDetector {
    model_type: ModelType,
    preprocessing: PreprocessConfig,
}

impl Default for ObfuscationDetector {
    fn default() -> Self {
        Self {
            model_type: ModelType::obfuscation_detector(),
            preprocessing: PreprocessConfig::new(true, false, 30),
        }
    }
}

impl ObfuscationDetector {
    pub fn new(model_type: ModelType, preprocessing: PreprocessConfig) -> Self {
        Self {
            model_type,
            preprocessing,
        }
    }

    /// Classify every row of `query`; `true` means obfuscated.
    pub fn detect(&self, pairs: &[ObfuscationPair], query: &Array2<f64>) -> Result<Vec<bool>> {
        let mut rows: Vec<&[f64]> = Vec::new();
        let mut labels: Vec<usize> = Vec::new();
        for pair in pairs {
            for regular in &pair.regular {
                rows.push(regular);
                labels.push(0);
            }
        }
        for pair in pairs {
            rows.push(&pair.obfuscated);
            labels.push(1);
        }
        if !labels.contains(&0) || !labels.contains(&1) {
            return Err(EvalError::NoObfuscationPairs);
        }

        let width = query.ncols();
        let mut flat = Vec::with_capacity(rows.len() * width);
        for row in &rows {
            if row.len() != width {
                return Err(EvalError::DimensionMismatch {
                    expected: width,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let train = Array2::from_shape_vec((rows.len(), width), flat)?;

        let preprocessor = Preprocessor::fit(&train, &self.preprocessing)?;
        let mut model = build_model(&self.model_type)?;
        model.fit(&preprocessor.normalize_batch(&train)?, &labels, 2)?;
        let predicted = model.predict(&preprocessor.normalize_batch(query)?)?;
        Ok(predicted.into_iter().map(|class| class == 1).collect())
    }
}

/// Prepares the held-out documents of a leave-one-out round for attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DeobfuscationPipeline {
    mode: DeobfuscationMode,
    detector: ObfuscationDetector,
}

impl DeobfuscationPipeline {
    pub fn new(mode: DeobfuscationMode) -> Self {
        Self {
            mode,
            detector: ObfuscationDetector::default(),
        }
    }

    pub fn with_detector(mut self, detector: ObfuscationDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn mode(&self) -> DeobfuscationMode {
        self.mode
    }

    /// Held-out features with the offset applied to each document the mode
    /// selects.
    pub fn prepare(&self, round: &PairedSplit) -> Result<Array2<f64>> {
        let mut features = round.split.held_out.features.clone();
        if self.mode == DeobfuscationMode::Never {
            return Ok(features);
        }
        if round.pairs.is_empty() {
            log::warn!(
                "No obfuscation pairs for round of {}; leaving documents uncorrected",
                round.excluded_author
            );
            return Ok(features);
        }

        let offset = learn_obfuscation_offset(&round.pairs)?;
        let selected = match self.mode {
            DeobfuscationMode::Detect => self.detector.detect(&round.pairs, &features)?,
            _ => vec![true; features.nrows()],
        };
        for (mut row, correct) in features.rows_mut().into_iter().zip(selected) {
            if correct {
                let shifted = apply_offset(&row.to_vec(), &offset)?;
                row.iter_mut().zip(shifted).for_each(|(v, s)| *v = s);
            }
        }
        Ok(features)
    }
}

/// Precision-at-rank of `strategy` over leave-one-out rounds, with held-out
/// documents prepared by `pipeline`.
pub fn deobfuscation_precision_at_rank<S>(
    rounds: &[PairedSplit],
    strategy: &S,
    pipeline: &DeobfuscationPipeline,
) -> Result<Vec<f64>>
where
    S: PredictionStrategy + ?Sized,
{
    let first = rounds.first().ok_or(EvalError::EmptyEvaluation)?;
    let per_round: Vec<Vec<usize>> = rounds
        .par_iter()
        .map(|round| {
            let features = pipeline.prepare(round)?;
            strategy.predict_ranked(&round.split.train, &features, &round.split.held_out.labels)
        })
        .collect::<Result<_>>()?;
    let ranks: Vec<usize> = per_round.into_iter().flatten().collect();
    log::debug!(
        "deobf:{} scored {} documents over {} rounds",
        pipeline.mode(),
        ranks.len(),
        rounds.len()
    );
    precision_at_rank(&ranks, first.split.n_candidates())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::{LabeledSet, Split};
    use ndarray::array;

    fn pair(regular: &[&[f64]], obfuscated: &[f64]) -> ObfuscationPair {
        ObfuscationPair {
            regular: regular.iter().map(|r| r.to_vec()).collect(),
            obfuscated: obfuscated.to_vec(),
        }
    }

    #[test]
    fn offset_averages_pair_differences() {
        let pairs = vec![pair(&[&[1.0, 1.0]], &[2.0, 2.0]), pair(&[&[0.0, 0.0]], &[1.0, 1.0])];
        // the differences are both [-1, -1]; correction moves obfuscated back
        assert_eq!(learn_obfuscation_offset(&pairs).unwrap(), vec![-1.0, -1.0]);
    }

    #[test]
    fn offset_uses_the_mean_of_regular_documents() {
        let pairs = vec![pair(&[&[0.0, 4.0], &[2.0, 0.0]], &[0.0, 0.0])];
        assert_eq!(learn_obfuscation_offset(&pairs).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn offset_needs_pairs() {
        assert!(matches!(
            learn_obfuscation_offset(&[]),
            Err(EvalError::NoObfuscationPairs)
        ));
    }

    #[test]
    fn apply_offset_checks_width() {
        assert_eq!(apply_offset(&[1.0, 2.0], &[0.5, 0.5]).unwrap(), vec![1.5, 2.5]);
        assert!(apply_offset(&[1.0], &[0.5, 0.5]).is_err());
    }

    #[test]
    fn default_detector_boosts_stumps_on_standardized_features() {
        let detector = ObfuscationDetector::default();
        match detector.model_type {
            ModelType::AdaBoost {
                n_estimators,
                learning_rate,
                max_depth,
            } => {
                assert_eq!(n_estimators, 80);
                assert!((learning_rate - 0.998).abs() < 1e-12);
                assert_eq!(max_depth, 1);
            }
            other => panic!("unexpected detector model {:?}", other),
        }
        assert_eq!(detector.preprocessing, PreprocessConfig::new(true, false, 30));
    }

    #[test]
    fn modes_parse_and_display() {
        for mode in DeobfuscationMode::ALL {
            assert_eq!(mode.to_string().parse::<DeobfuscationMode>().unwrap(), mode);
        }
        assert!("sometimes".parse::<DeobfuscationMode>().is_err());
    }

    #[test]
    fn always_shifts_every_held_out_document() {
        let round = PairedSplit {
            split: Split {
                train: LabeledSet::new(array![[0.0, 0.0]], vec!["a".to_string()]).unwrap(),
                held_out: LabeledSet::new(
                    array![[5.0, 5.0], [7.0, 7.0]],
                    vec!["a".to_string(), "a".to_string()],
                )
                .unwrap(),
            },
            excluded_author: "a".to_string(),
            pairs: vec![pair(&[&[0.0, 0.0]], &[1.0, 3.0])],
        };
        let never = DeobfuscationPipeline::new(DeobfuscationMode::Never)
            .prepare(&round)
            .unwrap();
        assert_eq!(never, round.split.held_out.features);

        let always = DeobfuscationPipeline::new(DeobfuscationMode::Always)
            .prepare(&round)
            .unwrap();
        assert_eq!(always, array![[4.0, 2.0], [6.0, 4.0]]);
    }
}
