mod common;

use ndarray::array;
use quill_classifiers::data_handling::ObfuscationPair;
use quill_classifiers::deobfuscation::{
    deobfuscation_precision_at_rank, learn_obfuscation_offset, DeobfuscationMode,
    DeobfuscationPipeline, ObfuscationDetector,
};
use quill_classifiers::experiment::{deobfuscation_experiment, EvaluationConfig};
use quill_classifiers::partition::{PairingConfig, Partitioner};
use quill_classifiers::strategy::ModelStrategy;

fn knn() -> ModelStrategy {
    ModelStrategy::from_model_type("knn".parse().unwrap())
}

#[test]
fn test_offset_recovers_a_uniform_shift() {
    let corpus = common::synthetic_corpus(6, 4, true);
    let rounds = Partitioner::default()
        .create_pairing_splits(
            &corpus,
            &PairingConfig {
                num_authors: 6,
                ..PairingConfig::default()
            },
        )
        .unwrap();
    let offset = learn_obfuscation_offset(&rounds[0].pairs).unwrap();
    for (o, shift) in offset.iter().zip(common::OBFUSCATION_SHIFT) {
        assert!((o + shift).abs() < 0.25, "offset {} vs shift {}", o, shift);
    }
}

#[test]
fn test_detector_separates_marked_documents() {
    let pairs: Vec<ObfuscationPair> = (0..6)
        .map(|a| {
            let base = a as f64;
            ObfuscationPair {
                regular: (0..3).map(|d| vec![base, d as f64 * 0.1, 0.0]).collect(),
                obfuscated: vec![base, 0.05, 5.0],
            }
        })
        .collect();
    let detector = ObfuscationDetector::default();
    let flags = detector
        .detect(&pairs, &array![[2.5, 0.1, 0.0], [2.5, 0.1, 5.0]])
        .unwrap();
    assert_eq!(flags, vec![false, true]);
}

#[test]
fn test_correction_restores_attribution() {
    let corpus = common::synthetic_corpus(6, 4, true);
    let rounds = Partitioner::default()
        .create_pairing_splits(
            &corpus,
            &PairingConfig {
                num_authors: 6,
                ..PairingConfig::default()
            },
        )
        .unwrap();
    assert_eq!(rounds.len(), 6);

    let always = DeobfuscationPipeline::new(DeobfuscationMode::Always);
    let precision = deobfuscation_precision_at_rank(&rounds, &knn(), &always).unwrap();
    assert_eq!(precision, vec![1.0; 6]);
}

#[test]
fn test_every_mode_yields_a_valid_curve() {
    let corpus = common::synthetic_corpus(5, 4, true);
    let config = EvaluationConfig {
        num_authors: 5,
        ..EvaluationConfig::default()
    };
    let curves =
        deobfuscation_experiment(&corpus, &knn(), &config, 1, &DeobfuscationMode::ALL).unwrap();
    assert_eq!(curves.len(), 3);
    for (curve, mode) in curves.iter().zip(DeobfuscationMode::ALL) {
        assert_eq!(curve.mode, Some(mode));
        assert_eq!(curve.precision.len(), 5);
        assert!(curve.precision.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*curve.precision.last().unwrap(), 1.0);
    }
    assert!(curves[2].mean >= curves[0].mean);
}
