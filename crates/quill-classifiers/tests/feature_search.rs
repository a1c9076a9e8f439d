mod common;

use quill_classifiers::error::EvalError;
use quill_classifiers::experiment::EvaluationConfig;
use quill_classifiers::feature_selection::greedy::{bottom_up, top_down, UNATTAINABLE_PRECISION};
use quill_classifiers::feature_selection::ranking::{rank_features_dropout, rank_features_solo};
use quill_classifiers::feature_selection::{CrossValidationScorer, SubsetScorer};
use quill_classifiers::strategy::ModelStrategy;

fn setup() -> (quill_classifiers::data_handling::Corpus, ModelStrategy, EvaluationConfig) {
    let corpus = common::synthetic_corpus(6, 4, false);
    let knn = ModelStrategy::from_model_type("knn".parse().unwrap());
    let config = EvaluationConfig {
        num_authors: 6,
        ..EvaluationConfig::default()
    };
    (corpus, knn, config)
}

#[test]
fn test_bottom_up_never_loses_precision() {
    let (corpus, knn, config) = setup();
    let scorer = CrossValidationScorer::new(&corpus, &knn, &config);
    let groups = common::group_names();

    let state = bottom_up(&scorer, &groups, &[]).unwrap();
    assert_eq!(state.start_precision(), UNATTAINABLE_PRECISION);
    assert!(!state.selection.is_empty());
    assert!(state.steps.len() <= groups.len());
    assert!(state
        .steps
        .windows(2)
        .all(|w| w[0].precision < w[1].precision));
    assert_eq!(state.precision, scorer.score(&state.selection).unwrap());
}

#[test]
fn test_bottom_up_from_seed() {
    let (corpus, knn, config) = setup();
    let scorer = CrossValidationScorer::new(&corpus, &knn, &config);
    let seed = vec!["unused".to_string()];

    let state = bottom_up(&scorer, &common::group_names(), &seed).unwrap();
    assert_eq!(state.selection[0], "unused");
    assert!(state.precision >= state.start_precision());
}

#[test]
fn test_top_down_never_loses_precision() {
    let (corpus, knn, config) = setup();
    let scorer = CrossValidationScorer::new(&corpus, &knn, &config);
    let groups = common::group_names();

    let state = top_down(&scorer, &groups, None).unwrap();
    assert!(state.precision >= state.start_precision());
    assert!(state.steps.len() < groups.len());
    assert!(!state.selection.is_empty());
    let result = state.into_result("top-down");
    assert_eq!(result.direction, "top-down");
}

#[test]
fn test_search_is_deterministic() {
    let (corpus, knn, config) = setup();
    let scorer = CrossValidationScorer::new(&corpus, &knn, &config);
    let groups = common::group_names();
    let a = bottom_up(&scorer, &groups, &[]).unwrap();
    let b = bottom_up(&scorer, &groups, &[]).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_rankings_cover_every_group() {
    let (corpus, knn, config) = setup();
    let scorer = CrossValidationScorer::new(&corpus, &knn, &config);
    let groups = common::group_names();

    let solo = rank_features_solo(&scorer, &groups).unwrap();
    assert_eq!(solo.ranking.len(), groups.len());
    assert!(solo.ranking.windows(2).all(|w| w[0].score >= w[1].score));
    // an all-zero group carries no information
    assert_eq!(solo.ranking.last().unwrap().group, "unused");

    let dropout = rank_features_dropout(&scorer, &groups).unwrap();
    assert_eq!(dropout.baseline, Some(1.0));
    assert!(dropout.ranking.windows(2).all(|w| w[0].score <= w[1].score));
}

#[test]
fn test_unknown_group_fails_the_scorer() {
    let (corpus, knn, config) = setup();
    let scorer = CrossValidationScorer::new(&corpus, &knn, &config);
    assert!(matches!(
        scorer.score(&["stylometry".to_string()]),
        Err(EvalError::UnknownFeatureGroup(_))
    ));
    assert!(matches!(scorer.score(&[]), Err(EvalError::EmptySelection)));
}
