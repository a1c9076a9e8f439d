use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

use quill_classifiers::config::ModelType;
use quill_classifiers::deobfuscation::DeobfuscationMode;
use quill_classifiers::experiment::Intensity;
use quill_cli::cli::build_cli;
use quill_cli::experiments::config::{load_run_config, RunConfig};
use quill_cli::experiments::run::{
    load_corpus, run_deobfuscate, run_features, run_rank, run_select, run_survey, write_json,
    RankingMethod, SearchDirection,
};

/// Four well separated authors; `style` carries the signal, `noise` does not.
fn write_corpus(dir: &Path) -> PathBuf {
    let mut authors = serde_json::Map::new();
    for a in 0..4 {
        let name = format!("author{}", a);
        let mut docs = serde_json::Map::new();
        for d in 0..4 {
            let jitter = d as f64 * 0.1;
            docs.insert(
                format!("{}_{:02}", name, d),
                json!({"style": [a as f64 * 10.0 + jitter, a as f64 * 5.0 - jitter], "noise": [d as f64]}),
            );
        }
        docs.insert(
            format!("{}_obfuscation", name),
            json!({"style": [a as f64 * 10.0 + 3.0, a as f64 * 5.0 + 3.0], "noise": [0.0]}),
        );
        authors.insert(name, Value::Object(docs));
    }
    let corpus = json!({
        "feature_groups": [{"name": "style", "width": 2}, {"name": "noise", "width": 1}],
        "authors": authors,
    });
    let path = dir.join("corpus.json");
    fs::write(&path, serde_json::to_string(&corpus).unwrap()).unwrap();
    path
}

fn small_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.evaluation.num_authors = 4;
    config.model = quill_classifiers::config::ModelConfig::new("knn".parse().unwrap());
    config
}

#[test]
fn flags_override_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("run.json");
    fs::write(
        &config_path,
        r#"{"evaluation": {"num_authors": 7, "seed": 3}, "deobfuscation_samples": 2}"#,
    )
    .unwrap();

    let from_file = load_run_config(&config_path).unwrap();
    assert_eq!(from_file.evaluation.num_authors, 7);
    assert_eq!(from_file.deobfuscation_samples, 2);
    assert_eq!(from_file.survey_models.len(), 2);

    let matches = build_cli()
        .try_get_matches_from([
            "quill",
            "rank",
            "corpus.json",
            "--config",
            config_path.to_str().unwrap(),
            "--authors",
            "5",
            "--heavy",
            "--attack",
            "--model",
            "tree",
            "--groups",
            "style,noise",
        ])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();
    let config = RunConfig::from_arguments(sub).unwrap();
    assert_eq!(config.evaluation.num_authors, 5);
    assert_eq!(config.evaluation.seed, 3);
    assert_eq!(config.evaluation.intensity, Intensity::Heavy);
    assert!(config.evaluation.attack);
    assert!(matches!(config.model.model_type, ModelType::DecisionTree { .. }));
    assert_eq!(
        config.groups,
        Some(vec!["style".to_string(), "noise".to_string()])
    );
}

#[test]
fn missing_config_file_is_reported() {
    let err = load_run_config("/nonexistent/run.json").unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read config"));
}

#[test]
fn unknown_model_is_rejected_by_the_parser() {
    let result = build_cli().try_get_matches_from(["quill", "rank", "c.json", "--model", "mlp"]);
    assert!(result.is_err());
}

#[test]
fn rank_reports_a_complete_curve() {
    let dir = TempDir::new().unwrap();
    let config = small_config();
    let corpus = load_corpus(write_corpus(dir.path()), &config).unwrap();
    let curve = run_rank(&corpus, &config).unwrap();
    assert_eq!(curve.precision.len(), 4);
    assert!((curve.precision[3] - 1.0).abs() < 1e-12);
    assert!(curve.precision.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn survey_scores_every_configured_model() {
    let dir = TempDir::new().unwrap();
    let config = small_config();
    let corpus = load_corpus(write_corpus(dir.path()), &config).unwrap();
    let report = run_survey(&corpus, &config).unwrap();
    assert_eq!(report.scores.len(), 2);
    assert!((report.prior - 0.25).abs() < 1e-12);
}

#[test]
fn group_restriction_applies_on_load() {
    let dir = TempDir::new().unwrap();
    let mut config = small_config();
    config.groups = Some(vec!["noise".to_string()]);
    let corpus = load_corpus(write_corpus(dir.path()), &config).unwrap();
    assert_eq!(corpus.width(), 1);

    config.groups = Some(vec!["rhythm".to_string()]);
    assert!(load_corpus(write_corpus(dir.path()), &config).is_err());
}

#[test]
fn selection_and_rankings_cover_all_groups() {
    let dir = TempDir::new().unwrap();
    let config = small_config();
    let corpus = load_corpus(write_corpus(dir.path()), &config).unwrap();

    let result = run_select(&corpus, &config, SearchDirection::BottomUp, None).unwrap();
    assert_eq!(result.direction, "bottom-up");
    assert!(result.selection.contains(&"style".to_string()));

    let ranking = run_features(&corpus, &config, RankingMethod::Solo).unwrap();
    assert_eq!(ranking.ranking.len(), 2);
    assert_eq!(ranking.ranking[0].group, "style");
}

#[test]
fn deobfuscation_writes_one_curve_per_mode() {
    let dir = TempDir::new().unwrap();
    let config = small_config();
    let corpus = load_corpus(write_corpus(dir.path()), &config).unwrap();
    let curves = run_deobfuscate(
        &corpus,
        &config,
        &[DeobfuscationMode::Never, DeobfuscationMode::Always],
    )
    .unwrap();
    assert_eq!(curves.len(), 2);
    assert_eq!(curves[1].mode, Some(DeobfuscationMode::Always));

    let output = dir.path().join("curves.json");
    write_json(&curves, Some(&output)).unwrap();
    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written[0]["mode"], "never");
}
