use anyhow::{Context, Result};

use quill_classifiers::config::ModelType;
use quill_classifiers::deobfuscation::DeobfuscationMode;
use quill_classifiers::experiment::{deobfuscation_experiment, survey, EvaluationConfig};
use quill_classifiers::io::read_corpus;
use quill_classifiers::strategy::{ModelStrategy, PredictionStrategy};

fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .context("usage: corpus_survey <corpus.json|corpus.tsv> [num_authors]")?;
    let num_authors: usize = match std::env::args().nth(2) {
        Some(n) => n.parse().context("num_authors must be a number")?,
        None => 10,
    };
    let corpus = read_corpus(&path)?;
    println!(
        "Loaded {} documents by {} authors, {} features",
        corpus.n_documents(),
        corpus.n_authors(),
        corpus.width()
    );

    let config = EvaluationConfig {
        num_authors,
        ..EvaluationConfig::default()
    };
    let strategies: Vec<Box<dyn PredictionStrategy>> = ["knn", "svm", "tree", "adaboost"]
        .iter()
        .map(|name| {
            let model: ModelType = name.parse().map_err(anyhow::Error::msg)?;
            Ok(Box::new(ModelStrategy::from_model_type(model)) as Box<dyn PredictionStrategy>)
        })
        .collect::<Result<_>>()?;

    let report = survey(&corpus, &strategies, &config)?;
    println!("Prior: {:.3}", report.prior);
    for score in &report.scores {
        println!("{:>10}: {:.3}", score.strategy, score.accuracy);
    }

    let curves = deobfuscation_experiment(
        &corpus,
        &ModelStrategy::default(),
        &config,
        1,
        &DeobfuscationMode::ALL,
    )?;
    for curve in curves {
        println!("{:?}: {:?}", curve.mode, curve.precision);
    }
    Ok(())
}
