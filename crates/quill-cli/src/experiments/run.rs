//! Command runners: load the corpus, run one experiment, return its report.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use quill_classifiers::data_handling::Corpus;
use quill_classifiers::deobfuscation::DeobfuscationMode;
use quill_classifiers::experiment::{deobfuscation_experiment, rank_experiment, survey};
use quill_classifiers::feature_selection::greedy::{bottom_up, top_down};
use quill_classifiers::feature_selection::ranking::{rank_features_dropout, rank_features_solo};
use quill_classifiers::feature_selection::CrossValidationScorer;
use quill_classifiers::io::read_corpus;
use quill_classifiers::report::{
    AccuracyReport, FeatureRanking, PrecisionCurve, SelectionResult,
};
use quill_classifiers::strategy::{ModelStrategy, PredictionStrategy};

use crate::experiments::config::RunConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    BottomUp,
    TopDown,
}

impl SearchDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDirection::BottomUp => "bottom-up",
            SearchDirection::TopDown => "top-down",
        }
    }
}

impl FromStr for SearchDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bottom-up" => Ok(SearchDirection::BottomUp),
            "top-down" => Ok(SearchDirection::TopDown),
            _ => Err(format!(
                "Unknown search direction: {}. Valid options are: bottom-up, top-down",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMethod {
    Solo,
    Dropout,
}

impl FromStr for RankingMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "solo" => Ok(RankingMethod::Solo),
            "dropout" => Ok(RankingMethod::Dropout),
            _ => Err(format!(
                "Unknown ranking method: {}. Valid options are: solo, dropout",
                s
            )),
        }
    }
}

/// `never`, `detect`, `always`, or `all` for every mode in order.
pub fn parse_modes(value: &str) -> Result<Vec<DeobfuscationMode>> {
    if value == "all" {
        return Ok(DeobfuscationMode::ALL.to_vec());
    }
    value
        .split(',')
        .map(|m| DeobfuscationMode::from_str(m.trim()).map_err(anyhow::Error::msg))
        .collect()
}

/// Corpus at `path`, restricted to the configured groups.
pub fn load_corpus<P: AsRef<Path>>(path: P, config: &RunConfig) -> Result<Corpus> {
    let corpus = read_corpus(&path)?;
    match &config.groups {
        Some(groups) => corpus
            .select_groups(groups)
            .with_context(|| format!("Failed to select feature groups {:?}", groups)),
        None => Ok(corpus),
    }
}

pub fn run_survey(corpus: &Corpus, config: &RunConfig) -> Result<AccuracyReport> {
    if config.survey_models.is_empty() {
        bail!("No models to survey");
    }
    let strategies: Vec<Box<dyn PredictionStrategy>> = config
        .survey_models
        .iter()
        .cloned()
        .map(|m| Box::new(ModelStrategy::from_model_type(m)) as Box<dyn PredictionStrategy>)
        .collect();
    Ok(survey(corpus, &strategies, &config.evaluation)?)
}

pub fn run_rank(corpus: &Corpus, config: &RunConfig) -> Result<PrecisionCurve> {
    let strategy = ModelStrategy::new(config.model.clone());
    Ok(rank_experiment(corpus, &strategy, &config.evaluation)?)
}

pub fn run_select(
    corpus: &Corpus,
    config: &RunConfig,
    direction: SearchDirection,
    start: Option<&[String]>,
) -> Result<SelectionResult> {
    let strategy = ModelStrategy::new(config.model.clone());
    let scorer = CrossValidationScorer::new(corpus, &strategy, &config.evaluation);
    let groups = corpus.layout().group_names();
    let state = match direction {
        SearchDirection::BottomUp => bottom_up(&scorer, &groups, start.unwrap_or(&[]))?,
        SearchDirection::TopDown => top_down(&scorer, &groups, start)?,
    };
    Ok(state.into_result(direction.as_str()))
}

pub fn run_features(
    corpus: &Corpus,
    config: &RunConfig,
    method: RankingMethod,
) -> Result<FeatureRanking> {
    let strategy = ModelStrategy::new(config.model.clone());
    let scorer = CrossValidationScorer::new(corpus, &strategy, &config.evaluation);
    let groups = corpus.layout().group_names();
    let ranking = match method {
        RankingMethod::Solo => rank_features_solo(&scorer, &groups)?,
        RankingMethod::Dropout => rank_features_dropout(&scorer, &groups)?,
    };
    Ok(ranking)
}

pub fn run_deobfuscate(
    corpus: &Corpus,
    config: &RunConfig,
    modes: &[DeobfuscationMode],
) -> Result<Vec<PrecisionCurve>> {
    let strategy = ModelStrategy::new(config.model.clone());
    Ok(deobfuscation_experiment(
        corpus,
        &strategy,
        &config.evaluation,
        config.deobfuscation_samples,
        modes,
    )?)
}

/// Pretty JSON to `output`, or stdout when `None`.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
            writer.flush()?;
            log::info!("Wrote results to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_expand_all() {
        assert_eq!(parse_modes("all").unwrap().len(), 3);
        assert_eq!(
            parse_modes("never,always").unwrap(),
            vec![DeobfuscationMode::Never, DeobfuscationMode::Always]
        );
        assert!(parse_modes("sometimes").is_err());
    }

    #[test]
    fn directions_parse() {
        assert_eq!(
            "top-down".parse::<SearchDirection>().unwrap(),
            SearchDirection::TopDown
        );
        assert!("sideways".parse::<SearchDirection>().is_err());
        assert!("solo".parse::<RankingMethod>().is_ok());
    }
}
