//! Run configuration: a JSON file, overridden by command-line flags.
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use quill_classifiers::config::{ModelConfig, ModelType};
use quill_classifiers::experiment::{EvaluationConfig, Intensity};

/// Parameters shared by every `quill` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub evaluation: EvaluationConfig,
    /// Strategy used by `rank`, `select`, `features` and `deobfuscate`.
    pub model: ModelConfig,
    /// Strategies compared by `survey`.
    pub survey_models: Vec<ModelType>,
    /// Restrict the corpus to these feature groups before anything else.
    pub groups: Option<Vec<String>>,
    /// Author samples drawn for the de-obfuscation rounds.
    pub deobfuscation_samples: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            evaluation: EvaluationConfig::default(),
            model: ModelConfig::default(),
            survey_models: vec![
                ModelType::KNeighbors {
                    n_neighbors: 4,
                    p: 1.0,
                },
                ModelType::default(),
            ],
            groups: None,
            deobfuscation_samples: 1,
        }
    }
}

/// Load a run configuration from a JSON file.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: RunConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

impl RunConfig {
    /// Config file named by `--config` (or defaults), with flags applied on top.
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let mut config = match get_if_present::<PathBuf>(matches, "config") {
            Some(path) => {
                log::info!("Using config: {:?}", path);
                load_run_config(path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(matches)?;
        Ok(config)
    }

    fn apply_overrides(&mut self, matches: &ArgMatches) -> Result<()> {
        if flag_set(matches, "heavy") {
            self.evaluation.intensity = Intensity::Heavy;
        }
        if flag_set(matches, "attack") {
            self.evaluation.attack = true;
        }
        if let Some(&n) = get_if_present::<usize>(matches, "authors") {
            self.evaluation.num_authors = n;
        }
        if let Some(&seed) = get_if_present::<u64>(matches, "seed") {
            self.evaluation.seed = seed;
        }
        if let Some(&samples) = get_if_present::<usize>(matches, "samples") {
            self.deobfuscation_samples = samples;
        }
        if let Some(groups) = get_many_if_present::<String>(matches, "groups") {
            self.groups = Some(groups.cloned().collect());
        }
        if let Some(name) = get_if_present::<String>(matches, "model") {
            let model_type = ModelType::from_str(name).map_err(anyhow::Error::msg)?;
            self.model = ModelConfig::new(model_type);
        }
        if let Some(names) = get_many_if_present::<String>(matches, "models") {
            self.survey_models = names
                .map(|n| ModelType::from_str(n).map_err(anyhow::Error::msg))
                .collect::<Result<_>>()?;
        }
        Ok(())
    }
}

// Subcommands define different flags; absent ids read as unset.
fn flag_set(matches: &ArgMatches, id: &str) -> bool {
    get_if_present::<bool>(matches, id).copied().unwrap_or(false)
}

fn get_if_present<'a, T: Clone + Send + Sync + 'static>(
    matches: &'a ArgMatches,
    id: &str,
) -> Option<&'a T> {
    matches.try_get_one::<T>(id).ok().flatten()
}

fn get_many_if_present<'a, T: Clone + Send + Sync + 'static>(
    matches: &'a ArgMatches,
    id: &str,
) -> Option<clap::parser::ValuesRef<'a, T>> {
    matches.try_get_many::<T>(id).ok().flatten()
}
