use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use quill_cli::cli::build_cli;
use quill_cli::experiments::config::RunConfig;
use quill_cli::experiments::run::{
    load_corpus, parse_modes, run_deobfuscate, run_features, run_rank, run_select, run_survey,
    write_json, RankingMethod, SearchDirection,
};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("QUILL_LOG", "error,quill=info"))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("survey", sub_m)) => handle_survey(sub_m),
        Some(("rank", sub_m)) => handle_rank(sub_m),
        Some(("select", sub_m)) => handle_select(sub_m),
        Some(("features", sub_m)) => handle_features(sub_m),
        Some(("deobfuscate", sub_m)) => handle_deobfuscate(sub_m),
        _ => unreachable!("Unknown subcommand"),
    }
}

fn output_path(matches: &ArgMatches) -> Option<&PathBuf> {
    matches.get_one::<PathBuf>("output")
}

fn corpus_path(matches: &ArgMatches) -> &PathBuf {
    matches
        .get_one::<PathBuf>("corpus")
        .expect("corpus is a required argument")
}

fn handle_survey(matches: &ArgMatches) -> Result<()> {
    let config = RunConfig::from_arguments(matches)?;
    let corpus = load_corpus(corpus_path(matches), &config)?;
    let report = run_survey(&corpus, &config)?;
    write_json(&report, output_path(matches).map(|p| p.as_path()))
}

fn handle_rank(matches: &ArgMatches) -> Result<()> {
    let config = RunConfig::from_arguments(matches)?;
    let corpus = load_corpus(corpus_path(matches), &config)?;
    let curve = run_rank(&corpus, &config)?;
    write_json(&curve, output_path(matches).map(|p| p.as_path()))
}

fn handle_select(matches: &ArgMatches) -> Result<()> {
    let config = RunConfig::from_arguments(matches)?;
    let corpus = load_corpus(corpus_path(matches), &config)?;
    let direction = SearchDirection::from_str(
        matches
            .get_one::<String>("direction")
            .map(|s| s.as_str())
            .unwrap_or("bottom-up"),
    )
    .map_err(anyhow::Error::msg)?;
    let start: Option<Vec<String>> = matches
        .get_many::<String>("start")
        .map(|groups| groups.cloned().collect());
    let result = run_select(&corpus, &config, direction, start.as_deref())?;
    write_json(&result, output_path(matches).map(|p| p.as_path()))
}

fn handle_features(matches: &ArgMatches) -> Result<()> {
    let config = RunConfig::from_arguments(matches)?;
    let corpus = load_corpus(corpus_path(matches), &config)?;
    let method = RankingMethod::from_str(
        matches
            .get_one::<String>("method")
            .map(|s| s.as_str())
            .unwrap_or("solo"),
    )
    .map_err(anyhow::Error::msg)?;
    let ranking = run_features(&corpus, &config, method)?;
    write_json(&ranking, output_path(matches).map(|p| p.as_path()))
}

fn handle_deobfuscate(matches: &ArgMatches) -> Result<()> {
    let config = RunConfig::from_arguments(matches)?;
    let corpus = load_corpus(corpus_path(matches), &config)?;
    let modes = parse_modes(
        matches
            .get_one::<String>("mode")
            .map(|s| s.as_str())
            .unwrap_or("all"),
    )?;
    let curves = run_deobfuscate(&corpus, &config, &modes)?;
    write_json(&curves, output_path(matches).map(|p| p.as_path()))
}
