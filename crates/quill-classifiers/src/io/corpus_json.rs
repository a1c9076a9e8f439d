//! JSON corpus reader.
//!
//! ```json
//! {
//!   "feature_groups": [{"name": "word_length", "width": 2}, ...],
//!   "authors": {"alice": {"alice_01": {"word_length": [0.1, 0.2], ...}}}
//! }
//! ```
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data_handling::{Corpus, FeatureGroup, FeatureLayout};

type GroupedDocuments = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<f64>>>>;

#[derive(Debug, Deserialize)]
struct CorpusFile {
    feature_groups: Vec<FeatureGroup>,
    authors: GroupedDocuments,
}

/// Parse a corpus from a JSON string.
pub fn parse_corpus_json(text: &str) -> Result<Corpus> {
    let file: CorpusFile = serde_json::from_str(text).context("Failed to parse corpus JSON")?;
    let layout = FeatureLayout::new(file.feature_groups)?;
    let corpus = Corpus::from_grouped(layout, file.authors)?;
    Ok(corpus)
}

/// Read a corpus from a JSON file.
pub fn read_corpus_json<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to open corpus file: {}", path.as_ref().display()))?;
    let corpus = parse_corpus_json(&text)
        .with_context(|| format!("Invalid corpus file: {}", path.as_ref().display()))?;
    log::info!(
        "Loaded {} documents by {} authors ({} features) from {}",
        corpus.n_documents(),
        corpus.n_authors(),
        corpus.width(),
        path.as_ref().display()
    );
    Ok(corpus)
}
