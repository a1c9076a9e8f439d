//! TSV corpus reader.
//!
//! Header: `author`, `document`, then one column per feature named
//! `<group>:<index>`. Groups take the order of their first column; a column
//! without a `:` is a group of width one.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

use crate::data_handling::{Corpus, FeatureGroup, FeatureLayout};

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

fn group_of(header: &str) -> &str {
    header.rsplit_once(':').map_or(header, |(group, _)| group)
}

/// Read a corpus from a tab-separated file.
pub fn read_corpus_tsv<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open corpus file: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read corpus header row")?
        .clone();
    let author_idx =
        find_column(&headers, "author").ok_or_else(|| anyhow!("Missing 'author' column"))?;
    let document_idx =
        find_column(&headers, "document").ok_or_else(|| anyhow!("Missing 'document' column"))?;

    // feature columns grouped by name, groups in order of first appearance
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if idx == author_idx || idx == document_idx {
            continue;
        }
        let name = group_of(header);
        match groups.iter_mut().find(|(g, _)| g.as_str() == name) {
            Some((_, columns)) => columns.push(idx),
            None => groups.push((name.to_string(), vec![idx])),
        }
    }
    if groups.is_empty() {
        return Err(anyhow!("No feature columns detected in corpus header"));
    }

    let mut authors: BTreeMap<String, BTreeMap<String, Vec<f64>>> = BTreeMap::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        let author = record.get(author_idx).unwrap_or_default().trim().to_string();
        let document = record.get(document_idx).unwrap_or_default().trim().to_string();

        let mut vector = Vec::with_capacity(headers.len());
        for (_, columns) in &groups {
            for &idx in columns {
                let value = record
                    .get(idx)
                    .ok_or_else(|| anyhow!("Missing feature value at row {}", row_idx + 1))?;
                let parsed = value.trim().parse::<f64>().with_context(|| {
                    format!(
                        "Invalid feature '{}' at row {}",
                        headers.get(idx).unwrap_or(""),
                        row_idx + 1
                    )
                })?;
                vector.push(parsed);
            }
        }

        let documents = authors.entry(author.clone()).or_default();
        if documents.insert(document.clone(), vector).is_some() {
            return Err(anyhow!(
                "Duplicate document '{}' for author '{}' at row {}",
                document,
                author,
                row_idx + 1
            ));
        }
    }

    let layout = FeatureLayout::new(
        groups
            .into_iter()
            .map(|(name, columns)| FeatureGroup::new(name, columns.len()))
            .collect(),
    )?;
    let corpus = Corpus::new(layout, authors)?;
    log::info!(
        "Loaded {} documents by {} authors ({} features) from {}",
        corpus.n_documents(),
        corpus.n_authors(),
        corpus.width(),
        path.as_ref().display()
    );
    Ok(corpus)
}
