#![allow(dead_code)]

use std::collections::BTreeMap;

use quill_classifiers::data_handling::{Corpus, FeatureGroup, FeatureLayout};

/// Feature groups of the synthetic corpora. `unused` is always zero.
pub fn layout() -> FeatureLayout {
    FeatureLayout::new(vec![
        FeatureGroup::new("word_length", 2),
        FeatureGroup::new("readability", 2),
        FeatureGroup::new("legomena", 1),
        FeatureGroup::new("unused", 1),
    ])
    .unwrap()
}

pub fn group_names() -> Vec<String> {
    layout().group_names()
}

/// Shift every obfuscated document gets relative to its author's style.
pub const OBFUSCATION_SHIFT: [f64; 6] = [1.0, 1.0, -1.0, 0.5, 0.8, 0.0];

fn center(author: usize) -> [f64; 6] {
    let a = author as f64;
    [a * 3.0, (author % 3) as f64 * 2.0, a.sin() * 2.0, a * -1.5, a * 0.5, 0.0]
}

fn jitter(author: usize, doc: usize, feature: usize) -> f64 {
    ((author * 7 + doc * 13 + feature * 5) % 10) as f64 / 50.0 - 0.1
}

fn vector(author: usize, doc: usize, shift: Option<&[f64; 6]>) -> Vec<f64> {
    center(author)
        .iter()
        .enumerate()
        .map(|(f, c)| {
            let s = shift.map_or(0.0, |s| s[f]);
            if f == 5 {
                0.0
            } else {
                c + s + jitter(author, doc, f)
            }
        })
        .collect()
}

/// `n_authors` well separated authors with `n_docs` regular documents each,
/// a verification document each and, optionally, one obfuscated document.
pub fn synthetic_corpus(n_authors: usize, n_docs: usize, obfuscated: bool) -> Corpus {
    let mut authors = BTreeMap::new();
    for a in 0..n_authors {
        let mut documents = BTreeMap::new();
        for d in 0..n_docs {
            documents.insert(format!("author{:02}_{:02}", a, d), vector(a, d, None));
        }
        documents.insert(
            format!("author{:02}_verification", a),
            vec![-50.0; 6],
        );
        if obfuscated {
            documents.insert(
                format!("author{:02}_obfuscation", a),
                vector(a, n_docs, Some(&OBFUSCATION_SHIFT)),
            );
        }
        authors.insert(format!("author{:02}", a), documents);
    }
    Corpus::new(layout(), authors).unwrap()
}

/// Three authors with four documents of length five, values unique per document.
pub fn small_corpus() -> Corpus {
    let mut authors = BTreeMap::new();
    for a in 0..3 {
        let mut documents = BTreeMap::new();
        for d in 0..4 {
            let base = (a * 100 + d * 10) as f64;
            documents.insert(
                format!("{}_{}", a, d),
                (0..5).map(|f| base + f as f64).collect(),
            );
        }
        authors.insert(format!("author{}", a), documents);
    }
    Corpus::new(FeatureLayout::ungrouped(5), authors).unwrap()
}
