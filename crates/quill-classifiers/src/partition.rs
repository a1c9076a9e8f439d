//! Seeded train / held-out partitioning of a corpus.
//!
//! Every public call builds a fresh generator from the partitioner's seed, so
//! identical arguments give identical splits no matter which calls came
//! before. Authors and documents are drawn from sorted collections only.
use std::collections::BTreeMap;

use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::data_handling::{
    has_any_tag, Corpus, LabeledSet, ObfuscationPair, PairedSplit, Split, DEFAULT_ATTACK_TAG,
    DEFAULT_EXCLUDED_TAGS,
};
use crate::error::{EvalError, Result};

pub const DEFAULT_SEED: u64 = 1;

fn tags(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|t| t.to_string()).collect()
}

/// Plain attribution: hold out one clean document per author per split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationConfig {
    pub samples: usize,
    pub num_authors: usize,
    pub splits_per_sample: usize,
    pub excluded_tags: Vec<String>,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            samples: 2,
            num_authors: 40,
            splits_per_sample: 1,
            excluded_tags: tags(&DEFAULT_EXCLUDED_TAGS),
        }
    }
}

/// Adversarial attribution: train on clean texts, hold out attack texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackConfig {
    pub samples: usize,
    pub num_authors: usize,
    pub excluded_tags: Vec<String>,
    pub attack_tags: Vec<String>,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            samples: 1,
            num_authors: 40,
            excluded_tags: tags(&["verification", "imitation"]),
            attack_tags: tags(&[DEFAULT_ATTACK_TAG]),
        }
    }
}

/// Leave-one-out rounds with (regular, obfuscated) pairs from the other authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingConfig {
    pub samples: usize,
    pub num_authors: usize,
    pub excluded_tags: Vec<String>,
    pub attack_tags: Vec<String>,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            samples: 1,
            num_authors: 40,
            excluded_tags: tags(&DEFAULT_EXCLUDED_TAGS),
            attack_tags: tags(&[DEFAULT_ATTACK_TAG]),
        }
    }
}

/// Owner of the seed all splits are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    seed: u64,
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

/// Accumulates rows and labels for one side of a split.
struct SideBuilder<'a> {
    rows: Vec<&'a [f64]>,
    labels: Vec<String>,
}

impl<'a> SideBuilder<'a> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn push(&mut self, row: &'a [f64], label: &str) {
        self.rows.push(row);
        self.labels.push(label.to_string());
    }

    fn build(self, width: usize) -> Result<LabeledSet> {
        LabeledSet::from_rows(self.rows, self.labels, width)
    }
}

impl Partitioner {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    /// Draw `n` distinct authors from the sorted candidate list.
    fn sample_authors<'a>(
        rng: &mut ChaCha8Rng,
        candidates: &[&'a str],
        n: usize,
    ) -> Result<Vec<&'a str>> {
        if candidates.is_empty() {
            return Err(EvalError::EmptyAuthorSet);
        }
        if n > candidates.len() {
            return Err(EvalError::TooManyAuthors {
                requested: n,
                available: candidates.len(),
            });
        }
        Ok(index::sample(rng, candidates.len(), n)
            .into_iter()
            .map(|i| candidates[i])
            .collect())
    }

    /// Draw all author sets up front, in order.
    fn sample_author_sets<'a>(
        rng: &mut ChaCha8Rng,
        candidates: &[&'a str],
        n: usize,
        samples: usize,
    ) -> Result<Vec<Vec<&'a str>>> {
        (0..samples)
            .map(|_| Self::sample_authors(rng, candidates, n))
            .collect()
    }

    /// Rotation splits: `samples` author sets × `splits_per_sample` splits.
    ///
    /// For split `k` of a sample, each author's document at position `k` of
    /// their shuffled clean document list is held out and the rest is trained
    /// on. Document orders are reshuffled for every sample.
    pub fn create_splits(&self, corpus: &Corpus, config: &RotationConfig) -> Result<Vec<Split>> {
        let mut rng = self.rng();

        let mut orderings: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (author, documents) in corpus.iter() {
            let clean: Vec<&str> = documents
                .keys()
                .map(String::as_str)
                .filter(|doc| !has_any_tag(doc, &config.excluded_tags))
                .collect();
            if clean.len() < config.splits_per_sample {
                return Err(EvalError::InsufficientDocuments {
                    author: author.clone(),
                    available: clean.len(),
                    requested: config.splits_per_sample,
                });
            }
            orderings.insert(author.as_str(), clean);
        }

        let candidates: Vec<&str> = orderings.keys().copied().collect();
        let author_sets =
            Self::sample_author_sets(&mut rng, &candidates, config.num_authors, config.samples)?;

        let mut splits = Vec::with_capacity(config.samples * config.splits_per_sample);
        for subset in author_sets {
            let mut in_sorted_order = subset.clone();
            in_sorted_order.sort_unstable();
            for author in &in_sorted_order {
                if let Some(docs) = orderings.get_mut(author) {
                    docs.shuffle(&mut rng);
                }
            }

            for split_index in 0..config.splits_per_sample {
                let mut train = SideBuilder::new();
                let mut held_out = SideBuilder::new();
                for &author in &subset {
                    let documents = corpus.documents(author).ok_or(EvalError::EmptyAuthorSet)?;
                    for (position, doc) in orderings[author].iter().enumerate() {
                        let vector = documents[*doc].as_slice();
                        if position == split_index {
                            held_out.push(vector, author);
                        } else {
                            train.push(vector, author);
                        }
                    }
                }
                splits.push(Split {
                    train: train.build(corpus.width())?,
                    held_out: held_out.build(corpus.width())?,
                });
            }
        }

        log::debug!(
            "Created {} rotation splits over {} authors (seed {})",
            splits.len(),
            config.num_authors,
            self.seed
        );
        Ok(splits)
    }

    /// Attack splits: one per author sample. Attack-tagged documents are held
    /// out; the remaining non-excluded documents are trained on.
    pub fn create_splits_attack(&self, corpus: &Corpus, config: &AttackConfig) -> Result<Vec<Split>> {
        let mut rng = self.rng();
        let candidates = corpus.author_names();
        let author_sets =
            Self::sample_author_sets(&mut rng, &candidates, config.num_authors, config.samples)?;

        let mut splits = Vec::with_capacity(config.samples);
        for subset in author_sets {
            let mut train = SideBuilder::new();
            let mut held_out = SideBuilder::new();
            for author in subset {
                let documents = corpus.documents(author).ok_or(EvalError::EmptyAuthorSet)?;
                for (doc, vector) in documents {
                    if has_any_tag(doc, &config.attack_tags) {
                        held_out.push(vector, author);
                    } else if !has_any_tag(doc, &config.excluded_tags) {
                        train.push(vector, author);
                    }
                }
            }
            splits.push(Split {
                train: train.build(corpus.width())?,
                held_out: held_out.build(corpus.width())?,
            });
        }
        log::debug!("Created {} attack splits (seed {})", splits.len(), self.seed);
        Ok(splits)
    }

    /// Leave-one-out rounds for the de-obfuscation experiment.
    ///
    /// For every author of every sampled set, the round holds out that
    /// author's obfuscated documents, trains on the clean documents of the
    /// whole set and pairs each other author's clean documents with each of
    /// their obfuscated ones. Rounds whose excluded author has no obfuscated
    /// document are skipped.
    pub fn create_pairing_splits(
        &self,
        corpus: &Corpus,
        config: &PairingConfig,
    ) -> Result<Vec<PairedSplit>> {
        let mut rng = self.rng();
        let candidates = corpus.author_names();
        let author_sets =
            Self::sample_author_sets(&mut rng, &candidates, config.num_authors, config.samples)?;

        // clean and obfuscated documents per author, in document order
        let mut partitioned: BTreeMap<&str, (Vec<&[f64]>, Vec<&[f64]>)> = BTreeMap::new();
        for (author, documents) in corpus.iter() {
            let mut clean = Vec::new();
            let mut obfuscated = Vec::new();
            for (doc, vector) in documents {
                if has_any_tag(doc, &config.attack_tags) {
                    obfuscated.push(vector.as_slice());
                } else if !has_any_tag(doc, &config.excluded_tags) {
                    clean.push(vector.as_slice());
                }
            }
            partitioned.insert(author.as_str(), (clean, obfuscated));
        }

        let mut rounds = Vec::new();
        for authorset in &author_sets {
            for &excluded in authorset {
                let (own_clean, own_obfuscated) = &partitioned[excluded];
                if own_obfuscated.is_empty() {
                    log::warn!(
                        "Skipping round for author {}: no obfuscated document",
                        excluded
                    );
                    continue;
                }

                let mut train = SideBuilder::new();
                let mut held_out = SideBuilder::new();
                for &row in own_obfuscated {
                    held_out.push(row, excluded);
                }
                for &row in own_clean {
                    train.push(row, excluded);
                }

                let mut pairs = Vec::new();
                for &other in authorset.iter().filter(|&&a| a != excluded) {
                    let (clean, obfuscated) = &partitioned[other];
                    for &row in clean {
                        train.push(row, other);
                    }
                    if clean.is_empty() || obfuscated.is_empty() {
                        log::debug!("Author {} contributes no obfuscation pair", other);
                        continue;
                    }
                    for obf in obfuscated {
                        pairs.push(ObfuscationPair {
                            regular: clean.iter().map(|r| r.to_vec()).collect(),
                            obfuscated: obf.to_vec(),
                        });
                    }
                }

                rounds.push(PairedSplit {
                    split: Split {
                        train: train.build(corpus.width())?,
                        held_out: held_out.build(corpus.width())?,
                    },
                    excluded_author: excluded.to_string(),
                    pairs,
                });
            }
        }
        log::debug!(
            "Created {} leave-one-out rounds (seed {})",
            rounds.len(),
            self.seed
        );
        Ok(rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::FeatureLayout;

    fn corpus(authors: usize, docs: usize) -> Corpus {
        let mut map = BTreeMap::new();
        for a in 0..authors {
            let mut documents = BTreeMap::new();
            for d in 0..docs {
                let v = (a * 10 + d) as f64;
                documents.insert(format!("a{}_{:02}", a, d), vec![v; 5]);
            }
            documents.insert(format!("a{}_verification", a), vec![-1.0; 5]);
            map.insert(format!("author{}", a), documents);
        }
        Corpus::new(FeatureLayout::ungrouped(5), map).unwrap()
    }

    fn rotation(num_authors: usize, splits: usize) -> RotationConfig {
        RotationConfig {
            samples: 1,
            num_authors,
            splits_per_sample: splits,
            ..RotationConfig::default()
        }
    }

    #[test]
    fn rotation_sizes_match_authors_and_documents() {
        let c = corpus(3, 4);
        let splits = Partitioner::default()
            .create_splits(&c, &rotation(3, 1))
            .unwrap();
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].train.len(), 9);
        assert_eq!(splits[0].held_out.len(), 3);
        assert!(!splits[0]
            .train
            .features
            .iter()
            .chain(splits[0].held_out.features.iter())
            .any(|&v| v == -1.0));
    }

    #[test]
    fn split_index_rotates_the_held_out_document() {
        let c = corpus(3, 4);
        let splits = Partitioner::default()
            .create_splits(&c, &rotation(3, 2))
            .unwrap();
        assert_eq!(splits.len(), 2);
        for row in 0..3 {
            assert_ne!(
                splits[0].held_out.features.row(row),
                splits[1].held_out.features.row(row)
            );
            assert_eq!(splits[0].held_out.labels[row], splits[1].held_out.labels[row]);
        }
    }

    #[test]
    fn insufficient_documents_names_the_author() {
        let c = corpus(2, 2);
        let err = Partitioner::default()
            .create_splits(&c, &rotation(2, 3))
            .unwrap_err();
        match err {
            EvalError::InsufficientDocuments {
                author,
                available,
                requested,
            } => {
                assert_eq!(author, "author0");
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn too_many_authors_is_rejected() {
        let c = corpus(2, 2);
        assert!(matches!(
            Partitioner::default().create_splits(&c, &rotation(5, 1)),
            Err(EvalError::TooManyAuthors {
                requested: 5,
                available: 2
            })
        ));
    }

    #[test]
    fn empty_corpus_has_no_authors() {
        let c = Corpus::new(FeatureLayout::ungrouped(5), BTreeMap::new()).unwrap();
        let config = AttackConfig {
            num_authors: 1,
            ..AttackConfig::default()
        };
        assert!(matches!(
            Partitioner::default().create_splits_attack(&c, &config),
            Err(EvalError::EmptyAuthorSet)
        ));
    }

    #[test]
    fn reseeding_makes_calls_order_independent() {
        let c = corpus(6, 5);
        let p = Partitioner::new(42);
        let config = RotationConfig {
            samples: 2,
            num_authors: 4,
            splits_per_sample: 2,
            ..RotationConfig::default()
        };
        let first = p.create_splits(&c, &config).unwrap();
        let _ = p.create_splits_attack(&c, &AttackConfig {
            num_authors: 3,
            ..AttackConfig::default()
        });
        let second = p.create_splits(&c, &config).unwrap();
        assert_eq!(first, second);
    }
}
