//! Data structures for corpora of per-author feature vectors and the
//! train/held-out splits derived from them.
//!
//! A `Corpus` is loaded once and treated as read-only. Authors and documents
//! live in sorted maps so every consumer iterates them in the same order,
//! which the seeded partitioner relies on for reproducible draws.
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Range;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Document name tags that never take part in plain attribution runs.
pub const DEFAULT_EXCLUDED_TAGS: [&str; 3] = ["verification", "imitation", "obfuscation"];
/// Document name tag marking an adversarially obfuscated text.
pub const DEFAULT_ATTACK_TAG: &str = "obfuscation";

/// `true` when `name` contains any of `tags` as a substring.
pub fn has_any_tag<S: AsRef<str>>(name: &str, tags: &[S]) -> bool {
    tags.iter().any(|tag| name.contains(tag.as_ref()))
}

/// A named, fixed-width slice of the full feature vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGroup {
    pub name: String,
    pub width: usize,
}

impl FeatureGroup {
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// Ordered feature groups, resolved once into column offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    groups: Vec<FeatureGroup>,
    offsets: Vec<usize>,
}

impl FeatureLayout {
    pub fn new(groups: Vec<FeatureGroup>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut offsets = Vec::with_capacity(groups.len());
        let mut offset = 0;
        for group in &groups {
            if !seen.insert(group.name.as_str()) {
                return Err(EvalError::InvalidConfig(format!(
                    "feature group '{}' is declared twice",
                    group.name
                )));
            }
            offsets.push(offset);
            offset += group.width;
        }
        Ok(Self { groups, offsets })
    }

    /// Layout with a single group spanning the whole vector.
    pub fn ungrouped(width: usize) -> Self {
        Self {
            groups: vec![FeatureGroup::new("features", width)],
            offsets: vec![0],
        }
    }

    pub fn groups(&self) -> &[FeatureGroup] {
        &self.groups
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    pub fn width(&self) -> usize {
        self.groups.iter().map(|g| g.width).sum()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    /// Column range occupied by the named group.
    pub fn range(&self, name: &str) -> Result<Range<usize>> {
        let idx = self
            .position(name)
            .ok_or_else(|| EvalError::UnknownFeatureGroup(name.to_string()))?;
        let start = self.offsets[idx];
        Ok(start..start + self.groups[idx].width)
    }

    /// Group indices for `names`, deduplicated and sorted into declared order.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        let mut indices = BTreeSet::new();
        for name in names {
            let idx = self
                .position(name.as_ref())
                .ok_or_else(|| EvalError::UnknownFeatureGroup(name.as_ref().to_string()))?;
            indices.insert(idx);
        }
        Ok(indices.into_iter().collect())
    }
}

/// Per-author documents, each a fixed-width feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    layout: FeatureLayout,
    authors: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

impl Corpus {
    /// Build a corpus, checking every vector against the layout width.
    pub fn new(
        layout: FeatureLayout,
        authors: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
    ) -> Result<Self> {
        let width = layout.width();
        for documents in authors.values() {
            for vector in documents.values() {
                if vector.len() != width {
                    return Err(EvalError::DimensionMismatch {
                        expected: width,
                        found: vector.len(),
                    });
                }
            }
        }
        Ok(Self { layout, authors })
    }

    /// Build a corpus from per-document named groups, concatenating them in
    /// layout order. Groups a document carries beyond the layout are ignored.
    pub fn from_grouped(
        layout: FeatureLayout,
        grouped: BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<f64>>>>,
    ) -> Result<Self> {
        let mut authors = BTreeMap::new();
        for (author, documents) in grouped {
            let mut flat_docs = BTreeMap::new();
            for (doc, groups) in documents {
                let mut vector = Vec::with_capacity(layout.width());
                for group in layout.groups() {
                    let values = groups.get(&group.name).ok_or_else(|| {
                        EvalError::InvalidConfig(format!(
                            "document '{}' of author '{}' lacks feature group '{}'",
                            doc, author, group.name
                        ))
                    })?;
                    if values.len() != group.width {
                        return Err(EvalError::DimensionMismatch {
                            expected: group.width,
                            found: values.len(),
                        });
                    }
                    vector.extend_from_slice(values);
                }
                flat_docs.insert(doc, vector);
            }
            authors.insert(author, flat_docs);
        }
        Self::new(layout, authors)
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn width(&self) -> usize {
        self.layout.width()
    }

    /// Author names in sorted order.
    pub fn author_names(&self) -> Vec<&str> {
        self.authors.keys().map(String::as_str).collect()
    }

    pub fn n_authors(&self) -> usize {
        self.authors.len()
    }

    pub fn n_documents(&self) -> usize {
        self.authors.values().map(BTreeMap::len).sum()
    }

    pub fn documents(&self, author: &str) -> Option<&BTreeMap<String, Vec<f64>>> {
        self.authors.get(author)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, Vec<f64>>)> {
        self.authors.iter()
    }

    /// Working corpus restricted to the named groups, concatenated in the
    /// order the layout declares them.
    pub fn select_groups<S: AsRef<str>>(&self, names: &[S]) -> Result<Corpus> {
        let indices = self.layout.resolve(names)?;
        if indices.is_empty() {
            return Err(EvalError::EmptySelection);
        }

        let groups: Vec<FeatureGroup> = indices
            .iter()
            .map(|&i| self.layout.groups[i].clone())
            .collect();
        let ranges: Vec<Range<usize>> = indices
            .iter()
            .map(|&i| {
                let start = self.layout.offsets[i];
                start..start + self.layout.groups[i].width
            })
            .collect();

        let authors = self
            .authors
            .iter()
            .map(|(author, documents)| {
                let selected = documents
                    .iter()
                    .map(|(doc, vector)| {
                        let sub: Vec<f64> = ranges
                            .iter()
                            .flat_map(|r| vector[r.clone()].iter().copied())
                            .collect();
                        (doc.clone(), sub)
                    })
                    .collect();
                (author.clone(), selected)
            })
            .collect();

        Ok(Corpus {
            layout: FeatureLayout::new(groups)?,
            authors,
        })
    }
}

/// Feature rows with a parallel list of author labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSet {
    pub features: Array2<f64>,
    pub labels: Vec<String>,
}

impl LabeledSet {
    pub fn new(features: Array2<f64>, labels: Vec<String>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(EvalError::LengthMismatch {
                left: features.nrows(),
                right: labels.len(),
            });
        }
        Ok(Self { features, labels })
    }

    /// Stack `rows` (each of length `width`) into a matrix.
    pub fn from_rows(rows: Vec<&[f64]>, labels: Vec<String>, width: usize) -> Result<Self> {
        let mut flat = Vec::with_capacity(rows.len() * width);
        for row in &rows {
            if row.len() != width {
                return Err(EvalError::DimensionMismatch {
                    expected: width,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let features = Array2::from_shape_vec((rows.len(), width), flat)?;
        Self::new(features, labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn distinct_labels(&self) -> BTreeSet<&str> {
        self.labels.iter().map(String::as_str).collect()
    }
}

/// One train / held-out partition. No document appears on both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: LabeledSet,
    pub held_out: LabeledSet,
}

impl Split {
    /// Number of candidate authors a ranking is taken over.
    pub fn n_candidates(&self) -> usize {
        self.train.distinct_labels().len()
    }
}

/// An author's regular documents together with one obfuscated document.
#[derive(Debug, Clone, PartialEq)]
pub struct ObfuscationPair {
    pub regular: Vec<Vec<f64>>,
    pub obfuscated: Vec<f64>,
}

/// Leave-one-out round for the de-obfuscation experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedSplit {
    pub split: Split,
    pub excluded_author: String,
    /// Pairs from every other author of the round.
    pub pairs: Vec<ObfuscationPair>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> FeatureLayout {
        FeatureLayout::new(vec![
            FeatureGroup::new("word_length", 2),
            FeatureGroup::new("legomena", 1),
            FeatureGroup::new("readability", 2),
        ])
        .unwrap()
    }

    fn corpus() -> Corpus {
        let mut authors = BTreeMap::new();
        let mut docs = BTreeMap::new();
        docs.insert("a_1".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        authors.insert("a".to_string(), docs);
        Corpus::new(layout(), authors).unwrap()
    }

    #[test]
    fn layout_ranges_follow_declaration_order() {
        let l = layout();
        assert_eq!(l.width(), 5);
        assert_eq!(l.range("word_length").unwrap(), 0..2);
        assert_eq!(l.range("legomena").unwrap(), 2..3);
        assert_eq!(l.range("readability").unwrap(), 3..5);
        assert!(matches!(
            l.range("nope"),
            Err(EvalError::UnknownFeatureGroup(_))
        ));
    }

    #[test]
    fn duplicate_group_names_are_rejected() {
        let err = FeatureLayout::new(vec![FeatureGroup::new("x", 1), FeatureGroup::new("x", 2)]);
        assert!(matches!(err, Err(EvalError::InvalidConfig(_))));
    }

    #[test]
    fn select_groups_uses_declared_order_not_request_order() {
        let c = corpus();
        let selected = c.select_groups(&["readability", "word_length"]).unwrap();
        assert_eq!(selected.width(), 4);
        assert_eq!(
            selected.documents("a").unwrap()["a_1"],
            vec![1.0, 2.0, 4.0, 5.0]
        );
        assert_eq!(
            selected.layout().group_names(),
            vec!["word_length".to_string(), "readability".to_string()]
        );
    }

    #[test]
    fn empty_selection_is_an_error() {
        let names: [&str; 0] = [];
        assert!(matches!(
            corpus().select_groups(&names),
            Err(EvalError::EmptySelection)
        ));
    }

    #[test]
    fn corpus_rejects_wrong_width() {
        let mut authors = BTreeMap::new();
        let mut docs = BTreeMap::new();
        docs.insert("d".to_string(), vec![1.0]);
        authors.insert("a".to_string(), docs);
        let err = Corpus::new(layout(), authors);
        assert!(matches!(
            err,
            Err(EvalError::DimensionMismatch {
                expected: 5,
                found: 1
            })
        ));
    }

    #[test]
    fn tags_match_by_substring() {
        assert!(has_any_tag("ebg_a_obfuscation_1", &DEFAULT_EXCLUDED_TAGS));
        assert!(!has_any_tag("ebg_a_03", &DEFAULT_EXCLUDED_TAGS));
    }

    #[test]
    fn labeled_set_checks_lengths() {
        let features = Array2::zeros((2, 3));
        assert!(LabeledSet::new(features, vec!["a".into()]).is_err());
    }
}
