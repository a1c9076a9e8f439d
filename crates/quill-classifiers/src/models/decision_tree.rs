use std::cmp::Ordering;

use ndarray::Array2;

use crate::config::ModelType;
use crate::error::{EvalError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::utils::{normalize_distribution, validate_fit_inputs, validate_query};

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Entropy-splitting decision tree over weighted samples.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    min_samples_split: usize,
    max_depth: Option<usize>,
    root: Option<Node>,
    width: usize,
    n_classes: usize,
}

fn entropy(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0.0)
        .map(|&c| {
            let p = c / total;
            -p * p.log2()
        })
        .sum()
}

impl DecisionTreeClassifier {
    pub fn new(model_type: &ModelType) -> Result<Self> {
        match model_type {
            ModelType::DecisionTree {
                min_samples_split,
                max_depth,
            } => Ok(Self::with_params((*min_samples_split).max(2), *max_depth)),
            other => Err(EvalError::InvalidConfig(format!(
                "Expected ModelType::DecisionTree params, got {:?}",
                other
            ))),
        }
    }

    pub fn with_params(min_samples_split: usize, max_depth: Option<usize>) -> Self {
        Self {
            min_samples_split,
            max_depth,
            root: None,
            width: 0,
            n_classes: 0,
        }
    }

    /// Fit with per-sample weights.
    pub fn fit_weighted(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        weights: &[f64],
        n_classes: usize,
    ) -> Result<()> {
        validate_fit_inputs(x, y, n_classes)?;
        if weights.len() != y.len() {
            return Err(EvalError::LengthMismatch {
                left: weights.len(),
                right: y.len(),
            });
        }
        self.width = x.ncols();
        self.n_classes = n_classes;
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build(x, y, weights, indices, 0));
        Ok(())
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        weights: &[f64],
        indices: Vec<usize>,
        depth: usize,
    ) -> Node {
        let mut counts = vec![0.0; self.n_classes];
        for &i in &indices {
            counts[y[i]] += weights[i];
        }
        let total: f64 = counts.iter().sum();
        let parent_entropy = entropy(&counts, total);

        let depth_reached = self.max_depth.map_or(false, |d| depth >= d);
        if parent_entropy == 0.0 || indices.len() < self.min_samples_split || depth_reached {
            normalize_distribution(&mut counts);
            return Node::Leaf {
                distribution: counts,
            };
        }

        let Some((feature, threshold)) = self.best_split(x, y, weights, &indices, &counts, total, parent_entropy)
        else {
            normalize_distribution(&mut counts);
            return Node::Leaf {
                distribution: counts,
            };
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[(i, feature)] <= threshold);
        if left.is_empty() || right.is_empty() {
            normalize_distribution(&mut counts);
            return Node::Leaf {
                distribution: counts,
            };
        }

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(x, y, weights, left, depth + 1)),
            right: Box::new(self.build(x, y, weights, right, depth + 1)),
        }
    }

    /// Highest information gain split; the first feature / threshold wins ties.
    #[allow(clippy::too_many_arguments)]
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        weights: &[f64],
        indices: &[usize],
        counts: &[f64],
        total: f64,
        parent_entropy: f64,
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        let mut best_gain = 1e-12;

        let mut order = indices.to_vec();
        for feature in 0..x.ncols() {
            order.sort_by(|&a, &b| {
                x[(a, feature)]
                    .partial_cmp(&x[(b, feature)])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left = vec![0.0; self.n_classes];
            let mut left_total = 0.0;
            for pos in 0..order.len() - 1 {
                let i = order[pos];
                left[y[i]] += weights[i];
                left_total += weights[i];

                let here = x[(i, feature)];
                let next = x[(order[pos + 1], feature)];
                if here == next {
                    continue;
                }

                let right: Vec<f64> = counts.iter().zip(&left).map(|(c, l)| c - l).collect();
                let right_total = total - left_total;
                let children = (left_total * entropy(&left, left_total)
                    + right_total * entropy(&right, right_total))
                    / total;
                let gain = parent_entropy - children;
                if gain > best_gain {
                    best_gain = gain;
                    // adjacent floats: the midpoint may round up to `next`
                    let mid = (here + next) / 2.0;
                    let threshold = if mid >= next { here } else { mid };
                    best = Some((feature, threshold));
                }
            }
        }
        best
    }

    fn leaf_for<'a>(&'a self, node: &'a Node, row: &[f64]) -> &'a [f64] {
        match node {
            Node::Leaf { distribution } => distribution,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    self.leaf_for(left, row)
                } else {
                    self.leaf_for(right, row)
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map_or(0, walk)
    }
}

impl ClassifierModel for DecisionTreeClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()> {
        let weights = vec![1.0; y.len()];
        self.fit_weighted(x, y, &weights, n_classes)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| EvalError::InvalidConfig("decision tree used before fit".to_string()))?;
        validate_query(x, self.width)?;
        let mut flat = Vec::with_capacity(x.nrows() * self.n_classes);
        for row in x.rows() {
            flat.extend_from_slice(self.leaf_for(root, &row.to_vec()));
        }
        Ok(Array2::from_shape_vec((x.nrows(), self.n_classes), flat)?)
    }

    fn name(&self) -> &str {
        "tree"
    }
}
