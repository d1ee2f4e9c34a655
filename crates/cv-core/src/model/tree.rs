//! Least-squares regression trees.
//!
//! On 0/1 targets the squared-error criterion is proportional to Gini
//! impurity, so the same builder serves the classification tree, the forest
//! and the boosting rounds. Leaf values come from a caller-supplied function
//! over the rows that reach the leaf.

use cv_config::training::TreeParams;
use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use super::Classifier;

/// Smallest impurity decrease accepted for a split.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for one tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSpec {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split; `None` considers every feature.
    pub max_features: Option<usize>,
}

impl From<&TreeParams> for TreeSpec {
    fn from(params: &TreeParams) -> Self {
        Self {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: None,
        }
    }
}

/// Nodes live in one arena; index 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    /// Number of splits made on each feature.
    split_counts: Vec<usize>,
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    targets: &'a [f64],
    spec: &'a TreeSpec,
    rng: &'a mut StdRng,
    leaf_value: &'a dyn Fn(&[usize]) -> f64,
    nodes: Vec<Node>,
    split_counts: Vec<usize>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl Builder<'_> {
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: (self.leaf_value)(&rows),
            samples: rows.len(),
        });

        if depth >= self.spec.max_depth || rows.len() < self.spec.min_samples_split.max(2) {
            return id;
        }
        let Some(split) = self.best_split(&rows) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.x[r][split.feature] <= split.threshold);
        self.split_counts[split.feature] += 1;

        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let width = self.split_counts.len();
        match self.spec.max_features {
            Some(m) if m < width => {
                let mut picked = index::sample(&mut *self.rng, width, m.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..width).collect(),
        }
    }

    fn best_split(&mut self, rows: &[usize]) -> Option<BestSplit> {
        let n = rows.len();
        let min_leaf = self.spec.min_samples_leaf.max(1);
        if n < 2 * min_leaf {
            return None;
        }

        let total: f64 = rows.iter().map(|&r| self.targets[r]).sum();
        let total_sq: f64 = rows.iter().map(|&r| self.targets[r].powi(2)).sum();
        let parent_sse = total_sq - total * total / n as f64;

        let mut best: Option<BestSplit> = None;
        let mut order = rows.to_vec();
        for feature in self.candidate_features() {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for i in 1..n {
                let t = self.targets[order[i - 1]];
                left_sum += t;
                left_sq += t * t;

                let lo = self.x[order[i - 1]][feature];
                let hi = self.x[order[i]][feature];
                if i < min_leaf || n - i < min_leaf || lo == hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / i as f64)
                    + (right_sq - right_sum * right_sum / (n - i) as f64);
                let gain = parent_sse - sse;
                let improves = match &best {
                    Some(b) => gain > b.gain,
                    None => true,
                };
                if gain > MIN_GAIN && improves {
                    best = Some(BestSplit {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

impl RegressionTree {
    /// Grow a tree on `rows` of `x` against `targets`.
    ///
    /// `rows` may repeat indices (bootstrap samples).
    pub fn fit(
        x: &[Vec<f64>],
        targets: &[f64],
        rows: &[usize],
        spec: &TreeSpec,
        rng: &mut StdRng,
        leaf_value: &dyn Fn(&[usize]) -> f64,
    ) -> Self {
        let width = x.first().map_or(0, Vec::len);
        let mut builder = Builder {
            x,
            targets,
            spec,
            rng,
            leaf_value,
            nodes: Vec::new(),
            split_counts: vec![0; width],
        };
        builder.grow(rows.to_vec(), 0);
        Self {
            nodes: builder.nodes,
            split_counts: builder.split_counts,
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn split_counts(&self) -> &[usize] {
        &self.split_counts
    }
}

/// Mean of `targets` over `rows`; 0 for an empty leaf.
pub fn mean_leaf(targets: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&r| targets[r]).sum::<f64>() / rows.len() as f64
}

/// Normalise per-feature split counts to shares summing to 1.
pub fn normalise_counts(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

/// A single classification tree; leaves hold the positive-class share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    tree: RegressionTree,
}

impl DecisionTree {
    pub fn fit(x: &[Vec<f64>], y: &[bool], params: &TreeParams, rng: &mut StdRng) -> Self {
        let targets: Vec<f64> = y.iter().map(|&v| f64::from(u8::from(v))).collect();
        let rows: Vec<usize> = (0..x.len()).collect();
        let leaf = |rows: &[usize]| mean_leaf(&targets, rows);
        Self {
            tree: RegressionTree::fit(x, &targets, &rows, &TreeSpec::from(params), rng, &leaf),
        }
    }

    pub fn tree(&self) -> &RegressionTree {
        &self.tree
    }
}

impl Classifier for DecisionTree {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        self.tree.predict(row).clamp(0.0, 1.0)
    }

    fn feature_importances(&self) -> Vec<f64> {
        normalise_counts(self.tree.split_counts())
    }
}
