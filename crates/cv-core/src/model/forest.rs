//! Bagged trees with per-split feature subsampling.

use cv_config::training::{ForestParams, TreeParams};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tree::{mean_leaf, normalise_counts, RegressionTree, TreeSpec};
use super::Classifier;
use crate::seed::stream_rng;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    width: usize,
}

impl RandomForest {
    /// Each tree draws from its own named stream, so tree `t` is the same
    /// whatever the forest size.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[bool],
        params: &ForestParams,
        tree: &TreeParams,
        seed: u64,
    ) -> Self {
        let n = x.len();
        let width = x.first().map_or(0, Vec::len);
        let targets: Vec<f64> = y.iter().map(|&v| f64::from(u8::from(v))).collect();
        let max_features = params
            .max_features
            .unwrap_or_else(|| (width as f64).sqrt().round() as usize)
            .clamp(1, width.max(1));
        let spec = TreeSpec {
            max_depth: params.max_depth,
            min_samples_split: tree.min_samples_split,
            min_samples_leaf: tree.min_samples_leaf,
            max_features: Some(max_features),
        };
        let leaf = |rows: &[usize]| mean_leaf(&targets, rows);

        let trees = (0..params.n_trees)
            .map(|t| {
                let mut rng = stream_rng(seed, &format!("forest/{t}"));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                RegressionTree::fit(x, &targets, &bootstrap, &spec, &mut rng, &leaf)
            })
            .collect();

        Self { trees, width }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    fn feature_importances(&self) -> Vec<f64> {
        let mut counts = vec![0usize; self.width];
        for tree in &self.trees {
            for (c, n) in counts.iter_mut().zip(tree.split_counts()) {
                *c += n;
            }
        }
        normalise_counts(&counts)
    }
}
