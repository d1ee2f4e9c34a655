//! Gradient boosting on the logistic loss.
//!
//! Each round fits a regression tree to the residuals `y - p` and replaces
//! its leaf values with one Newton step, `sum(r) / sum(p(1-p))`.

use cv_config::training::{BoostingParams, TreeParams};
use cv_math::{clamp_probability, logit, sigmoid};
use rand::seq::index;
use serde::{Deserialize, Serialize};

use super::tree::{normalise_counts, RegressionTree, TreeSpec};
use super::Classifier;
use crate::seed::stream_rng;

/// Newton steps are clipped to this magnitude.
const MAX_STEP: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    base: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    width: usize,
}

impl GradientBoosting {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[bool],
        params: &BoostingParams,
        tree: &TreeParams,
        seed: u64,
    ) -> Self {
        let n = x.len();
        let width = x.first().map_or(0, Vec::len);
        let targets: Vec<f64> = y.iter().map(|&v| f64::from(u8::from(v))).collect();
        let base_rate = if n == 0 {
            0.5
        } else {
            targets.iter().sum::<f64>() / n as f64
        };
        let base = logit(clamp_probability(base_rate));
        let spec = TreeSpec {
            max_depth: params.max_depth,
            min_samples_split: tree.min_samples_split,
            min_samples_leaf: tree.min_samples_leaf,
            max_features: None,
        };

        let mut rng = stream_rng(seed, "boosting");
        let mut margin = vec![base; n];
        let mut trees = Vec::with_capacity(params.n_rounds);
        for _ in 0..params.n_rounds {
            if n == 0 {
                break;
            }
            let probs: Vec<f64> = margin.iter().map(|&m| sigmoid(m)).collect();
            let residuals: Vec<f64> = targets.iter().zip(&probs).map(|(t, p)| t - p).collect();

            let rows: Vec<usize> = if params.subsample < 1.0 {
                let take = ((n as f64) * params.subsample).round().max(1.0) as usize;
                let mut picked = index::sample(&mut rng, n, take.min(n)).into_vec();
                picked.sort_unstable();
                picked
            } else {
                (0..n).collect()
            };

            let newton = |leaf: &[usize]| {
                let num: f64 = leaf.iter().map(|&i| residuals[i]).sum();
                let den: f64 = leaf.iter().map(|&i| probs[i] * (1.0 - probs[i])).sum();
                if den < 1e-12 {
                    0.0
                } else {
                    (num / den).clamp(-MAX_STEP, MAX_STEP)
                }
            };
            let round = RegressionTree::fit(x, &residuals, &rows, &spec, &mut rng, &newton);

            for (m, row) in margin.iter_mut().zip(x) {
                *m += params.learning_rate * round.predict(row);
            }
            trees.push(round);
        }

        Self {
            base,
            learning_rate: params.learning_rate,
            trees,
            width,
        }
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for GradientBoosting {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        let margin = self.base
            + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>();
        sigmoid(margin)
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
