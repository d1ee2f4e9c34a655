//! L2-regularised logistic regression fitted by batch gradient descent on
//! standardised features.

use cv_config::training::LogisticParams;
use cv_math::{logit, mean, sigmoid, std_dev};
use serde::{Deserialize, Serialize};

use super::Classifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    means: Vec<f64>,
    scales: Vec<f64>,
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    pub fn fit(x: &[Vec<f64>], y: &[bool], params: &LogisticParams) -> Self {
        let n = x.len();
        let width = x.first().map_or(0, Vec::len);

        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for col in 0..width {
            let values: Vec<f64> = x.iter().map(|row| row[col]).collect();
            means.push(mean(&values).unwrap_or(0.0));
            let sd = std_dev(&values).unwrap_or(0.0);
            scales.push(if sd > 1e-12 { sd } else { 1.0 });
        }

        let z: Vec<Vec<f64>> = x
            .iter()
            .map(|row| {
                row.iter()
                    .zip(means.iter().zip(&scales))
                    .map(|(v, (m, s))| (v - m) / s)
                    .collect()
            })
            .collect();
        let targets: Vec<f64> = y.iter().map(|&v| f64::from(u8::from(v))).collect();

        let mut weights = vec![0.0; width];
        let mut intercept = logit(mean(&targets).unwrap_or(0.5));
        if n == 0 {
            return Self {
                means,
                scales,
                weights,
                intercept,
            };
        }

        for _ in 0..params.iterations {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            for (row, target) in z.iter().zip(&targets) {
                let margin = intercept + dot(&weights, row);
                let err = sigmoid(margin) - target;
                for (g, v) in grad_w.iter_mut().zip(row) {
                    *g += err * v;
                }
                grad_b += err;
            }
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= params.learning_rate * (g / n as f64 + params.l2 * *w);
            }
            intercept -= params.learning_rate * grad_b / n as f64;
        }

        Self {
            means,
            scales,
            weights,
            intercept,
        }
    }

    /// Coefficients on the standardised scale.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        let margin: f64 = self.intercept
            + row
                .iter()
                .zip(&self.weights)
                .zip(self.means.iter().zip(&self.scales))
                .map(|((v, w), (m, s))| w * (v - m) / s)
                .sum::<f64>();
        sigmoid(margin)
    }

    /// Absolute standardised coefficients, normalised to sum to 1.
    fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.weights.iter().map(|w| w.abs()).sum();
        if total <= 0.0 {
            return vec![0.0; self.weights.len()];
        }
        self.weights.iter().map(|w| w.abs() / total).collect()
    }
}
