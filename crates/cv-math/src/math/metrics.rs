//! Binary classification metrics.
//!
//! Provides the metrics used to compare classifiers on held-out data:
//! - AUC-ROC (tie-aware)
//! - Balanced accuracy
//! - Precision/Recall/F1
//! - Brier score and log loss

use crate::math::stable::clamp_probability;
use serde::{Deserialize, Serialize};

/// Confusion counts at a fixed decision threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl Confusion {
    /// Tally predictions (`score >= threshold` is positive) against labels.
    pub fn from_scores(scores: &[f64], labels: &[bool], threshold: f64) -> Self {
        let mut c = Confusion::default();
        for (&s, &y) in scores.iter().zip(labels) {
            match (s >= threshold, y) {
                (true, true) => c.tp += 1,
                (true, false) => c.fp += 1,
                (false, true) => c.fn_ += 1,
                (false, false) => c.tn += 1,
            }
        }
        c
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// Recall, i.e. true positive rate.
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// Mean of per-class recall.
    ///
    /// A class absent from the labels contributes nothing; if only one class
    /// is present this reduces to that class's recall.
    pub fn balanced_accuracy(&self) -> f64 {
        let pos = self.tp + self.fn_;
        let neg = self.tn + self.fp;
        match (pos > 0, neg > 0) {
            (true, true) => (self.recall() + self.specificity()) / 2.0,
            (true, false) => self.recall(),
            (false, true) => self.specificity(),
            (false, false) => 0.0,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Summary metrics for one classifier on one evaluation set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationMetrics {
    /// Area under ROC curve. 0.5 when only one class is present.
    pub auc_roc: f64,

    pub balanced_accuracy: f64,

    pub precision: f64,

    pub recall: f64,

    pub f1_score: f64,

    pub accuracy: f64,

    /// Mean squared error of probabilities.
    pub brier_score: f64,

    pub log_loss: f64,

    pub sample_count: usize,

    pub positive_count: usize,

    pub negative_count: usize,
}

impl Default for ClassificationMetrics {
    fn default() -> Self {
        Self {
            auc_roc: 0.5,
            balanced_accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            accuracy: 0.0,
            brier_score: 0.0,
            log_loss: 0.0,
            sample_count: 0,
            positive_count: 0,
            negative_count: 0,
        }
    }
}

/// Compute all metrics from predicted probabilities and true labels.
///
/// Lengths must match; extra entries on either side are ignored.
pub fn classification_metrics(probs: &[f64], labels: &[bool], threshold: f64) -> ClassificationMetrics {
    let n = probs.len().min(labels.len());
    if n == 0 {
        return ClassificationMetrics::default();
    }
    let probs = &probs[..n];
    let labels = &labels[..n];

    let confusion = Confusion::from_scores(probs, labels, threshold);
    let positive_count = labels.iter().filter(|&&y| y).count();

    ClassificationMetrics {
        auc_roc: roc_auc(probs, labels),
        balanced_accuracy: confusion.balanced_accuracy(),
        precision: confusion.precision(),
        recall: confusion.recall(),
        f1_score: confusion.f1(),
        accuracy: confusion.accuracy(),
        brier_score: brier_score(probs, labels),
        log_loss: log_loss(probs, labels),
        sample_count: n,
        positive_count,
        negative_count: n - positive_count,
    }
}

/// AUC-ROC via the trapezoidal rule over distinct score thresholds.
///
/// Tied scores are processed as one block so that ties contribute half
/// credit, matching the Mann-Whitney formulation.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> f64 {
    let n = scores.len().min(labels.len());
    let positive_count = labels[..n].iter().filter(|&&y| y).count();
    let negative_count = n - positive_count;
    if positive_count == 0 || negative_count == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut auc = 0.0;
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut i = 0;
    while i < n {
        let current = scores[order[i]];
        let (prev_tp, prev_fp) = (tp, fp);
        while i < n && scores[order[i]] == current {
            if labels[order[i]] {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        auc += (fp - prev_fp) * (tp + prev_tp) / 2.0;
    }

    auc / (positive_count as f64 * negative_count as f64)
}

/// Mean squared error of probabilities.
pub fn brier_score(probs: &[f64], labels: &[bool]) -> f64 {
    let n = probs.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = probs
        .iter()
        .zip(labels)
        .map(|(&p, &y)| {
            let y = if y { 1.0 } else { 0.0 };
            (p - y).powi(2)
        })
        .sum();
    sum / n as f64
}

/// Cross-entropy with probabilities clamped away from 0 and 1.
pub fn log_loss(probs: &[f64], labels: &[bool]) -> f64 {
    let n = probs.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = probs
        .iter()
        .zip(labels)
        .map(|(&p, &y)| {
            let p = clamp_probability(p);
            if y {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    sum / n as f64
}
