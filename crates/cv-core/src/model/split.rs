//! Stratified train/test partitioning.

use cv_common::{BinaryLabel, Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::imbalance::ClassCounts;

/// Row indices of each partition, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Sizes and class counts of a split, for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_counts: ClassCounts,
    pub test_counts: ClassCounts,
}

impl Split {
    pub fn summary(&self, labels: &[BinaryLabel]) -> SplitSummary {
        let pick = |rows: &[usize]| -> Vec<BinaryLabel> { rows.iter().map(|&i| labels[i]).collect() };
        SplitSummary {
            train_rows: self.train.len(),
            test_rows: self.test.len(),
            train_counts: ClassCounts::from_labels(&pick(&self.train)),
            test_counts: ClassCounts::from_labels(&pick(&self.test)),
        }
    }
}

/// Hold out `test_fraction` of each class.
///
/// A class with at least two rows puts at least one row on each side; a
/// singleton class stays in training.
pub fn stratified_split(
    labels: &[BinaryLabel],
    test_fraction: f64,
    rng: &mut StdRng,
) -> Result<Split> {
    if labels.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::validation(
            "test_fraction",
            format!("must be in (0, 1), got {test_fraction}"),
        ));
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in [BinaryLabel::Viable, BinaryLabel::NotViable] {
        let mut rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        if rows.is_empty() {
            continue;
        }
        rows.shuffle(rng);
        let n = rows.len();
        let held = if n < 2 {
            0
        } else {
            ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1)
        };
        test.extend_from_slice(&rows[..held]);
        train.extend_from_slice(&rows[held..]);
    }

    if test.is_empty() {
        return Err(Error::validation(
            "labels",
            "too few rows to hold out a test partition",
        ));
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}
