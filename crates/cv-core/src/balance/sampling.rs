//! Random under- and oversampling by row index.

use cv_common::BinaryLabel;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;

fn indices_of(labels: &[BinaryLabel], class: BinaryLabel) -> Vec<usize> {
    labels
        .iter()
        .enumerate()
        .filter(|(_, l)| **l == class)
        .map(|(i, _)| i)
        .collect()
}

/// Rows to keep after reducing `majority` to at most `target` rows.
///
/// Every other row is kept. The result is in original row order.
pub fn undersample(
    labels: &[BinaryLabel],
    majority: BinaryLabel,
    target: usize,
    rng: &mut StdRng,
) -> Vec<usize> {
    let pool = indices_of(labels, majority);
    if pool.len() <= target {
        return (0..labels.len()).collect();
    }

    let mut keep: Vec<usize> = index::sample(rng, pool.len(), target)
        .into_iter()
        .map(|i| pool[i])
        .collect();
    keep.extend(indices_of(labels, majority.other()));
    keep.sort_unstable();
    keep
}

/// Source rows for `count` duplicates drawn with replacement from `minority`.
pub fn duplicate(
    labels: &[BinaryLabel],
    minority: BinaryLabel,
    count: usize,
    rng: &mut StdRng,
) -> Vec<usize> {
    let pool = indices_of(labels, minority);
    if pool.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|_| pool[rng.random_range(0..pool.len())])
        .collect()
}
