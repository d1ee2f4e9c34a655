//! Edited-nearest-neighbours cleaning.
//!
//! A row is dropped when most of its `k` nearest neighbours carry the other
//! label. Original and synthetic rows are treated alike.

use cv_common::BinaryLabel;
use cv_math::k_nearest;

/// Keep-mask over `rows`.
///
/// A class that would lose every row is left untouched.
pub fn edited_nearest_neighbours(rows: &[Vec<f64>], labels: &[BinaryLabel], k: usize) -> Vec<bool> {
    let mut keep: Vec<bool> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let nn = k_nearest(rows, row, k, Some(i));
            let disagree = nn.iter().filter(|&&j| labels[j] != labels[i]).count();
            disagree * 2 <= nn.len()
        })
        .collect();

    for class in [BinaryLabel::Viable, BinaryLabel::NotViable] {
        let present = labels.iter().any(|l| *l == class);
        let survives = labels.iter().zip(&keep).any(|(l, k)| *l == class && *k);
        if present && !survives {
            tracing::warn!(class = %class, "cleaning would remove a whole class; keeping it");
            for (l, k) in labels.iter().zip(keep.iter_mut()) {
                if *l == class {
                    *k = true;
                }
            }
        }
    }
    keep
}
