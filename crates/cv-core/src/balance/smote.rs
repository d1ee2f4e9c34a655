//! Synthetic minority oversampling by nearest-neighbour interpolation.

use cv_math::k_nearest;
use rand::rngs::StdRng;
use rand::Rng;

/// Generate `count` synthetic points from `minority`.
///
/// Each point lies on the segment between a random minority sample and one
/// of its `k` nearest minority neighbours. Callers guarantee at least two
/// minority rows.
pub fn interpolate(
    minority: &[Vec<f64>],
    count: usize,
    k: usize,
    rng: &mut StdRng,
) -> Vec<Vec<f64>> {
    if minority.len() < 2 || count == 0 {
        return Vec::new();
    }

    let neighbours: Vec<Vec<usize>> = minority
        .iter()
        .enumerate()
        .map(|(i, row)| k_nearest(minority, row, k, Some(i)))
        .collect();

    (0..count)
        .map(|_| {
            let i = rng.random_range(0..minority.len());
            let nn = &neighbours[i];
            let j = nn[rng.random_range(0..nn.len())];
            let gap: f64 = rng.random();
            minority[i]
                .iter()
                .zip(&minority[j])
                .map(|(a, b)| a + gap * (b - a))
                .collect()
        })
        .collect()
}
