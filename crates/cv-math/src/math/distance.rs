//! Euclidean distances and brute-force nearest-neighbour search.
//!
//! Datasets handled here are small enough (thousands of rows) that an
//! exhaustive scan is simpler and fully deterministic.

/// Squared Euclidean distance. Panics if lengths differ.
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "dimension mismatch");
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Euclidean distance.
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Indices of the `k` nearest rows of `points` to `query`.
///
/// `exclude` removes one index from consideration (the query itself when it
/// is a member of `points`). Ties are broken by lower index so results are
/// reproducible. Fewer than `k` indices are returned when not enough
/// candidates exist.
pub fn k_nearest(points: &[Vec<f64>], query: &[f64], k: usize, exclude: Option<usize>) -> Vec<usize> {
    let mut scored: Vec<(f64, usize)> = points
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != exclude)
        .map(|(idx, p)| (squared_euclidean(p, query), idx))
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    scored.into_iter().take(k).map(|(_, idx)| idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basic() {
        assert_eq!(euclidean(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(squared_euclidean(&[1.0], &[1.0]), 0.0);
    }

    #[test]
    fn nearest_excludes_self_and_orders_by_distance() {
        let points = vec![vec![0.0], vec![1.0], vec![3.0], vec![10.0]];
        let nn = k_nearest(&points, &points[1], 2, Some(1));
        assert_eq!(nn, vec![0, 2]);
    }

    #[test]
    fn ties_break_on_index() {
        let points = vec![vec![1.0], vec![-1.0], vec![1.0]];
        let nn = k_nearest(&points, &[0.0], 3, None);
        assert_eq!(nn, vec![0, 1, 2]);
    }

    #[test]
    fn returns_fewer_when_short() {
        let points = vec![vec![0.0], vec![1.0]];
        assert_eq!(k_nearest(&points, &[0.0], 5, Some(0)), vec![1]);
    }
}
