//! Property-based tests for cv-math numerical functions.
//!
//! Uses proptest to verify mathematical properties hold across many random inputs.

use proptest::prelude::*;
use cv_math::{
    brier_score, k_nearest, logit, mean, quantile, roc_auc, sigmoid, squared_euclidean, Confusion,
};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-10;

/// Helper to check approximate equality.
fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

fn scored_labels() -> impl Strategy<Value = Vec<(f64, bool)>> {
    prop::collection::vec((0.0..1.0f64, any::<bool>()), 2..60)
}

// ============================================================================
// sigmoid properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// sigmoid stays inside [0, 1] for any finite input.
    #[test]
    fn sigmoid_bounded(x in -1e6..1e6f64) {
        let s = sigmoid(x);
        prop_assert!((0.0..=1.0).contains(&s), "sigmoid({})={}", x, s);
    }

    /// sigmoid(x) + sigmoid(-x) == 1.
    #[test]
    fn sigmoid_symmetric(x in -30.0..30.0f64) {
        prop_assert!(approx_eq(sigmoid(x) + sigmoid(-x), 1.0, TOL));
    }

    /// logit inverts sigmoid away from saturation.
    #[test]
    fn logit_inverts_sigmoid(x in -20.0..20.0f64) {
        prop_assert!(approx_eq(logit(sigmoid(x)), x, 1e-6), "x={}", x);
    }
}

// ============================================================================
// AUC properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// AUC is always within [0, 1].
    #[test]
    fn auc_bounded(pairs in scored_labels()) {
        let (scores, labels): (Vec<f64>, Vec<bool>) = pairs.into_iter().unzip();
        let auc = roc_auc(&scores, &labels);
        prop_assert!((0.0..=1.0).contains(&auc), "auc={}", auc);
    }

    /// Negating scores mirrors AUC around 0.5 when both classes are present.
    #[test]
    fn auc_mirrors_under_negation(pairs in scored_labels()) {
        let (scores, labels): (Vec<f64>, Vec<bool>) = pairs.into_iter().unzip();
        let has_both = labels.iter().any(|&y| y) && labels.iter().any(|&y| !y);
        prop_assume!(has_both);
        let negated: Vec<f64> = scores.iter().map(|s| -s).collect();
        let a = roc_auc(&scores, &labels);
        let b = roc_auc(&negated, &labels);
        prop_assert!(approx_eq(a + b, 1.0, 1e-9), "{} + {} != 1", a, b);
    }

    /// AUC matches the brute-force pairwise (Mann-Whitney) count.
    #[test]
    fn auc_matches_pairwise(pairs in scored_labels()) {
        let pos: Vec<f64> = pairs.iter().filter(|p| p.1).map(|p| p.0).collect();
        let neg: Vec<f64> = pairs.iter().filter(|p| !p.1).map(|p| p.0).collect();
        prop_assume!(!pos.is_empty() && !neg.is_empty());
        let mut wins = 0.0;
        for &p in &pos {
            for &n in &neg {
                if p > n {
                    wins += 1.0;
                } else if p == n {
                    wins += 0.5;
                }
            }
        }
        let expected = wins / (pos.len() * neg.len()) as f64;
        let (scores, labels): (Vec<f64>, Vec<bool>) = pairs.into_iter().unzip();
        prop_assert!(approx_eq(roc_auc(&scores, &labels), expected, 1e-9));
    }

    /// Balanced accuracy and Brier score stay in [0, 1].
    #[test]
    fn threshold_metrics_bounded(pairs in scored_labels(), threshold in 0.0..1.0f64) {
        let (scores, labels): (Vec<f64>, Vec<bool>) = pairs.into_iter().unzip();
        let c = Confusion::from_scores(&scores, &labels, threshold);
        prop_assert_eq!(c.total(), scores.len());
        prop_assert!((0.0..=1.0).contains(&c.balanced_accuracy()));
        prop_assert!((0.0..=1.0).contains(&c.f1()));
        prop_assert!((0.0..=1.0).contains(&brier_score(&scores, &labels)));
    }
}

// ============================================================================
// stats and distance properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Quantiles are monotone in q and bracketed by min and max.
    #[test]
    fn quantile_monotone(values in prop::collection::vec(-1e4..1e4f64, 1..50), q1 in 0.0..1.0f64, q2 in 0.0..1.0f64) {
        let (lo, hi) = if q1 <= q2 { (q1, q2) } else { (q2, q1) };
        let a = quantile(&values, lo).unwrap();
        let b = quantile(&values, hi).unwrap();
        prop_assert!(a <= b + TOL);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(a >= min - TOL && b <= max + TOL);
        let m = mean(&values).unwrap();
        prop_assert!(m >= min - TOL && m <= max + TOL);
    }

    /// Nearest neighbours come back sorted by distance.
    #[test]
    fn k_nearest_sorted(points in prop::collection::vec(prop::collection::vec(-10.0..10.0f64, 2), 2..30), k in 1usize..8) {
        let query = points[0].clone();
        let nn = k_nearest(&points, &query, k, Some(0));
        prop_assert!(nn.len() <= k);
        prop_assert!(!nn.contains(&0));
        for w in nn.windows(2) {
            let d0 = squared_euclidean(&points[w[0]], &query);
            let d1 = squared_euclidean(&points[w[1]], &query);
            prop_assert!(d0 <= d1);
        }
    }
}
