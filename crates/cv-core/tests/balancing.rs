//! Balancing strategies on small synthetic tables.

mod support;

use cv_common::{BinaryLabel, Error, Strategy};
use cv_config::EngineConfig;
use cv_core::balance::{BalancingEngine, EvaluationStatus, Fallback};
use cv_core::dataset::{Feature, FeatureTable};

fn table(majority: usize, minority: usize) -> (FeatureTable, Vec<BinaryLabel>) {
    let (x, y) = support::two_feature_table(majority, minority);
    let labels = y.iter().map(|&v| BinaryLabel::from_class(u8::from(v))).collect();
    (
        FeatureTable::from_numeric(vec!["x1".into(), "x2".into()], x),
        labels,
    )
}

fn engine() -> BalancingEngine {
    BalancingEngine::new(&EngineConfig::default())
}

#[test]
fn moderate_reaches_parity_and_keeps_every_majority_row() {
    let (features, labels) = table(100, 10);
    let out = engine().balance(&features, &labels, Strategy::Moderate).unwrap();

    let counts = out.counts();
    assert_eq!(counts.not_viable, 100);
    assert!(counts.viable.abs_diff(100) <= 1, "minority {}", counts.viable);

    // Every original majority row survives, in order, among the non-synthetic rows.
    let originals: Vec<&Vec<Feature>> = out
        .features
        .rows
        .iter()
        .zip(&out.labels)
        .zip(&out.synthetic)
        .filter(|((_, l), s)| !**s && **l == BinaryLabel::NotViable)
        .map(|((r, _), _)| r)
        .collect();
    let expected: Vec<&Vec<Feature>> = features.rows[10..].iter().collect();
    assert_eq!(originals, expected);

    assert_eq!(out.provenance.synthetic_rows, out.synthetic.iter().filter(|s| **s).count());
    assert_eq!(out.provenance.removed_rows, 0);
    assert!(out.provenance.fallback.is_none());
}

#[test]
fn synthetic_points_lie_inside_the_minority_bounding_box() {
    let (features, labels) = table(100, 10);
    let out = engine().balance(&features, &labels, Strategy::Moderate).unwrap();
    for (row, synthetic) in out.features.rows.iter().zip(&out.synthetic) {
        if *synthetic {
            for cell in row {
                let v = cell.as_number().unwrap();
                assert!((8.0..=10.0).contains(&v), "{v} outside minority range");
            }
        }
    }
}

#[test]
fn conservative_caps_the_ratio() {
    let (features, labels) = table(100, 20);
    let out = engine().balance(&features, &labels, Strategy::Conservative).unwrap();
    let counts = out.counts();
    assert_eq!(counts.viable, 20);
    assert_eq!(counts.not_viable, 29);
    assert!(out.synthetic.iter().all(|s| !s));
}

#[test]
fn auto_undersamples_at_the_bottom_of_the_conservative_band() {
    let (features, labels) = table(18, 10);
    let out = engine().balance(&features, &labels, Strategy::Auto).unwrap();
    let p = &out.provenance;
    assert_eq!(p.strategy_applied, Strategy::Conservative);
    assert_eq!(p.post_counts.viable, 10);
    assert_eq!(p.post_counts.not_viable, 14);
    assert_eq!(p.removed_rows, 4);
}

#[test]
fn aggressive_cleans_after_oversampling() {
    let (features, labels) = table(60, 12);
    let out = engine().balance(&features, &labels, Strategy::Aggressive).unwrap();
    let p = &out.provenance;
    assert_eq!(p.strategy_applied, Strategy::Aggressive);
    assert_eq!(
        out.len(),
        p.pre_counts.total() + p.synthetic_rows - p.removed_rows
    );
    assert_eq!(p.post_counts, out.counts());
}

#[test]
fn auto_matches_its_explicit_resolution() {
    let (features, labels) = table(100, 10);
    let auto = engine().balance(&features, &labels, Strategy::Auto).unwrap();
    assert_eq!(auto.provenance.strategy_applied, Strategy::Aggressive);
    let explicit = engine().balance(&features, &labels, Strategy::Aggressive).unwrap();
    assert_eq!(auto.features, explicit.features);
    assert_eq!(auto.labels, explicit.labels);
}

#[test]
fn too_few_minority_rows_name_the_strategy() {
    let (features, labels) = table(50, 4);
    let err = engine().balance(&features, &labels, Strategy::Moderate).unwrap_err();
    match err {
        Error::InsufficientData {
            strategy, minority, ..
        } => {
            assert_eq!(strategy, "moderate");
            assert_eq!(minority, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplication_fallback_is_recorded() {
    let mut config = EngineConfig::default();
    config.balancing.allow_duplication_fallback = true;
    let (features, labels) = table(50, 4);
    let out = BalancingEngine::new(&config)
        .balance(&features, &labels, Strategy::Moderate)
        .unwrap();
    assert_eq!(out.provenance.fallback, Some(Fallback::Duplication));
    assert_eq!(out.counts().viable, 50);
}

#[test]
fn comparison_is_deterministic_and_order_independent() {
    let (features, labels) = table(90, 15);
    let a = engine()
        .compare(
            &features,
            &labels,
            &[Strategy::Moderate, Strategy::None, Strategy::Conservative],
        )
        .unwrap();
    let b = engine()
        .compare(
            &features,
            &labels,
            &[Strategy::Conservative, Strategy::Moderate, Strategy::None],
        )
        .unwrap();
    assert_eq!(a.winner, b.winner);
    let names = |c: &cv_core::balance::StrategyComparison| {
        c.ranking.iter().map(|e| e.strategy).collect::<Vec<_>>()
    };
    assert_eq!(names(&a), names(&b));
    assert!(a.ranking.iter().all(|e| e.status == EvaluationStatus::Ok));
}
