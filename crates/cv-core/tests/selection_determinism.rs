//! Model selection is reproducible for a fixed seed.

mod support;

use cv_common::{BinaryLabel, ModelKind, Strategy};
use cv_config::{EngineConfig, TrainingConfig};
use cv_core::balance::BalancingEngine;
use cv_core::dataset::FeatureTable;
use cv_core::model::{ModelSelector, SelectionResult};

fn data() -> (FeatureTable, Vec<BinaryLabel>) {
    let (x, y) = support::two_feature_table(80, 30);
    let labels = y.iter().map(|&v| BinaryLabel::from_class(u8::from(v))).collect();
    (FeatureTable::from_numeric(vec!["a".into(), "b".into()], x), labels)
}

fn config(seed: u64) -> TrainingConfig {
    let mut config = TrainingConfig::default();
    config.seed = seed;
    config.candidates = ModelKind::ALL.to_vec();
    config.forest.n_trees = 15;
    config.boosting.n_rounds = 25;
    config
}

fn run(seed: u64) -> SelectionResult {
    let (features, labels) = data();
    ModelSelector::new(config(seed))
        .select(&features, &labels, &[])
        .unwrap()
}

#[test]
fn repeated_runs_pick_the_same_winner_and_auc() {
    let first = run(7);
    for _ in 0..3 {
        let again = run(7);
        assert_eq!(again.winner, first.winner);
        assert_eq!(
            again.winner_metrics().auc_roc.to_bits(),
            first.winner_metrics().auc_roc.to_bits()
        );
        let order = |r: &SelectionResult| r.ranked.iter().map(|c| c.model).collect::<Vec<_>>();
        assert_eq!(order(&again), order(&first));
        assert_eq!(again.model, first.model);
    }
}

#[test]
fn candidate_order_does_not_change_the_result() {
    let (features, labels) = data();
    let selector = ModelSelector::new(config(11));
    let forward = selector
        .select(&features, &labels, &ModelKind::ALL)
        .unwrap();
    let mut reversed_kinds = ModelKind::ALL.to_vec();
    reversed_kinds.reverse();
    let reversed = selector.select(&features, &labels, &reversed_kinds).unwrap();
    assert_eq!(forward.winner, reversed.winner);
    assert_eq!(forward.ranked, reversed.ranked);
}

#[test]
fn separable_data_prefers_the_simplest_perfect_model() {
    let result = run(3);
    let best = result.winner_metrics().auc_roc;
    assert!(best > 0.99, "auc {best}");
    // Every candidate separates the clusters, so the tie goes to the simplest.
    if result.ranked.iter().all(|c| (c.metrics.auc_roc - best).abs() <= 1e-9) {
        assert_eq!(result.winner, ModelKind::Logistic);
    }
}

#[test]
fn balanced_selection_is_reproducible() {
    let (features, labels) = data();
    let run = || {
        let engine = BalancingEngine::new(&EngineConfig::default());
        ModelSelector::new(config(5))
            .with_balancing(engine, Strategy::Auto)
            .select(&features, &labels, &[ModelKind::Logistic, ModelKind::RandomForest])
            .unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.winner, b.winner);
    assert_eq!(a.training_balance, b.training_balance);
    assert_eq!(a.ranked, b.ranked);
}
