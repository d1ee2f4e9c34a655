//! Property-based tests for the viability scorer and the imbalance policy.

use cv_common::{BinaryLabel, CaseRecord, Region, ViabilityGrade};
use cv_config::{ImbalanceCutoffs, ScoringConfig};
use cv_core::imbalance::recommend_strategy;
use cv_core::scoring::{CategoryStats, HistoricalStats, ViabilityScorer};
use proptest::prelude::*;

const SUBJECTS: [&str; 3] = ["Energia Elétrica", "Telefonia", "Nunca Visto"];

fn stats(rate: f64, count: u64) -> HistoricalStats {
    HistoricalStats::empty()
        .with_subject("Energia Elétrica", CategoryStats::from_rate(rate, count))
        .with_subject("Telefonia", CategoryStats::from_rate(1.0 - rate, count / 2))
}

fn record(amount: f64, subject: usize, region: usize) -> CaseRecord {
    let mut record = CaseRecord::new(amount, SUBJECTS[subject]).with_problem("Cobrança");
    record.region = Region::KNOWN[region];
    record
}

fn any_record() -> impl Strategy<Value = CaseRecord> {
    (0.0..100_000.0f64, 0..3usize, 0..5usize).prop_map(|(a, s, r)| record(a, s, r))
}

/// Scoring configs whose bands stay ordered, as validation requires.
fn any_scoring() -> impl Strategy<Value = ScoringConfig> {
    (
        1.0..5_000.0f64,
        1.0..4.0f64,
        0.05..0.3f64,
        0.05..0.3f64,
        1u64..200,
    )
        .prop_map(|(medium, high_factor, low_rate, step, volume)| {
            let mut cfg = ScoringConfig::default();
            cfg.value_bands.medium = medium;
            cfg.value_bands.high = medium * (1.0 + high_factor);
            cfg.success_bands.low = low_rate;
            cfg.success_bands.medium = low_rate + step;
            cfg.success_bands.high = (low_rate + 2.0 * step).min(1.0);
            cfg.volume.min_confidence_volume = volume;
            cfg.volume.min_category_volume = volume * 10;
            cfg
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Each sub-score stays in its declared range and the aggregate is their sum.
    #[test]
    fn components_in_range_and_sum(
        rec in any_record(),
        cfg in any_scoring(),
        rate in 0.0..=1.0f64,
        count in 0u64..5_000,
    ) {
        let result = ViabilityScorer::new(cfg).score(&rec, &stats(rate, count)).unwrap();
        let c = result.components;
        prop_assert!(c.value <= 3);
        prop_assert!(c.success <= 3);
        prop_assert!(c.potential <= 2);
        prop_assert!(c.confidence <= 1);
        prop_assert!(c.volume <= 1);
        prop_assert_eq!(
            result.aggregate,
            c.value + c.success + c.potential + c.confidence + c.volume
        );
        prop_assert!(result.aggregate <= 10);
        prop_assert!((0.0..=1.0).contains(&result.probability));
    }

    /// The binary label is VIABLE exactly for HIGH and MEDIUM grades.
    #[test]
    fn binary_label_coarsens_grade(aggregate in 0u8..=10) {
        let cfg = ScoringConfig::default();
        let grade = cfg.grades.grade(aggregate);
        let label = cfg.binary_label(aggregate);
        prop_assert_eq!(
            matches!(grade, ViabilityGrade::High | ViabilityGrade::Medium),
            label == BinaryLabel::Viable
        );
        prop_assert_eq!(grade.coarsen(), label);
    }

    /// Grades never go down as the aggregate goes up.
    #[test]
    fn grade_is_a_step_function(a in 0u8..10) {
        let grades = ScoringConfig::default().grades;
        prop_assert!(grades.grade(a) <= grades.grade(a + 1));
    }

    /// Scoring the same record twice gives identical results.
    #[test]
    fn scoring_is_idempotent(rec in any_record(), rate in 0.0..=1.0f64, count in 0u64..5_000) {
        let scorer = ViabilityScorer::new(ScoringConfig::default());
        let s = stats(rate, count);
        prop_assert_eq!(scorer.score(&rec, &s).unwrap(), scorer.score(&rec, &s).unwrap());
    }

    /// Raising the amount never lowers value or potential.
    #[test]
    fn amount_is_monotone(
        rec in any_record(),
        extra in 0.0..50_000.0f64,
        cfg in any_scoring(),
        rate in 0.0..=1.0f64,
    ) {
        let scorer = ViabilityScorer::new(cfg);
        let s = stats(rate, 1_000);
        let low = scorer.score(&rec, &s).unwrap();
        let mut richer = rec.clone();
        richer.amount = rec.amount.map(|a| a + extra);
        let high = scorer.score(&richer, &s).unwrap();
        prop_assert!(high.components.value >= low.components.value);
        prop_assert!(high.components.potential >= low.components.potential);
    }

    /// The recommended strategy only escalates as the ratio grows.
    #[test]
    fn policy_is_monotone_in_ratio(a in 1.0..50.0f64, b in 1.0..50.0f64) {
        let cutoffs = ImbalanceCutoffs::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let rank = |r: f64| match recommend_strategy(r, &cutoffs) {
            cv_common::Strategy::None => 0,
            cv_common::Strategy::Conservative => 1,
            cv_common::Strategy::Moderate => 2,
            _ => 3,
        };
        prop_assert!(rank(lo) <= rank(hi));
    }
}

#[test]
fn policy_examples_follow_the_bands() {
    use cv_common::Strategy;
    let cutoffs = ImbalanceCutoffs::default();
    let cases = [
        (1.0, Strategy::None),
        (1.4, Strategy::None),
        (1.5, Strategy::Conservative),
        (2.0, Strategy::Conservative),
        (3.0, Strategy::Moderate),
        (5.0, Strategy::Moderate),
        (10.0, Strategy::Aggressive),
        (15.0, Strategy::Aggressive),
    ];
    for (ratio, expected) in cases {
        assert_eq!(recommend_strategy(ratio, &cutoffs), expected, "ratio {ratio}");
    }
}

#[test]
fn missing_amount_scores_zero_value() {
    let mut rec = CaseRecord::new(0.0, "Energia Elétrica");
    rec.amount = None;
    let result = ViabilityScorer::new(ScoringConfig::default())
        .score(&rec, &stats(0.65, 1200))
        .unwrap();
    assert_eq!(result.components.value, 0);
    assert_eq!(result.components.potential, 0);
}

#[test]
fn no_history_pins_history_components_to_minimum() {
    let rec = CaseRecord::new(50_000.0, "Energia Elétrica");
    let result = ViabilityScorer::new(ScoringConfig::default())
        .score(&rec, &HistoricalStats::empty())
        .unwrap();
    assert_eq!(result.components.value, 3);
    assert_eq!(result.components.success, 0);
    assert_eq!(result.components.confidence, 0);
    assert_eq!(result.components.volume, 0);
    assert!(result.low_confidence);
}
