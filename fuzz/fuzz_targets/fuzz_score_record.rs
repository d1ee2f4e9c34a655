//! Fuzz target for scoring arbitrary records.
//!
//! Any record either scores inside the declared ranges or is rejected as
//! invalid input.

#![no_main]

use arbitrary::Arbitrary;
use cv_common::{CaseRecord, Region};
use cv_config::ScoringConfig;
use cv_core::scoring::{CategoryStats, HistoricalStats, ViabilityScorer};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    amount: Option<f64>,
    subject: Option<String>,
    problem: Option<String>,
    region: u8,
    rate: f64,
    count: u64,
}

fuzz_target!(|input: Input| {
    let stats = HistoricalStats::empty().with_subject(
        "Energia Elétrica",
        CategoryStats::from_rate(input.rate.clamp(0.0, 1.0), input.count),
    );
    let mut record = CaseRecord::new(0.0, "");
    record.amount = input.amount;
    record.subject = input.subject;
    record.problem = input.problem;
    record.region = Region::KNOWN[usize::from(input.region) % Region::KNOWN.len()];

    if let Ok(result) = ViabilityScorer::new(ScoringConfig::default()).score(&record, &stats) {
        assert!(result.aggregate <= 10);
        assert!((0.0..=1.0).contains(&result.probability));
        assert_eq!(result.binary_label, result.grade.coarsen());
    }
});
