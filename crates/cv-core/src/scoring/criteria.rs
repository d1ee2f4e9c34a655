//! Calibrating scoring bands from a dataset.
//!
//! Value bands come from the 25th/50th/75th percentiles of declared amounts,
//! success bands from the global success rate (×0.8 and ×1.1), potential
//! bands from the 50th/75th percentiles of per-subject potential. Value or
//! potential percentiles that tie keep the configured bands for that family.
//! The result goes through the same validation as a hand-written configuration.

use cv_common::{CaseRecord, Error, Result};
use cv_config::scoring::{PotentialBands, ScoringConfig, SuccessBands, ValueBands};
use cv_config::validate::validate_scoring;
use cv_math::{quantile, round_to};

use super::stats::HistoricalStats;

/// Lowest success band when the derived medium band leaves room for it.
const SUCCESS_FLOOR: f64 = 0.5;

/// Minimum number of positive amounts needed to place three value cutoffs.
pub const MIN_AMOUNTS_FOR_CRITERIA: usize = 4;

/// Derive a scoring configuration from `records`, keeping every non-band
/// setting from `base`.
pub fn derive_scoring_config(
    records: &[CaseRecord],
    stats: &HistoricalStats,
    base: &ScoringConfig,
) -> Result<ScoringConfig> {
    let amounts: Vec<f64> = records
        .iter()
        .filter_map(|r| r.amount)
        .filter(|a| *a > 0.0)
        .collect();
    if amounts.len() < MIN_AMOUNTS_FOR_CRITERIA {
        return Err(Error::validation(
            "amount",
            format!(
                "need at least {MIN_AMOUNTS_FOR_CRITERIA} positive amounts to derive value bands, got {}",
                amounts.len()
            ),
        ));
    }

    let q = |p: f64| quantile(&amounts, p).unwrap_or(0.0);
    let quartiles = ValueBands {
        low: round_to(q(0.25), 2),
        medium: round_to(q(0.5), 2),
        high: round_to(q(0.75), 2),
    };
    let value_bands = if quartiles.low < quartiles.medium && quartiles.medium < quartiles.high {
        quartiles
    } else {
        tracing::warn!(
            q25 = quartiles.low,
            q50 = quartiles.medium,
            q75 = quartiles.high,
            "amount quartiles tie; keeping configured value bands"
        );
        base.value_bands.clone()
    };

    let global = stats
        .global_success_rate
        .ok_or_else(|| Error::validation("outcome", "no outcomes to derive success bands from"))?;
    let medium = round_to(global * 0.8, 3);
    let high = round_to((global * 1.1).min(1.0), 3);
    let low = if SUCCESS_FLOOR < medium {
        SUCCESS_FLOOR
    } else {
        round_to(medium * 0.625, 3)
    };
    let success_bands = SuccessBands { high, medium, low };

    let potentials: Vec<f64> = stats.subjects.values().filter_map(|s| s.potential).collect();
    let potential_bands = match (quantile(&potentials, 0.5), quantile(&potentials, 0.75)) {
        (Some(mid), Some(top)) if mid > 0.0 && top > mid => PotentialBands {
            medium: round_to(mid, 2),
            high: round_to(top, 2),
        },
        _ => {
            tracing::warn!(
                subjects = potentials.len(),
                "per-subject potential too uniform; keeping configured potential bands"
            );
            base.potential_bands.clone()
        }
    };

    let derived = ScoringConfig {
        value_bands,
        success_bands,
        potential_bands,
        ..base.clone()
    };
    validate_scoring(&derived)?;

    tracing::info!(
        value_low = derived.value_bands.low,
        value_medium = derived.value_bands.medium,
        value_high = derived.value_bands.high,
        success_medium = derived.success_bands.medium,
        success_high = derived.success_bands.high,
        "scoring criteria derived from data"
    );
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_common::Outcome;

    fn dataset() -> Vec<CaseRecord> {
        let subjects = ["Bancos", "Telefonia", "Energia Elétrica", "Saúde"];
        (0..200)
            .map(|i| {
                let outcome = if i % 3 == 0 {
                    Outcome::Unresolved
                } else {
                    Outcome::Resolved
                };
                CaseRecord::new(100.0 * (i + 1) as f64 * (1 + i % 4) as f64, subjects[i % 4])
                    .with_outcome(outcome)
            })
            .collect()
    }

    #[test]
    fn derived_bands_follow_the_data() {
        let records = dataset();
        let stats = HistoricalStats::from_records(&records);
        let cfg = derive_scoring_config(&records, &stats, &ScoringConfig::default()).unwrap();

        assert!(cfg.value_bands.low < cfg.value_bands.medium);
        assert!(cfg.value_bands.medium < cfg.value_bands.high);

        let global = stats.global_success_rate.unwrap();
        assert!((cfg.success_bands.medium - round_to(global * 0.8, 3)).abs() < 1e-12);
        assert_eq!(cfg.success_bands.low, SUCCESS_FLOOR);
        assert!(cfg.potential_bands.medium < cfg.potential_bands.high);
        assert_eq!(cfg.binary_threshold, cfg.grades.medium);
    }

    #[test]
    fn low_success_rate_moves_floor_below_medium() {
        let records: Vec<_> = (0..20)
            .map(|i| {
                let outcome = if i % 5 == 0 {
                    Outcome::Resolved
                } else {
                    Outcome::Unresolved
                };
                CaseRecord::new(50.0 + i as f64 * 10.0, "Bancos").with_outcome(outcome)
            })
            .collect();
        let stats = HistoricalStats::from_records(&records);
        let cfg = derive_scoring_config(&records, &stats, &ScoringConfig::default()).unwrap();
        assert!(cfg.success_bands.low < cfg.success_bands.medium);
        assert!(cfg.success_bands.low < SUCCESS_FLOOR);
    }

    #[test]
    fn too_few_amounts_is_a_validation_error() {
        let records = vec![CaseRecord::new(10.0, "A"), CaseRecord::new(0.0, "A")];
        let stats = HistoricalStats::from_records(&records);
        let err = derive_scoring_config(&records, &stats, &ScoringConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn tied_amount_quartiles_keep_configured_value_bands() {
        // Estimated amounts repeat one value per subject.
        let records: Vec<_> = (0..12)
            .map(|i| {
                let outcome = if i % 2 == 0 {
                    Outcome::Resolved
                } else {
                    Outcome::Unresolved
                };
                CaseRecord::new(if i < 10 { 3_000.0 } else { 900.0 }, "A").with_outcome(outcome)
            })
            .collect();
        let stats = HistoricalStats::from_records(&records);
        let base = ScoringConfig::default();
        let cfg = derive_scoring_config(&records, &stats, &base).unwrap();
        assert_eq!(cfg.value_bands, base.value_bands);
        assert_eq!(cfg.potential_bands, base.potential_bands);
        assert!((cfg.success_bands.medium - 0.4).abs() < 1e-12);
    }

    #[test]
    fn derived_config_still_goes_through_validation() {
        // Bands derive cleanly; the inherited grade order is broken.
        let records: Vec<_> = (0..10)
            .map(|i| CaseRecord::new(100.0 * f64::from(i + 1), "A").with_outcome(Outcome::Resolved))
            .collect();
        let stats = HistoricalStats::from_records(&records);
        let mut base = ScoringConfig::default();
        base.grades.medium = base.grades.high + 1;
        let err = derive_scoring_config(&records, &stats, &base).unwrap_err();
        assert_eq!(err.category(), cv_common::ErrorCategory::Config);
    }
}
