//! Rule-based viability scoring.
//!
//! One scorer serves both the offline pass that labels a whole dataset and the
//! online path that explains a single case, so training labels and
//! recommendations can never drift apart.
//!
//! Sub-scores and their ranges:
//!
//! | component  | range | driven by                                   |
//! |------------|-------|---------------------------------------------|
//! | value      | 0..=3 | amount in dispute                           |
//! | success    | 0..=3 | subject's historical success rate           |
//! | potential  | 0..=2 | amount × success rate                       |
//! | confidence | 0..=1 | subject sample size vs. confidence volume   |
//! | volume     | 0..=1 | subject sample size vs. category volume     |

pub mod criteria;
pub mod factors;
pub mod quality;
pub mod stats;

pub use criteria::derive_scoring_config;
pub use factors::{rank_factors, FactorKind, FactorTag, InfluencingFactor};
pub use quality::{analyze_label_quality, LabelQuality};
pub use stats::{CategoryStats, HistoricalStats};

use cv_common::{BinaryLabel, CaseRecord, Result, ViabilityGrade};
use cv_config::scoring::{
    ScoringConfig, AGGREGATE_MAX, CONFIDENCE_MAX, POTENTIAL_MAX, SUCCESS_MAX, VALUE_MAX,
    VOLUME_MAX,
};
use serde::{Deserialize, Serialize};

/// The five bounded sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub value: u8,
    pub success: u8,
    pub potential: u8,
    pub confidence: u8,
    pub volume: u8,
}

impl ScoreComponents {
    /// Sum of the sub-scores.
    pub fn aggregate(&self) -> u8 {
        self.value + self.success + self.potential + self.confidence + self.volume
    }

    /// True when every component is inside its declared range.
    pub fn in_range(&self) -> bool {
        self.value <= VALUE_MAX
            && self.success <= SUCCESS_MAX
            && self.potential <= POTENTIAL_MAX
            && self.confidence <= CONFIDENCE_MAX
            && self.volume <= VOLUME_MAX
    }
}

/// Why a record was flagged as low confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceNote {
    /// The dataset carries no subject history at all.
    NoHistory,
    /// Subject missing from the record.
    MissingSubject,
    /// Subject never seen in the history.
    UnknownSubject,
    /// Subject seen, but with fewer cases than the confidence volume.
    SparseSubject,
    /// Problem type missing from the record.
    MissingProblem,
}

/// Scoring outcome for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub components: ScoreComponents,
    pub aggregate: u8,
    pub grade: ViabilityGrade,
    pub binary_label: BinaryLabel,
    /// Aggregate normalised to [0, 1].
    pub probability: f64,
    /// Success rate that fed the success and potential components.
    pub success_rate: f64,
    /// Expected return used for the potential component.
    pub expected_return: f64,
    /// Historical case volume of the subject (0 when unknown).
    pub category_volume: u64,
    pub low_confidence: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<ConfidenceNote>,
}

/// Deterministic, side-effect-free scorer over an immutable configuration.
#[derive(Debug, Clone)]
pub struct ViabilityScorer {
    config: ScoringConfig,
}

impl ViabilityScorer {
    /// The configuration is expected to have passed validation.
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one record against a historical snapshot.
    ///
    /// Fails only on invalid input (negative or non-finite amount).
    pub fn score(&self, record: &CaseRecord, stats: &HistoricalStats) -> Result<ScoreResult> {
        record.validate()?;
        let cfg = &self.config;
        let mut notes = Vec::new();

        let value = cfg.value_bands.score(record.amount);

        let (rate, success, confidence, volume, category_volume) = if stats.is_empty() {
            notes.push(ConfidenceNote::NoHistory);
            (cfg.fallback_success_rate, 0, 0, 0, 0)
        } else {
            match record.subject_key().map(|s| (s, stats.subject(s))) {
                Some((_, Some(cat))) => {
                    if cat.count < cfg.volume.min_confidence_volume {
                        notes.push(ConfidenceNote::SparseSubject);
                    }
                    (
                        cat.success_rate,
                        cfg.success_bands.score(cat.success_rate),
                        u8::from(cat.count >= cfg.volume.min_confidence_volume),
                        u8::from(cat.count >= cfg.volume.min_category_volume),
                        cat.count,
                    )
                }
                Some((_, None)) => {
                    notes.push(ConfidenceNote::UnknownSubject);
                    let rate = cfg.fallback_success_rate;
                    (rate, cfg.success_bands.score(rate), 0, 0, 0)
                }
                None => {
                    notes.push(ConfidenceNote::MissingSubject);
                    let rate = cfg.fallback_success_rate;
                    (rate, cfg.success_bands.score(rate), 0, 0, 0)
                }
            }
        };

        if record.problem_key().is_none() {
            notes.push(ConfidenceNote::MissingProblem);
        }

        let expected_return = record.amount_or_zero() * rate;
        let components = ScoreComponents {
            value,
            success,
            potential: cfg.potential_bands.score(expected_return),
            confidence,
            volume,
        };
        assert!(components.in_range(), "sub-score out of range: {components:?}");

        let aggregate = components.aggregate();
        debug_assert!(aggregate <= AGGREGATE_MAX);
        let grade = cfg.grades.grade(aggregate);
        let binary_label = cfg.binary_label(aggregate);
        debug_assert_eq!(binary_label, grade.coarsen());

        Ok(ScoreResult {
            components,
            aggregate,
            grade,
            binary_label,
            probability: f64::from(aggregate) / f64::from(AGGREGATE_MAX),
            success_rate: rate,
            expected_return,
            category_volume,
            low_confidence: !notes.is_empty(),
            notes,
        })
    }

    /// Score every record; the first invalid record aborts the pass.
    pub fn score_all(
        &self,
        records: &[CaseRecord],
        stats: &HistoricalStats,
    ) -> Result<Vec<ScoreResult>> {
        let results = records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                self.score(record, stats).map_err(|err| match err {
                    cv_common::Error::Validation { field, message } => {
                        cv_common::Error::validation(field, format!("row {row}: {message}"))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let viable = results.iter().filter(|r| r.binary_label.is_viable()).count();
        tracing::info!(
            records = results.len(),
            viable,
            not_viable = results.len() - viable,
            "scoring pass complete"
        );
        Ok(results)
    }
}
