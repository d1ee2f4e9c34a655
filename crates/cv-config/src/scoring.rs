//! Scoring configuration types.
//!
//! Every cutoff the viability scorer uses lives here. The scorer only reads
//! these values; retuning a band never requires a code change.

use cv_common::{BinaryLabel, Region, ViabilityGrade};
use serde::{Deserialize, Serialize};

/// Upper bound of the value sub-score.
pub const VALUE_MAX: u8 = 3;
/// Upper bound of the success sub-score.
pub const SUCCESS_MAX: u8 = 3;
/// Upper bound of the potential sub-score.
pub const POTENTIAL_MAX: u8 = 2;
/// Upper bound of the confidence sub-score.
pub const CONFIDENCE_MAX: u8 = 1;
/// Upper bound of the volume sub-score.
pub const VOLUME_MAX: u8 = 1;
/// Upper bound of the aggregate score.
pub const AGGREGATE_MAX: u8 = VALUE_MAX + SUCCESS_MAX + POTENTIAL_MAX + CONFIDENCE_MAX + VOLUME_MAX;

/// Complete scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub value_bands: ValueBands,

    #[serde(default)]
    pub success_bands: SuccessBands,

    #[serde(default)]
    pub potential_bands: PotentialBands,

    #[serde(default)]
    pub volume: VolumeThresholds,

    #[serde(default)]
    pub grades: GradeThresholds,

    /// Aggregate score at or above which a record is VIABLE.
    #[serde(default = "default_binary_threshold")]
    pub binary_threshold: u8,

    /// Success rate assumed for categories absent from the historical stats.
    #[serde(default = "default_fallback_success_rate")]
    pub fallback_success_rate: f64,

    #[serde(default)]
    pub region_tiers: RegionTiers,

    #[serde(default)]
    pub factor_weights: FactorWeights,
}

fn default_binary_threshold() -> u8 {
    5
}

fn default_fallback_success_rate() -> f64 {
    0.4
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            value_bands: ValueBands::default(),
            success_bands: SuccessBands::default(),
            potential_bands: PotentialBands::default(),
            volume: VolumeThresholds::default(),
            grades: GradeThresholds::default(),
            binary_threshold: default_binary_threshold(),
            fallback_success_rate: default_fallback_success_rate(),
            region_tiers: RegionTiers::default(),
            factor_weights: FactorWeights::default(),
        }
    }
}

impl ScoringConfig {
    /// Binary label for an aggregate score.
    pub fn binary_label(&self, aggregate: u8) -> BinaryLabel {
        if aggregate >= self.binary_threshold {
            BinaryLabel::Viable
        } else {
            BinaryLabel::NotViable
        }
    }
}

/// Amount cutoffs for the value sub-score (0..=3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBands {
    pub high: f64,
    pub medium: f64,
    /// Lowest scoring band. A zero or missing amount always scores 0.
    pub low: f64,
}

impl Default for ValueBands {
    fn default() -> Self {
        Self {
            high: 10_000.0,
            medium: 2_000.0,
            low: 0.0,
        }
    }
}

impl ValueBands {
    pub fn score(&self, amount: Option<f64>) -> u8 {
        let amount = match amount {
            Some(a) if a > 0.0 => a,
            _ => return 0,
        };
        if amount >= self.high {
            3
        } else if amount >= self.medium {
            2
        } else if amount >= self.low {
            1
        } else {
            0
        }
    }
}

/// Historical success-rate cutoffs for the success sub-score (0..=3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessBands {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SuccessBands {
    fn default() -> Self {
        Self {
            high: 0.7,
            medium: 0.5,
            low: 0.3,
        }
    }
}

impl SuccessBands {
    pub fn score(&self, rate: f64) -> u8 {
        if rate >= self.high {
            3
        } else if rate >= self.medium {
            2
        } else if rate >= self.low {
            1
        } else {
            0
        }
    }
}

/// Expected-return cutoffs (amount × success rate) for the potential sub-score (0..=2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialBands {
    pub high: f64,
    pub medium: f64,
}

impl Default for PotentialBands {
    fn default() -> Self {
        Self {
            high: 5_000.0,
            medium: 1_000.0,
        }
    }
}

impl PotentialBands {
    pub fn score(&self, potential: f64) -> u8 {
        if potential >= self.high {
            2
        } else if potential >= self.medium && potential > 0.0 {
            1
        } else {
            0
        }
    }
}

/// Sample-size thresholds for the confidence and volume sub-scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeThresholds {
    /// Minimum observations behind a success rate before it is trusted.
    pub min_confidence_volume: u64,
    /// Coarser volume a category needs to count as established.
    pub min_category_volume: u64,
}

impl Default for VolumeThresholds {
    fn default() -> Self {
        Self {
            min_confidence_volume: 30,
            min_category_volume: 500,
        }
    }
}

/// Lower bounds of each grade band over the aggregate score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeThresholds {
    pub high: u8,
    pub medium: u8,
    pub low: u8,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            high: 7,
            medium: 5,
            low: 3,
        }
    }
}

impl GradeThresholds {
    pub fn grade(&self, aggregate: u8) -> ViabilityGrade {
        if aggregate >= self.high {
            ViabilityGrade::High
        } else if aggregate >= self.medium {
            ViabilityGrade::Medium
        } else if aggregate >= self.low {
            ViabilityGrade::Low
        } else {
            ViabilityGrade::NotViable
        }
    }
}

/// Qualitative tier of a region's historical performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionTier {
    Favorable,
    Neutral,
    Challenging,
}

impl RegionTier {
    /// Points on a 0..=2 scale, for influence ranking.
    pub fn points(&self) -> u8 {
        match self {
            RegionTier::Favorable => 2,
            RegionTier::Neutral => 1,
            RegionTier::Challenging => 0,
        }
    }
}

/// Region tiers used by the online recommendation. Unlisted regions are challenging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTiers {
    pub favorable: Vec<Region>,
    pub neutral: Vec<Region>,
}

impl Default for RegionTiers {
    fn default() -> Self {
        Self {
            favorable: vec![Region::Sudeste, Region::Sul],
            neutral: vec![Region::CentroOeste],
        }
    }
}

impl RegionTiers {
    pub fn tier(&self, region: Region) -> RegionTier {
        if self.favorable.contains(&region) {
            RegionTier::Favorable
        } else if self.neutral.contains(&region) {
            RegionTier::Neutral
        } else {
            RegionTier::Challenging
        }
    }
}

/// Weights applied to each factor's shortfall when ranking influencing factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub value: f64,
    pub region: f64,
    pub subject: f64,
    pub problem: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            value: 1.0,
            region: 0.5,
            subject: 1.0,
            problem: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_max_is_ten() {
        assert_eq!(AGGREGATE_MAX, 10);
    }

    #[test]
    fn value_bands_default() {
        let bands = ValueBands::default();
        assert_eq!(bands.score(None), 0);
        assert_eq!(bands.score(Some(0.0)), 0);
        assert_eq!(bands.score(Some(0.01)), 1);
        assert_eq!(bands.score(Some(2_000.0)), 2);
        assert_eq!(bands.score(Some(9_999.99)), 2);
        assert_eq!(bands.score(Some(10_000.0)), 3);
    }

    #[test]
    fn value_bands_below_low_cutoff_score_zero() {
        let bands = ValueBands {
            high: 100.0,
            medium: 50.0,
            low: 10.0,
        };
        assert_eq!(bands.score(Some(5.0)), 0);
        assert_eq!(bands.score(Some(10.0)), 1);
    }

    #[test]
    fn success_bands_default() {
        let bands = SuccessBands::default();
        assert_eq!(bands.score(0.65), 2);
        assert_eq!(bands.score(0.7), 3);
        assert_eq!(bands.score(0.4), 1);
        assert_eq!(bands.score(0.29), 0);
    }

    #[test]
    fn potential_zero_never_scores() {
        let bands = PotentialBands {
            high: 10.0,
            medium: 0.0,
        };
        assert_eq!(bands.score(0.0), 0);
        assert_eq!(bands.score(1.0), 1);
    }

    #[test]
    fn grade_steps() {
        let grades = GradeThresholds::default();
        let expected = [
            (0, ViabilityGrade::NotViable),
            (2, ViabilityGrade::NotViable),
            (3, ViabilityGrade::Low),
            (4, ViabilityGrade::Low),
            (5, ViabilityGrade::Medium),
            (6, ViabilityGrade::Medium),
            (7, ViabilityGrade::High),
            (10, ViabilityGrade::High),
        ];
        for (score, grade) in expected {
            assert_eq!(grades.grade(score), grade, "score {score}");
        }
    }

    #[test]
    fn binary_label_threshold() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.binary_label(4), BinaryLabel::NotViable);
        assert_eq!(cfg.binary_label(5), BinaryLabel::Viable);
    }

    #[test]
    fn region_tiers_default() {
        let tiers = RegionTiers::default();
        assert_eq!(tiers.tier(Region::Sul), RegionTier::Favorable);
        assert_eq!(tiers.tier(Region::CentroOeste), RegionTier::Neutral);
        assert_eq!(tiers.tier(Region::Norte), RegionTier::Challenging);
        assert_eq!(tiers.tier(Region::Unknown), RegionTier::Challenging);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ScoringConfig =
            serde_json::from_str(r#"{"binary_threshold": 5, "value_bands": {"high": 20000, "medium": 3000, "low": 100}}"#)
                .unwrap();
        assert_eq!(cfg.value_bands.high, 20_000.0);
        assert_eq!(cfg.success_bands, SuccessBands::default());
        assert_eq!(cfg.region_tiers.favorable, vec![Region::Sudeste, Region::Sul]);
    }
}
