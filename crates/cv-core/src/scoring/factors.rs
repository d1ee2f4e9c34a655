//! Influencing factors for the single-record explanation.
//!
//! Each factor gets a score on its own small scale. Influence is
//! `weight × (max − score)`, so the factors holding the case back the most
//! come first. Ties keep the fixed priority order value, region, subject,
//! problem.

use cv_common::CaseRecord;
use cv_config::scoring::{
    RegionTier, ScoringConfig, CONFIDENCE_MAX, POTENTIAL_MAX, SUCCESS_MAX, VALUE_MAX, VOLUME_MAX,
};
use serde::{Deserialize, Serialize};

use super::stats::HistoricalStats;
use super::ScoreResult;

/// Factor identity, declared in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Value,
    Region,
    Subject,
    Problem,
}

impl FactorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorKind::Value => "value",
            FactorKind::Region => "region",
            FactorKind::Subject => "subject",
            FactorKind::Problem => "problem",
        }
    }
}

/// Qualitative reading of a factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorTag {
    Favorable,
    Neutral,
    Unfavorable,
}

impl FactorTag {
    /// Upper third is favorable, middle third neutral.
    fn from_score(score: u8, max: u8) -> Self {
        let (score, max) = (u32::from(score), u32::from(max));
        if max == 0 || 3 * score >= 2 * max {
            FactorTag::Favorable
        } else if 3 * score >= max {
            FactorTag::Neutral
        } else {
            FactorTag::Unfavorable
        }
    }
}

/// One ranked explanation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluencingFactor {
    pub kind: FactorKind,
    pub tag: FactorTag,
    pub score: u8,
    pub max: u8,
    pub influence: f64,
    pub reason: String,
}

impl InfluencingFactor {
    fn new(kind: FactorKind, score: u8, max: u8, weight: f64, reason: String) -> Self {
        Self {
            kind,
            tag: FactorTag::from_score(score, max),
            score,
            max,
            influence: weight * f64::from(max.saturating_sub(score)),
            reason,
        }
    }
}

/// Rank the factors behind a scored record, most influential first.
pub fn rank_factors(
    record: &CaseRecord,
    result: &ScoreResult,
    stats: &HistoricalStats,
    config: &ScoringConfig,
) -> Vec<InfluencingFactor> {
    let weights = &config.factor_weights;
    let c = &result.components;

    let value = InfluencingFactor::new(
        FactorKind::Value,
        c.value + c.potential,
        VALUE_MAX + POTENTIAL_MAX,
        weights.value,
        value_reason(record, result),
    );

    let region = record.effective_region();
    let tier = config.region_tiers.tier(region);
    let region = InfluencingFactor::new(
        FactorKind::Region,
        tier.points(),
        2,
        weights.region,
        match tier {
            RegionTier::Favorable => format!("{region} has historically favorable outcomes"),
            RegionTier::Neutral => format!("{region} has average historical outcomes"),
            RegionTier::Challenging => format!("{region} has historically challenging outcomes"),
        },
    );

    let subject = InfluencingFactor::new(
        FactorKind::Subject,
        c.success + c.confidence + c.volume,
        SUCCESS_MAX + CONFIDENCE_MAX + VOLUME_MAX,
        weights.subject,
        subject_reason(record, result),
    );

    let (problem_score, problem_reason) = match record.problem_key() {
        Some(problem) => match stats.problem(problem) {
            Some(cat) => (
                config.success_bands.score(cat.success_rate),
                format!(
                    "problem type '{problem}' resolves {:.1}% of {} cases",
                    cat.success_rate * 100.0,
                    cat.count
                ),
            ),
            None => (
                config.success_bands.score(config.fallback_success_rate),
                format!("problem type '{problem}' has no history; neutral default applied"),
            ),
        },
        None => (
            config.success_bands.score(config.fallback_success_rate),
            "problem type not informed; neutral default applied".to_string(),
        ),
    };
    let problem = InfluencingFactor::new(
        FactorKind::Problem,
        problem_score,
        SUCCESS_MAX,
        weights.problem,
        problem_reason,
    );

    let mut factors = vec![value, region, subject, problem];
    // Stable: equal influence keeps the priority order above.
    factors.sort_by(|a, b| b.influence.total_cmp(&a.influence));
    factors
}

fn value_reason(record: &CaseRecord, result: &ScoreResult) -> String {
    match record.amount {
        Some(amount) if amount > 0.0 => format!(
            "amount R$ {amount:.2} scores {}/{VALUE_MAX}; expected return R$ {:.2}",
            result.components.value, result.expected_return
        ),
        _ => "no amount informed; value and potential score zero".to_string(),
    }
}

fn subject_reason(record: &CaseRecord, result: &ScoreResult) -> String {
    let subject = record.subject_key().unwrap_or("not informed");
    if result.category_volume == 0 {
        format!(
            "subject '{subject}' has no history; assumed success rate {:.1}%",
            result.success_rate * 100.0
        )
    } else {
        format!(
            "subject '{subject}' resolves {:.1}% of {} historical cases",
            result.success_rate * 100.0,
            result.category_volume
        )
    }
}
