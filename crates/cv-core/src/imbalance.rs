//! Class-imbalance measurement and the automatic strategy policy.

use cv_common::{BinaryLabel, Error, Result, Strategy};
use cv_config::balancing::ImbalanceCutoffs;
use serde::{Deserialize, Serialize};

/// Counts per binary class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassCounts {
    pub viable: usize,
    pub not_viable: usize,
}

impl ClassCounts {
    pub fn from_labels(labels: &[BinaryLabel]) -> Self {
        let viable = labels.iter().filter(|l| l.is_viable()).count();
        Self {
            viable,
            not_viable: labels.len() - viable,
        }
    }

    pub fn total(&self) -> usize {
        self.viable + self.not_viable
    }

    pub fn get(&self, label: BinaryLabel) -> usize {
        match label {
            BinaryLabel::Viable => self.viable,
            BinaryLabel::NotViable => self.not_viable,
        }
    }

    /// Larger class; NOT_VIABLE on a tie.
    pub fn majority(&self) -> BinaryLabel {
        if self.viable > self.not_viable {
            BinaryLabel::Viable
        } else {
            BinaryLabel::NotViable
        }
    }

    pub fn minority(&self) -> BinaryLabel {
        self.majority().other()
    }
}

/// Descriptive severity of the skew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImbalanceLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl ImbalanceLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 2.0 {
            ImbalanceLevel::Low
        } else if ratio < 5.0 {
            ImbalanceLevel::Moderate
        } else if ratio < 10.0 {
            ImbalanceLevel::High
        } else {
            ImbalanceLevel::Extreme
        }
    }
}

/// Measured imbalance of one labelled dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImbalanceReport {
    pub counts: ClassCounts,
    pub majority: BinaryLabel,
    pub minority: BinaryLabel,
    /// majority count / minority count
    pub ratio: f64,
    pub minority_share: f64,
    pub level: ImbalanceLevel,
    pub recommended: Strategy,
}

/// Strategy for an imbalance ratio. Each cutoff is an inclusive lower bound.
///
/// ```text
/// ratio < conservative            -> none
/// conservative <= ratio < moderate -> conservative
/// moderate <= ratio < aggressive   -> moderate
/// ratio >= aggressive              -> aggressive
/// ```
pub fn recommend_strategy(ratio: f64, cutoffs: &ImbalanceCutoffs) -> Strategy {
    if ratio >= cutoffs.aggressive {
        Strategy::Aggressive
    } else if ratio >= cutoffs.moderate {
        Strategy::Moderate
    } else if ratio >= cutoffs.conservative {
        Strategy::Conservative
    } else {
        Strategy::None
    }
}

/// Measures class skew and recommends a strategy.
#[derive(Debug, Clone, Default)]
pub struct ImbalanceAnalyzer {
    cutoffs: ImbalanceCutoffs,
}

impl ImbalanceAnalyzer {
    pub fn new(cutoffs: ImbalanceCutoffs) -> Self {
        Self { cutoffs }
    }

    /// Fails on empty input or when only one class is present, since the
    /// ratio is undefined there.
    pub fn analyze(&self, labels: &[BinaryLabel]) -> Result<ImbalanceReport> {
        if labels.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let counts = ClassCounts::from_labels(labels);
        let majority = counts.majority();
        let minority = counts.minority();
        let minority_count = counts.get(minority);
        if minority_count == 0 {
            return Err(Error::SingleClass {
                present: majority.to_string(),
            });
        }

        let ratio = counts.get(majority) as f64 / minority_count as f64;
        let report = ImbalanceReport {
            counts,
            majority,
            minority,
            ratio,
            minority_share: minority_count as f64 / counts.total() as f64,
            level: ImbalanceLevel::from_ratio(ratio),
            recommended: recommend_strategy(ratio, &self.cutoffs),
        };
        tracing::info!(
            majority = counts.get(majority),
            minority = minority_count,
            ratio,
            recommended = %report.recommended,
            "imbalance measured"
        );
        Ok(report)
    }
}
