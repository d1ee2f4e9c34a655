//! Names of resampling strategies and classifier variants.
//!
//! Both are referenced from configuration files, CLI flags, provenance
//! records and selection summaries, so their string forms are stable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named class-balancing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Leave the data untouched.
    None,
    /// Random undersampling of the majority down to a ratio cap.
    Conservative,
    /// Synthetic minority oversampling to parity.
    Moderate,
    /// Synthetic oversampling followed by nearest-neighbour cleaning.
    Aggressive,
    /// Delegate to the imbalance analyzer's recommendation.
    Auto,
    /// Minority duplication to parity.
    RandomOversample,
    /// Majority undersampling to parity.
    RandomUndersample,
}

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::None,
        Strategy::Conservative,
        Strategy::Moderate,
        Strategy::Aggressive,
        Strategy::Auto,
        Strategy::RandomOversample,
        Strategy::RandomUndersample,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::None => "none",
            Strategy::Conservative => "conservative",
            Strategy::Moderate => "moderate",
            Strategy::Aggressive => "aggressive",
            Strategy::Auto => "auto",
            Strategy::RandomOversample => "random_oversample",
            Strategy::RandomUndersample => "random_undersample",
        }
    }

    pub fn parse(s: &str) -> Option<Strategy> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Some(Strategy::None),
            "conservative" => Some(Strategy::Conservative),
            "moderate" | "smote" => Some(Strategy::Moderate),
            "aggressive" | "smote_enn" => Some(Strategy::Aggressive),
            "auto" => Some(Strategy::Auto),
            "random_oversample" => Some(Strategy::RandomOversample),
            "random_undersample" => Some(Strategy::RandomUndersample),
            _ => None,
        }
    }

    /// Whether the strategy generates synthetic minority points.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Strategy::Moderate | Strategy::Aggressive)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::parse(s).ok_or_else(|| {
            format!(
                "unknown strategy '{}'. Available: {}",
                s,
                Strategy::ALL
                    .iter()
                    .map(|st| st.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }
}

/// A classifier family the model selector can train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Logistic,
    DecisionTree,
    GradientBoosting,
    RandomForest,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Logistic,
        ModelKind::DecisionTree,
        ModelKind::GradientBoosting,
        ModelKind::RandomForest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Logistic => "logistic",
            ModelKind::DecisionTree => "decision_tree",
            ModelKind::GradientBoosting => "gradient_boosting",
            ModelKind::RandomForest => "random_forest",
        }
    }

    pub fn parse(s: &str) -> Option<ModelKind> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "logistic" | "linear" | "logistic_regression" => Some(ModelKind::Logistic),
            "decision_tree" | "tree" => Some(ModelKind::DecisionTree),
            "gradient_boosting" | "boosting" => Some(ModelKind::GradientBoosting),
            "random_forest" | "forest" | "ensemble" => Some(ModelKind::RandomForest),
            _ => None,
        }
    }

    /// Simplicity rank used to break metric ties; lower is simpler.
    ///
    /// Order: linear < single tree < boosting < ensemble.
    pub fn complexity(&self) -> u8 {
        match self {
            ModelKind::Logistic => 0,
            ModelKind::DecisionTree => 1,
            ModelKind::GradientBoosting => 2,
            ModelKind::RandomForest => 3,
        }
    }

    /// Whether the model exposes split-based feature importances.
    pub fn is_tree_based(&self) -> bool {
        !matches!(self, ModelKind::Logistic)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::parse(s).ok_or_else(|| format!("unknown model kind '{}'", s))
    }
}
