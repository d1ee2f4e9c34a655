//! Viability grade and binary training label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal viability grade derived from the aggregate score.
///
/// Variants are declared in ascending order so `Ord` follows viability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViabilityGrade {
    NotViable,
    Low,
    Medium,
    High,
}

impl ViabilityGrade {
    pub const ALL: [ViabilityGrade; 4] = [
        ViabilityGrade::NotViable,
        ViabilityGrade::Low,
        ViabilityGrade::Medium,
        ViabilityGrade::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViabilityGrade::NotViable => "NOT_VIABLE",
            ViabilityGrade::Low => "LOW",
            ViabilityGrade::Medium => "MEDIUM",
            ViabilityGrade::High => "HIGH",
        }
    }

    /// The binary label this grade coarsens to.
    ///
    /// MEDIUM and HIGH are VIABLE; LOW and NOT_VIABLE are not.
    pub fn coarsen(&self) -> BinaryLabel {
        match self {
            ViabilityGrade::High | ViabilityGrade::Medium => BinaryLabel::Viable,
            ViabilityGrade::Low | ViabilityGrade::NotViable => BinaryLabel::NotViable,
        }
    }
}

impl fmt::Display for ViabilityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-class target used for classifier training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BinaryLabel {
    NotViable,
    Viable,
}

impl BinaryLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryLabel::NotViable => "NOT_VIABLE",
            BinaryLabel::Viable => "VIABLE",
        }
    }

    /// Class index used by classifiers (VIABLE = 1).
    pub fn class(&self) -> u8 {
        match self {
            BinaryLabel::NotViable => 0,
            BinaryLabel::Viable => 1,
        }
    }

    pub fn from_class(class: u8) -> Self {
        if class == 0 {
            BinaryLabel::NotViable
        } else {
            BinaryLabel::Viable
        }
    }

    pub fn is_viable(&self) -> bool {
        matches!(self, BinaryLabel::Viable)
    }

    pub fn other(&self) -> Self {
        match self {
            BinaryLabel::NotViable => BinaryLabel::Viable,
            BinaryLabel::Viable => BinaryLabel::NotViable,
        }
    }
}

impl fmt::Display for BinaryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
