//! Configuration presets for common intake postures.
//!
//! Provides pre-built configurations for:
//! - Standard: the documented default bands
//! - Strict: higher value and success cutoffs, more evidence required
//! - Lenient: lower cutoffs for small-claims practices, duplication fallback on
//!
//! Every preset keeps the binary threshold on the MEDIUM lower bound.

use crate::balancing::BalancingConfig;
use crate::scoring::{ScoringConfig, SuccessBands, ValueBands, VolumeThresholds};
use crate::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Documented default bands
    Standard,
    /// Higher cutoffs, more historical evidence required
    Strict,
    /// Lower cutoffs for small-claims intake
    Lenient,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Standard, PresetName::Strict, PresetName::Lenient];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Standard => "standard",
            PresetName::Strict => "strict",
            PresetName::Lenient => "lenient",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Some(PresetName::Standard),
            "strict" | "conservative-intake" => Some(PresetName::Strict),
            "lenient" | "small-claims" => Some(PresetName::Lenient),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Standard => "Documented default bands and thresholds",
            PresetName::Strict => {
                "Higher value and success cutoffs; categories need more history to count"
            }
            PresetName::Lenient => {
                "Lower cutoffs for small-claims intake; duplication fallback enabled"
            }
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone)]
pub enum PresetError {
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => {
                write!(
                    f,
                    "Unknown preset '{}'. Available: {}",
                    name,
                    PresetName::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for PresetError {}

/// Build the configuration for a preset.
pub fn get_preset(name: PresetName) -> EngineConfig {
    match name {
        PresetName::Standard => EngineConfig {
            description: Some(name.description().to_string()),
            ..EngineConfig::default()
        },
        PresetName::Strict => strict_preset(),
        PresetName::Lenient => lenient_preset(),
    }
}

fn strict_preset() -> EngineConfig {
    EngineConfig {
        description: Some(PresetName::Strict.description().to_string()),
        scoring: ScoringConfig {
            value_bands: ValueBands {
                high: 20_000.0,
                medium: 5_000.0,
                low: 500.0,
            },
            success_bands: SuccessBands {
                high: 0.75,
                medium: 0.55,
                low: 0.35,
            },
            volume: VolumeThresholds {
                min_confidence_volume: 100,
                min_category_volume: 1_000,
            },
            fallback_success_rate: 0.3,
            ..ScoringConfig::default()
        },
        ..EngineConfig::default()
    }
}

fn lenient_preset() -> EngineConfig {
    EngineConfig {
        description: Some(PresetName::Lenient.description().to_string()),
        scoring: ScoringConfig {
            value_bands: ValueBands {
                high: 5_000.0,
                medium: 1_000.0,
                low: 0.0,
            },
            success_bands: SuccessBands {
                high: 0.6,
                medium: 0.4,
                low: 0.25,
            },
            volume: VolumeThresholds {
                min_confidence_volume: 10,
                min_category_volume: 100,
            },
            ..ScoringConfig::default()
        },
        balancing: BalancingConfig {
            allow_duplication_fallback: true,
            ..BalancingConfig::default()
        },
        ..EngineConfig::default()
    }
}

/// Summary information about a preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub value_high: f64,
    pub success_high: f64,
    pub min_confidence_volume: u64,
    pub binary_threshold: u8,
    pub allow_duplication_fallback: bool,
}

impl PresetInfo {
    /// Create info from a preset.
    pub fn from_preset(name: PresetName) -> Self {
        let config = get_preset(name);
        Self {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
            value_high: config.scoring.value_bands.high,
            success_high: config.scoring.success_bands.high,
            min_confidence_volume: config.scoring.volume.min_confidence_volume,
            binary_threshold: config.scoring.binary_threshold,
            allow_duplication_fallback: config.balancing.allow_duplication_fallback,
        }
    }
}

/// List all available presets with summary information.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}
