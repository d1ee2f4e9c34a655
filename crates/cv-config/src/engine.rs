//! Top-level engine configuration.

use crate::balancing::BalancingConfig;
use crate::scoring::ScoringConfig;
use crate::training::TrainingConfig;
use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};

/// Complete engine configuration.
///
/// Built once, validated, then passed by reference into each component.
/// Nothing in the engine mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub balancing: BalancingConfig,

    #[serde(default)]
    pub training: TrainingConfig,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            description: None,
            scoring: ScoringConfig::default(),
            balancing: BalancingConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Canonical JSON form, used for hashing.
    pub fn to_canonical_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
