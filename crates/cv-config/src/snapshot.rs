//! Configuration snapshots for reproducibility.
//!
//! A snapshot captures the exact effective configuration of a run so that a
//! balanced dataset or a model selection can be traced back and reproduced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::ConfigPaths;
use crate::EngineConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the configuration was loaded from, if any.
    #[serde(default)]
    pub path: Option<String>,

    /// Where the configuration came from.
    pub source: String,

    /// SHA-256 of the canonical JSON of the effective configuration.
    pub config_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub value_bands: [f64; 3],
    pub success_bands: [f64; 3],
    pub binary_threshold: u8,
    pub imbalance_cutoffs: [f64; 3],
    pub seed: u64,
    pub test_fraction: f64,
}

impl ConfigSummary {
    fn from_config(config: &EngineConfig) -> Self {
        let s = &config.scoring;
        let c = &config.balancing.cutoffs;
        Self {
            value_bands: [s.value_bands.low, s.value_bands.medium, s.value_bands.high],
            success_bands: [
                s.success_bands.low,
                s.success_bands.medium,
                s.success_bands.high,
            ],
            binary_threshold: s.binary_threshold,
            imbalance_cutoffs: [c.conservative, c.moderate, c.aggressive],
            seed: config.training.seed,
            test_fraction: config.training.test_fraction,
        }
    }
}

impl ConfigSnapshot {
    /// Capture the effective configuration and where it came from.
    pub fn capture(config: &EngineConfig, paths: &ConfigPaths) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            path: paths.engine.as_ref().map(|p| p.display().to_string()),
            source: paths.source.to_string(),
            config_hash: hash_content(&config.to_canonical_json()),
            summary: ConfigSummary::from_config(config),
        }
    }

    /// Snapshot of the built-in defaults.
    pub fn defaults_only() -> Self {
        Self::capture(&EngineConfig::default(), &ConfigPaths::default())
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot describes the same effective configuration.
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.config_hash == other.config_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.config_hash[..12.min(self.config_hash.len())]
    }
}

/// Hash content with SHA-256 and return hex string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ConfigSource;

    #[test]
    fn test_defaults_snapshot() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert!(snapshot.path.is_none());
        assert_eq!(snapshot.source, ConfigSource::BuiltinDefault.to_string());
        assert_eq!(snapshot.summary.binary_threshold, 5);
        assert_eq!(snapshot.summary.seed, 42);
    }

    #[test]
    fn test_snapshot_short_id() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.short_id().len(), 12);
    }

    #[test]
    fn test_snapshot_matches_same_config() {
        let s1 = ConfigSnapshot::defaults_only();
        let s2 = ConfigSnapshot::defaults_only();
        assert!(s1.matches(&s2));
    }

    #[test]
    fn test_snapshot_differs_when_seed_changes() {
        let mut cfg = EngineConfig::default();
        cfg.training.seed = 7;
        let changed = ConfigSnapshot::capture(&cfg, &ConfigPaths::default());
        assert!(!changed.matches(&ConfigSnapshot::defaults_only()));
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = ConfigSnapshot::defaults_only();
        let json = snapshot.to_json().unwrap();
        let restored = ConfigSnapshot::from_json(&json).unwrap();
        assert!(snapshot.matches(&restored));
    }
}
