//! Case viability engine configuration.
//!
//! This crate provides:
//! - Typed, immutable configuration for scoring, balancing and training
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation, including the grade/binary alignment check
//! - Named presets
//! - Config snapshots for reproducibility

pub mod balancing;
pub mod engine;
pub mod preset;
pub mod resolve;
pub mod scoring;
pub mod snapshot;
pub mod training;
pub mod validate;

pub use balancing::{BalancingConfig, ImbalanceCutoffs};
pub use engine::EngineConfig;
pub use preset::{get_preset, list_presets, PresetInfo, PresetName};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use scoring::{
    FactorWeights, GradeThresholds, PotentialBands, RegionTier, RegionTiers, ScoringConfig,
    SuccessBands, ValueBands, VolumeThresholds,
};
pub use snapshot::ConfigSnapshot;
pub use training::TrainingConfig;
pub use validate::{validate_engine_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
