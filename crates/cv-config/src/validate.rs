//! Configuration validation errors and semantic validation.
//!
//! Every check here runs at load time. A configuration that passes can be
//! used for scoring without any further range checks.

use crate::balancing::BalancingConfig;
use crate::scoring::{ScoringConfig, AGGREGATE_MAX};
use crate::training::TrainingConfig;
use crate::EngineConfig;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 10,
            ValidationError::InvalidValue { .. } => 11,
            ValidationError::VersionMismatch { .. } => 12,
        }
    }

    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for cv_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidValue { field, message } => {
                cv_common::Error::InvalidConfig { field, message }
            }
            other => cv_common::Error::Configuration(other.to_string()),
        }
    }
}

/// Validate the whole engine configuration.
pub fn validate_engine_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_scoring(&config.scoring)?;
    validate_balancing(&config.balancing)?;
    validate_training(&config.training)?;

    Ok(())
}

/// Validate scoring bands and grade thresholds.
pub fn validate_scoring(scoring: &ScoringConfig) -> ValidationResult<()> {
    let v = &scoring.value_bands;
    for (name, value) in [("high", v.high), ("medium", v.medium), ("low", v.low)] {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::invalid(
                format!("scoring.value_bands.{}", name),
                format!("Must be finite and non-negative, got {}", value),
            ));
        }
    }
    if !(v.low < v.medium && v.medium < v.high) {
        return Err(ValidationError::invalid(
            "scoring.value_bands",
            format!(
                "Must satisfy low < medium < high, got low={} medium={} high={}",
                v.low, v.medium, v.high
            ),
        ));
    }

    let s = &scoring.success_bands;
    for (name, rate) in [("high", s.high), ("medium", s.medium), ("low", s.low)] {
        validate_rate(&format!("scoring.success_bands.{}", name), rate)?;
    }
    if !(s.low < s.medium && s.medium < s.high) {
        return Err(ValidationError::invalid(
            "scoring.success_bands",
            format!(
                "Must satisfy low < medium < high, got low={} medium={} high={}",
                s.low, s.medium, s.high
            ),
        ));
    }

    let p = &scoring.potential_bands;
    if !p.medium.is_finite() || !p.high.is_finite() || p.medium < 0.0 || p.medium >= p.high {
        return Err(ValidationError::invalid(
            "scoring.potential_bands",
            format!(
                "Must satisfy 0 <= medium < high, got medium={} high={}",
                p.medium, p.high
            ),
        ));
    }

    validate_rate("scoring.fallback_success_rate", scoring.fallback_success_rate)?;

    if scoring.volume.min_category_volume < scoring.volume.min_confidence_volume {
        return Err(ValidationError::invalid(
            "scoring.volume.min_category_volume",
            format!(
                "Must be >= min_confidence_volume ({}), got {}",
                scoring.volume.min_confidence_volume, scoring.volume.min_category_volume
            ),
        ));
    }

    let g = &scoring.grades;
    if !(0 < g.low && g.low < g.medium && g.medium < g.high && g.high <= AGGREGATE_MAX) {
        return Err(ValidationError::invalid(
            "scoring.grades",
            format!(
                "Must satisfy 0 < low < medium < high <= {}, got low={} medium={} high={}",
                AGGREGATE_MAX, g.low, g.medium, g.high
            ),
        ));
    }

    // The binary label must be a strict coarsening of the grade.
    if scoring.binary_threshold != g.medium {
        return Err(ValidationError::SemanticError(format!(
            "binary_threshold ({}) must equal the MEDIUM grade lower bound ({}) so that \
             HIGH/MEDIUM map to VIABLE and LOW/NOT_VIABLE to NOT_VIABLE",
            scoring.binary_threshold, g.medium
        )));
    }

    if let Some(region) = scoring
        .region_tiers
        .favorable
        .iter()
        .find(|r| scoring.region_tiers.neutral.contains(r))
    {
        return Err(ValidationError::SemanticError(format!(
            "region '{}' is listed as both favorable and neutral",
            region
        )));
    }

    let w = &scoring.factor_weights;
    for (name, weight) in [
        ("value", w.value),
        ("region", w.region),
        ("subject", w.subject),
        ("problem", w.problem),
    ] {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ValidationError::invalid(
                format!("scoring.factor_weights.{}", name),
                format!("Must be finite and non-negative, got {}", weight),
            ));
        }
    }

    Ok(())
}

/// Validate imbalance cutoffs and resampling parameters.
pub fn validate_balancing(balancing: &BalancingConfig) -> ValidationResult<()> {
    let c = &balancing.cutoffs;
    if !(1.0 <= c.conservative && c.conservative < c.moderate && c.moderate < c.aggressive)
        || !c.aggressive.is_finite()
    {
        return Err(ValidationError::invalid(
            "balancing.cutoffs",
            format!(
                "Must satisfy 1 <= conservative < moderate < aggressive, got {} / {} / {}",
                c.conservative, c.moderate, c.aggressive
            ),
        ));
    }

    let cap = balancing.conservative_ratio_cap;
    if !cap.is_finite() || cap < 1.0 || cap >= c.conservative {
        return Err(ValidationError::invalid(
            "balancing.conservative_ratio_cap",
            format!(
                "Must satisfy 1 <= cap < cutoffs.conservative ({}), got {}",
                c.conservative, cap
            ),
        ));
    }

    if balancing.k_neighbors == 0 {
        return Err(ValidationError::invalid(
            "balancing.k_neighbors",
            "Must be at least 1",
        ));
    }

    if balancing.cleaning_neighbors == 0 {
        return Err(ValidationError::invalid(
            "balancing.cleaning_neighbors",
            "Must be at least 1",
        ));
    }

    if balancing.comparison_strategies.is_empty() {
        return Err(ValidationError::invalid(
            "balancing.comparison_strategies",
            "Must name at least one strategy",
        ));
    }

    Ok(())
}

/// Validate split and model hyperparameters.
pub fn validate_training(training: &TrainingConfig) -> ValidationResult<()> {
    if !(training.test_fraction > 0.0 && training.test_fraction < 1.0) {
        return Err(ValidationError::invalid(
            "training.test_fraction",
            format!("Must be in (0, 1), got {}", training.test_fraction),
        ));
    }

    if training.candidates.is_empty() {
        return Err(ValidationError::invalid(
            "training.candidates",
            "Must name at least one model",
        ));
    }

    validate_rate("training.decision_threshold", training.decision_threshold)?;

    if !training.auc_tie_tolerance.is_finite() || training.auc_tie_tolerance < 0.0 {
        return Err(ValidationError::invalid(
            "training.auc_tie_tolerance",
            format!("Must be non-negative, got {}", training.auc_tie_tolerance),
        ));
    }

    validate_positive("training.logistic.learning_rate", training.logistic.learning_rate)?;
    validate_positive("training.boosting.learning_rate", training.boosting.learning_rate)?;
    if training.logistic.l2 < 0.0 {
        return Err(ValidationError::invalid(
            "training.logistic.l2",
            "Must be non-negative",
        ));
    }
    if !(training.boosting.subsample > 0.0 && training.boosting.subsample <= 1.0) {
        return Err(ValidationError::invalid(
            "training.boosting.subsample",
            format!("Must be in (0, 1], got {}", training.boosting.subsample),
        ));
    }

    for (field, value) in [
        ("training.logistic.iterations", training.logistic.iterations),
        ("training.tree.max_depth", training.tree.max_depth),
        ("training.tree.min_samples_split", training.tree.min_samples_split),
        ("training.tree.min_samples_leaf", training.tree.min_samples_leaf),
        ("training.forest.n_trees", training.forest.n_trees),
        ("training.forest.max_depth", training.forest.max_depth),
        ("training.boosting.n_rounds", training.boosting.n_rounds),
        ("training.boosting.max_depth", training.boosting.max_depth),
    ] {
        if value == 0 {
            return Err(ValidationError::invalid(field, "Must be at least 1"));
        }
    }

    if training.forest.max_features == Some(0) {
        return Err(ValidationError::invalid(
            "training.forest.max_features",
            "Must be at least 1 when set",
        ));
    }

    Ok(())
}

fn validate_rate(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::invalid(
            field,
            format!("Must be in [0, 1], got {}", value),
        ));
    }
    Ok(())
}

fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::invalid(
            field,
            format!("Must be positive, got {}", value),
        ));
    }
    Ok(())
}
