//! Error types for the viability engine.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 30,
//!   "category": "data",
//!   "message": "insufficient minority samples for strategy 'moderate': have 3, need 6",
//!   "recoverable": true,
//!   "context": { "strategy": "moderate", "minority": 3, "required": 6 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Band/threshold configuration errors, detected at load time.
    Config,
    /// Malformed or out-of-range input.
    Validation,
    /// Not enough data for the requested operation.
    Data,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the viability engine.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid configuration value for {field}: {message}")]
    InvalidConfig { field: String, message: String },

    // Validation errors (20-29)
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("required column missing: {0}")]
    MissingColumn(String),

    #[error("feature '{feature}' is not numeric; encode it before resampling")]
    NonNumericFeature { feature: String },

    #[error("dataset is empty")]
    EmptyDataset,

    // Data sufficiency errors (30-39)
    #[error(
        "insufficient minority samples for strategy '{strategy}': have {minority}, need {required}"
    )]
    InsufficientData {
        strategy: String,
        minority: usize,
        required: usize,
    },

    #[error("labels contain a single class ({present}); imbalance is undefined")]
    SingleClass { present: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl Error {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Validation errors
    /// - 30-39: Data sufficiency errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Configuration(_) => 10,
            Error::InvalidConfig { .. } => 11,
            Error::Validation { .. } => 20,
            Error::MissingColumn(_) => 21,
            Error::NonNumericFeature { .. } => 22,
            Error::EmptyDataset => 23,
            Error::InsufficientData { .. } => 30,
            Error::SingleClass { .. } => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Csv(_) => 62,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration(_) | Error::InvalidConfig { .. } => ErrorCategory::Config,

            Error::Validation { .. }
            | Error::MissingColumn(_)
            | Error::NonNumericFeature { .. }
            | Error::EmptyDataset => ErrorCategory::Validation,

            Error::InsufficientData { .. } | Error::SingleClass { .. } => ErrorCategory::Data,

            Error::Io(_) | Error::Json(_) | Error::Csv(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the caller can reasonably retry with different input.
    ///
    /// Insufficient-data errors are recoverable by retrying with a softer
    /// strategy; configuration errors by fixing the config file.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Configuration(_) | Error::InvalidConfig { .. } => true,

            Error::Validation { .. } => false,
            Error::MissingColumn(_) => false,
            Error::NonNumericFeature { .. } => true,
            Error::EmptyDataset => false,

            Error::InsufficientData { .. } => true,
            Error::SingleClass { .. } => false,

            Error::Io(_) => true,
            Error::Json(_) | Error::Csv(_) => false,
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "Configuration Error",
            Error::InvalidConfig { .. } => "Invalid Configuration Value",
            Error::Validation { .. } => "Validation Error",
            Error::MissingColumn(_) => "Missing Column",
            Error::NonNumericFeature { .. } => "Non-numeric Feature",
            Error::EmptyDataset => "Empty Dataset",
            Error::InsufficientData { .. } => "Insufficient Minority Samples",
            Error::SingleClass { .. } => "Single-class Labels",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
            Error::Csv(_) => "CSV Error",
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Configuration(_) | Error::InvalidConfig { .. } => {
                "Run 'cv-core config validate' and fix the reported band or threshold."
            }
            Error::Validation { .. } => "Correct the offending record field and re-run.",
            Error::MissingColumn(_) => {
                "The input must provide amount, subject, problem, region, state, outcome and year columns."
            }
            Error::NonNumericFeature { .. } => {
                "Encode categorical features numerically before synthetic oversampling."
            }
            Error::EmptyDataset => "Provide at least one record.",
            Error::InsufficientData { .. } => {
                "Retry with a softer strategy (e.g. 'conservative') or enable the duplication fallback."
            }
            Error::SingleClass { .. } => {
                "Every record received the same label; review the scoring bands or the input sample."
            }
            Error::Io(_) => "Check paths and permissions, then retry.",
            Error::Json(_) => "Check the JSON syntax of the file.",
            Error::Csv(_) => "Check the CSV header and delimiter.",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InsufficientData {
                strategy,
                minority,
                required,
            } => {
                context.insert("strategy".to_string(), serde_json::json!(strategy));
                context.insert("minority".to_string(), serde_json::json!(minority));
                context.insert("required".to_string(), serde_json::json!(required));
            }
            Error::Validation { field, .. } | Error::InvalidConfig { field, .. } => {
                context.insert("field".to_string(), serde_json::json!(field));
            }
            Error::NonNumericFeature { feature } => {
                context.insert("feature".to_string(), serde_json::json!(feature));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_category_ranges() {
        let cases = vec![
            Error::Configuration("x".into()),
            Error::validation("amount", "negative"),
            Error::InsufficientData {
                strategy: "moderate".into(),
                minority: 2,
                required: 6,
            },
            Error::Csv("bad".into()),
        ];

        for err in cases {
            let code = err.code();
            let range = match err.category() {
                ErrorCategory::Config => 10..20,
                ErrorCategory::Validation => 20..30,
                ErrorCategory::Data => 30..40,
                ErrorCategory::Io => 60..70,
            };
            assert!(range.contains(&code), "{err} has code {code}");
        }
    }

    #[test]
    fn insufficient_data_names_strategy() {
        let err = Error::InsufficientData {
            strategy: "aggressive".into(),
            minority: 3,
            required: 6,
        };
        assert!(err.to_string().contains("aggressive"));
        assert!(err.is_recoverable());

        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 30);
        assert_eq!(structured.context["strategy"], serde_json::json!("aggressive"));
    }

    #[test]
    fn validation_errors_are_not_recoverable() {
        let err = Error::validation("amount", "must be non-negative, got -1");
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(StructuredError::from(&err).to_json().contains("\"field\":\"amount\""));
    }
}
