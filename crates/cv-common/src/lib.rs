//! Case viability common types and errors.
//!
//! This crate provides foundational types shared across the engine crates:
//! - Case records as delivered by the ingestion collaborator
//! - Ordinal viability grades and the binary training label
//! - The unified error type with stable codes
//! - Strategy and classifier names
//! - Output format specifications

pub mod error;
pub mod labels;
pub mod output;
pub mod record;
pub mod strategy;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use labels::{BinaryLabel, ViabilityGrade};
pub use output::OutputFormat;
pub use record::{CaseRecord, Outcome, Region};
pub use strategy::{ModelKind, Strategy};

/// Version of every JSON payload the engine emits.
pub const SCHEMA_VERSION: &str = "1.0.0";
