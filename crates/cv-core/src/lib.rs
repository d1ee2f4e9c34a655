//! Case Viability Core Library
//!
//! This library provides the engine behind the `cv-core` binary:
//! - Rule-based viability scoring and label quality analysis
//! - Class imbalance analysis and strategy recommendation
//! - Resampling strategies with provenance
//! - Classifier training and held-out model selection
//! - Single-case recommendations
//!
//! The binary entry point is in `main.rs`.

pub mod balance;
pub mod config;
pub mod dataset;
pub mod exit_codes;
pub mod imbalance;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod recommend;
pub mod scoring;
pub mod seed;

pub use balance::{BalancedDataset, BalancingEngine, Provenance};
pub use imbalance::{ImbalanceAnalyzer, ImbalanceReport};
pub use model::{ModelSelector, SelectionResult, TrainedModel};
pub use pipeline::{Pipeline, PreparedData};
pub use recommend::{Recommendation, Recommender};
pub use scoring::{HistoricalStats, ScoreResult, ViabilityScorer};
