//! Structured event definitions for logging.
//!
//! Events follow a consistent schema for machine-parseable JSONL output.
//! All events carry the run id, the pipeline stage and, once a configuration
//! is loaded, the short id of its snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Stages of the viability pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Rule-based scoring of records.
    Score,
    /// Class-imbalance measurement.
    Analyze,
    /// Resampling.
    Balance,
    /// Classifier training.
    Train,
    /// Candidate ranking and winner selection.
    Select,
    /// Single-record recommendation.
    Recommend,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Score => "score",
            Stage::Analyze => "analyze",
            Stage::Balance => "balance",
            Stage::Train => "train",
            Stage::Select => "select",
            Stage::Recommend => "recommend",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Input
    pub const INPUT_LOADED: &str = "input.loaded";

    // Score stage
    pub const SCORE_STATS_BUILT: &str = "score.stats_built";
    pub const SCORE_CRITERIA_DERIVED: &str = "score.criteria_derived";
    pub const SCORE_COMPLETED: &str = "score.completed";

    // Analyze stage
    pub const ANALYZE_REPORT: &str = "analyze.report";

    // Balance stage
    pub const BALANCE_STRATEGY_SELECTED: &str = "balance.strategy_selected";
    pub const BALANCE_FALLBACK: &str = "balance.fallback";
    pub const BALANCE_COMPLETED: &str = "balance.completed";
    pub const BALANCE_STRATEGY_EVALUATED: &str = "balance.strategy_evaluated";
    pub const BALANCE_STRATEGY_FAILED: &str = "balance.strategy_failed";

    // Train / select stages
    pub const TRAIN_CANDIDATE_DONE: &str = "train.candidate_done";
    pub const SELECT_WINNER: &str = "select.winner";

    // Recommend stage
    pub const RECOMMEND_COMPLETED: &str = "recommend.completed";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A structured log event for JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: Level,

    /// Event name (e.g., "run.started", "balance.completed").
    pub event: String,

    /// Unique ID for this invocation of cv-core.
    pub run_id: String,

    /// Short id of the effective configuration snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,

    pub stage: Stage,

    pub message: String,

    /// Additional structured fields (stable keys).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(
        level: Level,
        event: impl Into<String>,
        run_id: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: run_id.into(),
            config_id: None,
            stage,
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    /// Add a field to the event.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Serialize to a single JSON line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Context for generating log events with a consistent run id.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub config_id: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            config_id: None,
        }
    }

    /// Attach the configuration snapshot id once it is known.
    pub fn with_config_id(mut self, config_id: impl Into<String>) -> Self {
        self.config_id = Some(config_id.into());
        self
    }

    pub fn event(
        &self,
        level: Level,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        let mut e = LogEvent::new(level, event, &self.run_id, stage, message);
        e.config_id = self.config_id.clone();
        e
    }

    pub fn info(
        &self,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        self.event(Level::Info, event, stage, message)
    }

    pub fn warn(
        &self,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        self.event(Level::Warn, event, stage, message)
    }

    pub fn error(
        &self,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        self.event(Level::Error, event, stage, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::new(
            Level::Info,
            event_names::BALANCE_COMPLETED,
            "run-12345",
            Stage::Balance,
            "Balanced 110 rows",
        )
        .with_field("strategy", "moderate")
        .with_field("ratio", 10.0);

        let json = event.to_jsonl();
        assert!(json.contains(r#""event":"balance.completed""#));
        assert!(json.contains(r#""level":"info""#));
        assert!(json.contains(r#""stage":"balance""#));
        assert!(json.contains(r#""strategy":"moderate""#));
        assert!(!json.contains("config_id"));
    }

    #[test]
    fn test_log_context_carries_config_id() {
        let ctx = LogContext::new("run-abc").with_config_id("0123456789ab");
        let event = ctx.warn(event_names::BALANCE_FALLBACK, Stage::Balance, "duplicating");
        assert_eq!(event.run_id, "run-abc");
        assert_eq!(event.config_id.as_deref(), Some("0123456789ab"));
        assert_eq!(event.level, Level::Warn);
    }

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [Stage::Init, Stage::Score, Stage::Select, Stage::Recommend] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }
}
