//! Historical aggregates per subject and per problem type.
//!
//! Built once per dataset snapshot and only read afterwards.

use std::collections::BTreeMap;

use cv_common::CaseRecord;
use cv_math::{mean, median, round_to, std_dev};
use serde::{Deserialize, Serialize};

/// Aggregate outcome statistics for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Number of cases observed in the category.
    pub count: u64,
    /// Cases with a resolved outcome.
    pub resolved: u64,
    /// `resolved / count`, rounded to 3 decimals.
    pub success_rate: f64,
    #[serde(default)]
    pub mean_value: Option<f64>,
    #[serde(default)]
    pub median_value: Option<f64>,
    #[serde(default)]
    pub std_value: Option<f64>,
    /// Expected financial potential: mean value × success rate.
    #[serde(default)]
    pub potential: Option<f64>,
}

impl CategoryStats {
    /// Stats known only by rate and volume, as supplied by an external snapshot.
    pub fn from_rate(success_rate: f64, count: u64) -> Self {
        let rate = success_rate.clamp(0.0, 1.0);
        Self {
            count,
            resolved: (rate * count as f64).round() as u64,
            success_rate: round_to(rate, 3),
            mean_value: None,
            median_value: None,
            std_value: None,
            potential: None,
        }
    }

    fn from_group(records: &[&CaseRecord]) -> Self {
        let count = records.len() as u64;
        let resolved = records.iter().filter(|r| r.outcome.is_resolved()).count() as u64;
        let success_rate = if count == 0 {
            0.0
        } else {
            round_to(resolved as f64 / count as f64, 3)
        };

        let amounts: Vec<f64> = records.iter().filter_map(|r| r.amount).collect();
        let mean_value = mean(&amounts);
        Self {
            count,
            resolved,
            success_rate,
            mean_value,
            median_value: median(&amounts),
            std_value: std_dev(&amounts),
            potential: mean_value.map(|m| m * success_rate),
        }
    }
}

/// Read-only historical snapshot consumed by the scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalStats {
    #[serde(default)]
    pub subjects: BTreeMap<String, CategoryStats>,
    #[serde(default)]
    pub problems: BTreeMap<String, CategoryStats>,
    /// Success rate over every record with a known category.
    #[serde(default)]
    pub global_success_rate: Option<f64>,
    #[serde(default)]
    pub total: u64,
}

impl HistoricalStats {
    /// A snapshot with no history at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Derive per-subject and per-problem stats from a record set.
    pub fn from_records(records: &[CaseRecord]) -> Self {
        let mut by_subject: BTreeMap<&str, Vec<&CaseRecord>> = BTreeMap::new();
        let mut by_problem: BTreeMap<&str, Vec<&CaseRecord>> = BTreeMap::new();

        for record in records {
            if let Some(subject) = record.subject_key() {
                by_subject.entry(subject).or_default().push(record);
            }
            if let Some(problem) = record.problem_key() {
                by_problem.entry(problem).or_default().push(record);
            }
        }

        let total = records.len() as u64;
        let resolved = records.iter().filter(|r| r.outcome.is_resolved()).count();
        let global_success_rate =
            (total > 0).then(|| round_to(resolved as f64 / total as f64, 3));

        let stats = Self {
            subjects: by_subject
                .into_iter()
                .map(|(k, group)| (k.to_string(), CategoryStats::from_group(&group)))
                .collect(),
            problems: by_problem
                .into_iter()
                .map(|(k, group)| (k.to_string(), CategoryStats::from_group(&group)))
                .collect(),
            global_success_rate,
            total,
        };
        tracing::debug!(
            subjects = stats.subjects.len(),
            problems = stats.problems.len(),
            total,
            "historical stats built"
        );
        stats
    }

    /// Add or replace a subject's stats.
    pub fn with_subject(mut self, subject: impl Into<String>, stats: CategoryStats) -> Self {
        self.total += stats.count;
        self.subjects.insert(subject.into(), stats);
        self
    }

    /// Add or replace a problem type's stats.
    pub fn with_problem(mut self, problem: impl Into<String>, stats: CategoryStats) -> Self {
        self.problems.insert(problem.into(), stats);
        self
    }

    /// True when no subject history is available.
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn subject(&self, subject: &str) -> Option<&CategoryStats> {
        self.subjects.get(subject.trim())
    }

    pub fn problem(&self, problem: &str) -> Option<&CategoryStats> {
        self.problems.get(problem.trim())
    }
}
