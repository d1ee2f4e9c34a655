//! Case records as delivered by the ingestion collaborator.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolution outcome of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    Resolved,
    Unresolved,
    #[default]
    Unknown,
}

impl Outcome {
    /// Parse the outcome flag. SINDEC exports use `S`/`N`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "s" | "sim" | "y" | "yes" | "1" | "true" | "resolved" | "atendida" => {
                Outcome::Resolved
            }
            "n" | "nao" | "não" | "no" | "0" | "false" | "unresolved" => Outcome::Unresolved,
            _ => Outcome::Unknown,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Outcome::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Resolved => "resolved",
            Outcome::Unresolved => "unresolved",
            Outcome::Unknown => "unknown",
        }
    }
}

impl From<String> for Outcome {
    fn from(value: String) -> Self {
        Outcome::parse(&value)
    }
}

impl From<Outcome> for String {
    fn from(value: Outcome) -> Self {
        value.as_str().to_string()
    }
}

/// Brazilian macro-region of the complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Region {
    Sudeste,
    Sul,
    CentroOeste,
    Nordeste,
    Norte,
    #[default]
    Unknown,
}

impl Region {
    pub const KNOWN: [Region; 5] = [
        Region::Sudeste,
        Region::Sul,
        Region::CentroOeste,
        Region::Nordeste,
        Region::Norte,
    ];

    pub fn parse(raw: &str) -> Self {
        let folded: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match folded.as_str() {
            "sudeste" | "se" => Region::Sudeste,
            "sul" | "s" => Region::Sul,
            "centrooeste" | "co" => Region::CentroOeste,
            "nordeste" | "ne" => Region::Nordeste,
            "norte" | "n" => Region::Norte,
            _ => Region::Unknown,
        }
    }

    /// Map a two-letter state code (UF) to its region.
    pub fn from_state(uf: &str) -> Self {
        match uf.trim().to_ascii_uppercase().as_str() {
            "SP" | "RJ" | "MG" | "ES" => Region::Sudeste,
            "RS" | "SC" | "PR" => Region::Sul,
            "GO" | "MT" | "MS" | "DF" => Region::CentroOeste,
            "BA" | "PE" | "CE" | "MA" | "PB" | "RN" | "AL" | "SE" | "PI" => Region::Nordeste,
            "PA" | "AM" | "RO" | "AC" | "RR" | "AP" | "TO" => Region::Norte,
            _ => Region::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Sudeste => "Sudeste",
            Region::Sul => "Sul",
            Region::CentroOeste => "Centro-oeste",
            Region::Nordeste => "Nordeste",
            Region::Norte => "Norte",
            Region::Unknown => "Desconhecida",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Region {
    fn from(value: String) -> Self {
        Region::parse(&value)
    }
}

impl From<Region> for String {
    fn from(value: Region) -> Self {
        value.as_str().to_string()
    }
}

/// One consumer complaint.
///
/// Column names follow the flat tabular contract: `amount`, `subject`,
/// `problem`, `region`, `state`, `outcome`, `year`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Amount in dispute. `None` when the enrichment could not estimate it.
    #[serde(default)]
    pub amount: Option<f64>,

    /// Whether `amount` is an estimate rather than a declared value.
    #[serde(default)]
    pub amount_estimated: bool,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub problem: Option<String>,

    #[serde(default)]
    pub region: Region,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub outcome: Outcome,

    #[serde(default)]
    pub year: Option<i32>,
}

impl CaseRecord {
    pub fn new(amount: f64, subject: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            amount_estimated: false,
            subject: Some(subject.into()),
            problem: None,
            region: Region::Unknown,
            state: None,
            outcome: Outcome::Unknown,
            year: None,
        }
    }

    pub fn with_problem(mut self, problem: impl Into<String>) -> Self {
        self.problem = Some(problem.into());
        self
    }

    pub fn with_state(mut self, uf: impl Into<String>) -> Self {
        let uf = uf.into();
        if self.region == Region::Unknown {
            self.region = Region::from_state(&uf);
        }
        self.state = Some(uf);
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Amount with missing treated as zero.
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }

    /// Subject category, trimmed; blank is treated as missing.
    pub fn subject_key(&self) -> Option<&str> {
        self.subject.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Problem category, trimmed; blank is treated as missing.
    pub fn problem_key(&self) -> Option<&str> {
        self.problem.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Effective region, falling back to the state code.
    pub fn effective_region(&self) -> Region {
        match (self.region, self.state.as_deref()) {
            (Region::Unknown, Some(uf)) => Region::from_state(uf),
            (region, _) => region,
        }
    }

    /// Reject records the scorer cannot accept.
    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            if !amount.is_finite() {
                return Err(Error::validation(
                    "amount",
                    format!("must be finite, got {amount}"),
                ));
            }
            if amount < 0.0 {
                return Err(Error::validation(
                    "amount",
                    format!("must be non-negative, got {amount}"),
                ));
            }
        }
        Ok(())
    }
}
