//! Class-balancing configuration types.

use cv_common::Strategy;
use serde::{Deserialize, Serialize};

/// Imbalance-ratio cutoffs that drive the automatic strategy choice.
///
/// A ratio below `conservative` needs no balancing; each cutoff is the
/// inclusive lower bound of the named strategy's band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImbalanceCutoffs {
    pub conservative: f64,
    pub moderate: f64,
    pub aggressive: f64,
}

impl Default for ImbalanceCutoffs {
    fn default() -> Self {
        Self {
            conservative: 1.5,
            moderate: 3.0,
            aggressive: 10.0,
        }
    }
}

/// Complete balancing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingConfig {
    #[serde(default)]
    pub cutoffs: ImbalanceCutoffs,

    /// Majority:minority ratio the conservative strategy undersamples down to.
    /// Must stay below `cutoffs.conservative`, otherwise part of the
    /// conservative band is left unchanged.
    #[serde(default = "default_ratio_cap")]
    pub conservative_ratio_cap: f64,

    /// Neighbours used for synthetic interpolation.
    #[serde(default = "default_k_neighbors")]
    pub k_neighbors: usize,

    /// Neighbours consulted by the cleaning pass.
    #[serde(default = "default_cleaning_neighbors")]
    pub cleaning_neighbors: usize,

    /// Duplicate minority samples instead of failing when too few exist
    /// for interpolation. The substitution is recorded in provenance.
    #[serde(default)]
    pub allow_duplication_fallback: bool,

    /// Strategies evaluated by comparative mode when none are given.
    #[serde(default = "default_comparison_strategies")]
    pub comparison_strategies: Vec<Strategy>,
}

/// Minority kept at 0.7 of the majority.
fn default_ratio_cap() -> f64 {
    1.0 / 0.7
}

fn default_k_neighbors() -> usize {
    5
}

fn default_cleaning_neighbors() -> usize {
    3
}

fn default_comparison_strategies() -> Vec<Strategy> {
    vec![
        Strategy::None,
        Strategy::Conservative,
        Strategy::Moderate,
        Strategy::Aggressive,
        Strategy::RandomOversample,
        Strategy::RandomUndersample,
    ]
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            cutoffs: ImbalanceCutoffs::default(),
            conservative_ratio_cap: default_ratio_cap(),
            k_neighbors: default_k_neighbors(),
            cleaning_neighbors: default_cleaning_neighbors(),
            allow_duplication_fallback: false,
            comparison_strategies: default_comparison_strategies(),
        }
    }
}

impl BalancingConfig {
    /// Minority samples synthetic oversampling needs: the point itself plus k neighbours.
    pub fn min_minority_for_interpolation(&self) -> usize {
        self.k_neighbors + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BalancingConfig::default();
        assert_eq!(cfg.k_neighbors, 5);
        assert_eq!(cfg.min_minority_for_interpolation(), 6);
        assert!(!cfg.allow_duplication_fallback);
        assert!(cfg.comparison_strategies.contains(&Strategy::Moderate));
        assert!(cfg.conservative_ratio_cap < cfg.cutoffs.conservative);
        assert!((cfg.conservative_ratio_cap - 1.428_571).abs() < 1e-6);
    }

    #[test]
    fn parses_strategy_names() {
        let cfg: BalancingConfig =
            serde_json::from_str(r#"{"comparison_strategies": ["moderate", "random_undersample"]}"#)
                .unwrap();
        assert_eq!(
            cfg.comparison_strategies,
            vec![Strategy::Moderate, Strategy::RandomUndersample]
        );
        assert_eq!(cfg.cutoffs, ImbalanceCutoffs::default());
    }
}
