//! Class balancing.
//!
//! [`BalancingEngine::balance`] applies one named strategy to a labelled
//! feature table and returns the resampled table together with a
//! [`Provenance`] record. Only the training partition should ever be
//! balanced; [`compare`] takes care of that when strategies are evaluated.

pub mod clean;
pub mod compare;
pub mod sampling;
pub mod smote;

pub use compare::{EvaluationStatus, PrePostComparison, StrategyComparison, StrategyEvaluation};

use cv_common::{BinaryLabel, Error, Result, Strategy};
use cv_config::{BalancingConfig, EngineConfig, TrainingConfig};
use serde::{Deserialize, Serialize};

use crate::dataset::{Feature, FeatureTable};
use crate::imbalance::{ClassCounts, ImbalanceAnalyzer};
use crate::seed::stream_rng;

/// How a synthetic strategy was replaced when it could not run as asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Minority rows were duplicated instead of interpolated.
    Duplication,
}

/// Parameters that shaped one balancing run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategyParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k_neighbors: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning_neighbors: Option<usize>,
}

/// What was done to a dataset, and with which parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub strategy_requested: Strategy,
    pub strategy_applied: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
    pub params: StrategyParams,
    pub pre_counts: ClassCounts,
    pub post_counts: ClassCounts,
    pub synthetic_rows: usize,
    pub removed_rows: usize,
    pub seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

/// A resampled dataset. `synthetic[i]` marks rows that did not exist in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancedDataset {
    pub features: FeatureTable,
    pub labels: Vec<BinaryLabel>,
    pub synthetic: Vec<bool>,
    pub provenance: Provenance,
}

impl BalancedDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn counts(&self) -> ClassCounts {
        self.provenance.post_counts
    }
}

/// Rows being assembled by one strategy.
struct Draft {
    rows: Vec<Vec<Feature>>,
    labels: Vec<BinaryLabel>,
    synthetic: Vec<bool>,
    fallback: Option<Fallback>,
    params: StrategyParams,
}

impl Draft {
    fn identity(features: &FeatureTable, labels: &[BinaryLabel]) -> Self {
        Self {
            rows: features.rows.clone(),
            labels: labels.to_vec(),
            synthetic: vec![false; labels.len()],
            fallback: None,
            params: StrategyParams::default(),
        }
    }

    fn keep(features: &FeatureTable, labels: &[BinaryLabel], indices: &[usize]) -> Self {
        Self {
            rows: indices.iter().map(|&i| features.rows[i].clone()).collect(),
            labels: indices.iter().map(|&i| labels[i]).collect(),
            synthetic: vec![false; indices.len()],
            fallback: None,
            params: StrategyParams::default(),
        }
    }

    fn append(&mut self, row: Vec<Feature>, label: BinaryLabel) {
        self.rows.push(row);
        self.labels.push(label);
        self.synthetic.push(true);
    }
}

/// Applies balancing strategies with a fixed configuration and seed.
#[derive(Debug, Clone)]
pub struct BalancingEngine {
    config: BalancingConfig,
    training: TrainingConfig,
    config_hash: Option<String>,
}

impl BalancingEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.balancing.clone(),
            training: config.training.clone(),
            config_hash: None,
        }
    }

    /// Stamp provenance records with the hash of the resolved configuration.
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn config(&self) -> &BalancingConfig {
        &self.config
    }

    pub fn training(&self) -> &TrainingConfig {
        &self.training
    }

    pub fn seed(&self) -> u64 {
        self.training.seed
    }

    /// Balance `features`/`labels` with `strategy`.
    ///
    /// `none` passes any non-empty input through. Every other strategy needs
    /// both classes present. `auto` resolves to the analyzer's
    /// recommendation and is recorded as requested.
    pub fn balance(
        &self,
        features: &FeatureTable,
        labels: &[BinaryLabel],
        strategy: Strategy,
    ) -> Result<BalancedDataset> {
        if labels.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if features.len() != labels.len() {
            return Err(Error::validation(
                "labels",
                format!(
                    "{} labels for {} feature rows",
                    labels.len(),
                    features.len()
                ),
            ));
        }

        let pre_counts = ClassCounts::from_labels(labels);
        let applied = if strategy == Strategy::None {
            Strategy::None
        } else {
            let report = ImbalanceAnalyzer::new(self.config.cutoffs.clone()).analyze(labels)?;
            if strategy == Strategy::Auto {
                report.recommended
            } else {
                strategy
            }
        };

        let mut rng = stream_rng(self.seed(), &format!("balance/{applied}"));
        let majority = pre_counts.majority();
        let minority = pre_counts.minority();

        let draft = match applied {
            Strategy::None | Strategy::Auto => Draft::identity(features, labels),
            Strategy::Conservative => {
                let cap = self.config.conservative_ratio_cap;
                let target = ((pre_counts.get(minority) as f64) * cap).round() as usize;
                let keep = sampling::undersample(labels, majority, target, &mut rng);
                let mut draft = Draft::keep(features, labels, &keep);
                draft.params.ratio_cap = Some(cap);
                draft
            }
            Strategy::RandomUndersample => {
                let keep =
                    sampling::undersample(labels, majority, pre_counts.get(minority), &mut rng);
                Draft::keep(features, labels, &keep)
            }
            Strategy::RandomOversample => {
                let mut draft = Draft::identity(features, labels);
                let need = pre_counts.get(majority) - pre_counts.get(minority);
                for i in sampling::duplicate(labels, minority, need, &mut rng) {
                    draft.append(features.rows[i].clone(), minority);
                }
                draft
            }
            Strategy::Moderate => self.oversample(features, labels, pre_counts, applied, &mut rng)?,
            Strategy::Aggressive => {
                let draft = self.oversample(features, labels, pre_counts, applied, &mut rng)?;
                self.clean(features.names.clone(), draft)?
            }
        };

        let post_counts = ClassCounts::from_labels(&draft.labels);
        let synthetic_rows = draft.synthetic.iter().filter(|s| **s).count();
        let removed_rows = (labels.len() + synthetic_rows).saturating_sub(draft.labels.len());

        tracing::info!(
            requested = %strategy,
            applied = %applied,
            pre_viable = pre_counts.viable,
            pre_not_viable = pre_counts.not_viable,
            post_viable = post_counts.viable,
            post_not_viable = post_counts.not_viable,
            synthetic_rows,
            removed_rows,
            "dataset balanced"
        );

        Ok(BalancedDataset {
            features: FeatureTable {
                names: features.names.clone(),
                rows: draft.rows,
            },
            labels: draft.labels,
            synthetic: draft.synthetic,
            provenance: Provenance {
                strategy_requested: strategy,
                strategy_applied: applied,
                fallback: draft.fallback,
                params: draft.params,
                pre_counts,
                post_counts,
                synthetic_rows,
                removed_rows,
                seed: self.seed(),
                config_hash: self.config_hash.clone(),
            },
        })
    }

    /// Synthetic minority oversampling to parity, or duplication when the
    /// minority is too small and the fallback is enabled.
    fn oversample(
        &self,
        features: &FeatureTable,
        labels: &[BinaryLabel],
        counts: ClassCounts,
        applied: Strategy,
        rng: &mut rand::rngs::StdRng,
    ) -> Result<Draft> {
        let numeric = features.numeric_rows()?;
        let majority = counts.majority();
        let minority = counts.minority();
        let need = counts.get(majority) - counts.get(minority);
        let required = self.config.min_minority_for_interpolation();
        let have = counts.get(minority);

        let mut draft = Draft::identity(features, labels);
        draft.params.k_neighbors = Some(self.config.k_neighbors);

        if have < required {
            if !self.config.allow_duplication_fallback {
                return Err(Error::InsufficientData {
                    strategy: applied.to_string(),
                    minority: have,
                    required,
                });
            }
            tracing::warn!(
                strategy = %applied,
                minority = have,
                required,
                "too few minority samples to interpolate; duplicating instead"
            );
            for i in sampling::duplicate(labels, minority, need, rng) {
                draft.append(features.rows[i].clone(), minority);
            }
            draft.fallback = Some(Fallback::Duplication);
            return Ok(draft);
        }

        let minority_rows: Vec<Vec<f64>> = numeric
            .into_iter()
            .zip(labels)
            .filter(|(_, l)| **l == minority)
            .map(|(row, _)| row)
            .collect();
        for point in smote::interpolate(&minority_rows, need, self.config.k_neighbors, rng) {
            draft.append(point.into_iter().map(Feature::Number).collect(), minority);
        }
        Ok(draft)
    }

    fn clean(&self, names: Vec<String>, mut draft: Draft) -> Result<Draft> {
        let numeric = FeatureTable {
            names,
            rows: std::mem::take(&mut draft.rows),
        }
        .numeric_rows()?;
        let keep =
            clean::edited_nearest_neighbours(&numeric, &draft.labels, self.config.cleaning_neighbors);

        let mut rows = Vec::with_capacity(numeric.len());
        let mut labels = Vec::with_capacity(numeric.len());
        let mut synthetic = Vec::with_capacity(numeric.len());
        for (i, row) in numeric.into_iter().enumerate() {
            if keep[i] {
                rows.push(row.into_iter().map(Feature::Number).collect());
                labels.push(draft.labels[i]);
                synthetic.push(draft.synthetic[i]);
            }
        }
        draft.rows = rows;
        draft.labels = labels;
        draft.synthetic = synthetic;
        draft.params.cleaning_neighbors = Some(self.config.cleaning_neighbors);
        Ok(draft)
    }
}
