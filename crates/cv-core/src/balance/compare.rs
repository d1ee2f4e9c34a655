//! Comparative evaluation of balancing strategies.
//!
//! The data is split once, stratified. Each strategy balances only the
//! training partition; a reference classifier is fitted on the result and
//! scored on the untouched test partition. Results are keyed by strategy
//! name so the ranking does not depend on evaluation order.

use std::collections::{BTreeMap, BTreeSet};

use cv_common::{BinaryLabel, Error, ModelKind, Result, Strategy};
use cv_math::{classification_metrics, ClassificationMetrics};
use serde::Serialize;

use super::{BalancedDataset, BalancingEngine, Fallback, Provenance};
use crate::dataset::FeatureTable;
use crate::imbalance::{ClassCounts, ImbalanceAnalyzer};
use crate::model::{stratified_split, targets, Classifier, Split, SplitSummary, TrainedModel};
use crate::seed::{derive_seed, stream_rng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Ok,
    Failed,
}

/// Result of one strategy in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyEvaluation {
    pub strategy: Strategy,
    pub status: EvaluationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_counts: Option<ClassCounts>,
    pub synthetic_rows: usize,
    pub removed_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ClassificationMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u32>,
}

impl StrategyEvaluation {
    fn failed(strategy: Strategy, err: &Error) -> Self {
        Self {
            strategy,
            status: EvaluationStatus::Failed,
            applied: None,
            fallback: None,
            train_counts: None,
            synthetic_rows: 0,
            removed_rows: 0,
            metrics: None,
            error: Some(err.to_string()),
            error_code: Some(err.code()),
        }
    }

    fn auc(&self) -> f64 {
        self.metrics.as_ref().map_or(f64::NEG_INFINITY, |m| m.auc_roc)
    }

    fn balanced_accuracy(&self) -> f64 {
        self.metrics
            .as_ref()
            .map_or(f64::NEG_INFINITY, |m| m.balanced_accuracy)
    }
}

/// Ranked strategies plus the winner applied to the full dataset.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyComparison {
    pub reference_model: ModelKind,
    pub split: SplitSummary,
    /// Successful strategies by AUC, then balanced accuracy, then name;
    /// failed strategies follow by name.
    pub ranking: Vec<StrategyEvaluation>,
    pub winner: Strategy,
    pub winner_provenance: Provenance,
    #[serde(skip)]
    pub balanced: BalancedDataset,
}

/// Reference-classifier quality before and after one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct PrePostComparison {
    pub strategy: Strategy,
    pub reference_model: ModelKind,
    pub split: SplitSummary,
    pub before: ClassificationMetrics,
    pub after: ClassificationMetrics,
    pub auc_delta: f64,
    pub balanced_accuracy_delta: f64,
    pub provenance: Provenance,
}

/// One stratified split of a labelled table.
struct Holdout {
    split: Split,
    train: FeatureTable,
    train_labels: Vec<BinaryLabel>,
    test_x: Vec<Vec<f64>>,
    test_y: Vec<bool>,
}

impl BalancingEngine {
    fn holdout(&self, features: &FeatureTable, labels: &[BinaryLabel]) -> Result<Holdout> {
        if features.len() != labels.len() {
            return Err(Error::validation(
                "labels",
                format!("{} labels for {} feature rows", labels.len(), features.len()),
            ));
        }
        ImbalanceAnalyzer::new(self.config.cutoffs.clone()).analyze(labels)?;
        let numeric = features.numeric_rows()?;
        let split = stratified_split(
            labels,
            self.training.test_fraction,
            &mut stream_rng(self.seed(), "split"),
        )?;
        Ok(Holdout {
            train: features.select(&split.train),
            train_labels: split.train.iter().map(|&i| labels[i]).collect(),
            test_x: split.test.iter().map(|&i| numeric[i].clone()).collect(),
            test_y: split.test.iter().map(|&i| labels[i].is_viable()).collect(),
            split,
        })
    }

    /// Fit the reference model on `train` and score it on the holdout.
    fn reference_metrics(
        &self,
        train: &FeatureTable,
        labels: &[BinaryLabel],
        holdout: &Holdout,
    ) -> Result<ClassificationMetrics> {
        let x = train.numeric_rows()?;
        let model = TrainedModel::fit(
            self.training.reference_model,
            &x,
            &targets(labels),
            &self.training,
            derive_seed(self.seed(), "reference"),
        )?;
        let probs = model.predict_all(&holdout.test_x);
        Ok(classification_metrics(
            &probs,
            &holdout.test_y,
            self.training.decision_threshold,
        ))
    }

    fn evaluate(&self, strategy: Strategy, holdout: &Holdout) -> Result<StrategyEvaluation> {
        let balanced = self.balance(&holdout.train, &holdout.train_labels, strategy)?;
        let metrics = self.reference_metrics(&balanced.features, &balanced.labels, holdout)?;
        let p = &balanced.provenance;
        Ok(StrategyEvaluation {
            strategy,
            status: EvaluationStatus::Ok,
            applied: Some(p.strategy_applied),
            fallback: p.fallback,
            train_counts: Some(p.post_counts),
            synthetic_rows: p.synthetic_rows,
            removed_rows: p.removed_rows,
            metrics: Some(metrics),
            error: None,
            error_code: None,
        })
    }

    /// Evaluate `strategies` (the configured set when empty) and rank them.
    ///
    /// A strategy that cannot run is reported as failed and ranked last.
    /// The call fails only when every strategy fails.
    pub fn compare(
        &self,
        features: &FeatureTable,
        labels: &[BinaryLabel],
        strategies: &[Strategy],
    ) -> Result<StrategyComparison> {
        let requested: BTreeSet<Strategy> = if strategies.is_empty() {
            self.config.comparison_strategies.iter().copied().collect()
        } else {
            strategies.iter().copied().collect()
        };
        if requested.is_empty() {
            return Err(Error::validation("strategies", "nothing to compare"));
        }
        let holdout = self.holdout(features, labels)?;

        let mut evaluations: BTreeMap<Strategy, StrategyEvaluation> = BTreeMap::new();
        let mut first_error: Option<Error> = None;
        for &strategy in &requested {
            match self.evaluate(strategy, &holdout) {
                Ok(evaluation) => {
                    tracing::info!(
                        strategy = %strategy,
                        auc = evaluation.auc(),
                        balanced_accuracy = evaluation.balanced_accuracy(),
                        "strategy evaluated"
                    );
                    evaluations.insert(strategy, evaluation);
                }
                Err(err) => {
                    tracing::warn!(strategy = %strategy, error = %err, "strategy failed");
                    evaluations.insert(strategy, StrategyEvaluation::failed(strategy, &err));
                    first_error.get_or_insert(err);
                }
            }
        }

        let mut ranking: Vec<StrategyEvaluation> = evaluations.into_values().collect();
        ranking.sort_by(|a, b| {
            let a_ok = a.status == EvaluationStatus::Ok;
            let b_ok = b.status == EvaluationStatus::Ok;
            b_ok.cmp(&a_ok)
                .then(b.auc().total_cmp(&a.auc()))
                .then(b.balanced_accuracy().total_cmp(&a.balanced_accuracy()))
                .then_with(|| a.strategy.as_str().cmp(b.strategy.as_str()))
        });

        let winner = match ranking.first() {
            Some(best) if best.status == EvaluationStatus::Ok => best.strategy,
            _ => {
                return Err(first_error
                    .unwrap_or_else(|| Error::validation("strategies", "nothing to compare")))
            }
        };
        tracing::info!(winner = %winner, "strategy comparison complete");

        let balanced = self.balance(features, labels, winner)?;
        Ok(StrategyComparison {
            reference_model: self.training.reference_model,
            split: holdout.split.summary(labels),
            ranking,
            winner,
            winner_provenance: balanced.provenance.clone(),
            balanced,
        })
    }

    /// Reference-model metrics on raw versus `strategy`-balanced training data,
    /// both scored on the same untouched test partition.
    pub fn compare_pre_post(
        &self,
        features: &FeatureTable,
        labels: &[BinaryLabel],
        strategy: Strategy,
    ) -> Result<PrePostComparison> {
        let holdout = self.holdout(features, labels)?;
        let before = self.reference_metrics(&holdout.train, &holdout.train_labels, &holdout)?;
        let balanced = self.balance(&holdout.train, &holdout.train_labels, strategy)?;
        let after = self.reference_metrics(&balanced.features, &balanced.labels, &holdout)?;

        Ok(PrePostComparison {
            strategy,
            reference_model: self.training.reference_model,
            split: holdout.split.summary(labels),
            auc_delta: after.auc_roc - before.auc_roc,
            balanced_accuracy_delta: after.balanced_accuracy - before.balanced_accuracy,
            before,
            after,
            provenance: balanced.provenance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_config::EngineConfig;

    /// Overlapping clusters so that strategies produce different scores.
    fn dataset(viable: usize, not_viable: usize) -> (FeatureTable, Vec<BinaryLabel>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..not_viable {
            rows.push(vec![(i % 17) as f64 / 4.0, (i % 5) as f64]);
            labels.push(BinaryLabel::NotViable);
        }
        for i in 0..viable {
            rows.push(vec![3.0 + (i % 7) as f64 / 2.0, (i % 3) as f64 + 1.0]);
            labels.push(BinaryLabel::Viable);
        }
        (
            FeatureTable::from_numeric(vec!["x".into(), "y".into()], rows),
            labels,
        )
    }

    fn engine() -> BalancingEngine {
        let mut config = EngineConfig::default();
        config.training.forest.n_trees = 10;
        BalancingEngine::new(&config)
    }

    #[test]
    fn ranking_covers_every_strategy_once() {
        let (features, labels) = dataset(20, 120);
        let strategies = [
            Strategy::None,
            Strategy::Moderate,
            Strategy::Conservative,
            Strategy::Moderate,
        ];
        let cmp = engine().compare(&features, &labels, &strategies).unwrap();
        assert_eq!(cmp.ranking.len(), 3);
        assert_eq!(cmp.ranking[0].strategy, cmp.winner);
        assert_eq!(cmp.balanced.provenance.strategy_requested, cmp.winner);
        assert_eq!(cmp.balanced.provenance.pre_counts.total(), 140);
        for pair in cmp.ranking.windows(2) {
            assert!(pair[0].auc() >= pair[1].auc());
        }
    }

    #[test]
    fn ranking_ignores_request_order() {
        let (features, labels) = dataset(20, 120);
        let forward = [Strategy::None, Strategy::RandomOversample, Strategy::Moderate];
        let backward = [Strategy::Moderate, Strategy::RandomOversample, Strategy::None];
        let a = engine().compare(&features, &labels, &forward).unwrap();
        let b = engine().compare(&features, &labels, &backward).unwrap();
        assert_eq!(a.ranking, b.ranking);
        assert_eq!(a.winner, b.winner);
    }

    #[test]
    fn failing_strategy_is_reported_not_fatal() {
        // 7 viable rows leave too few in training for interpolation
        let (features, labels) = dataset(7, 80);
        let cmp = engine()
            .compare(&features, &labels, &[Strategy::None, Strategy::Moderate])
            .unwrap();
        let failed = cmp
            .ranking
            .iter()
            .find(|e| e.strategy == Strategy::Moderate)
            .unwrap();
        assert_eq!(failed.status, EvaluationStatus::Failed);
        assert_eq!(failed.error_code, Some(30));
        assert_eq!(cmp.winner, Strategy::None);
        assert_eq!(cmp.ranking.last().unwrap().strategy, Strategy::Moderate);
    }

    #[test]
    fn all_failing_surfaces_the_error() {
        let (features, labels) = dataset(7, 80);
        let err = engine()
            .compare(&features, &labels, &[Strategy::Moderate, Strategy::Aggressive])
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientData { .. }));
    }

    #[test]
    fn pre_post_reports_deltas() {
        let (features, labels) = dataset(20, 120);
        let cmp = engine()
            .compare_pre_post(&features, &labels, Strategy::Moderate)
            .unwrap();
        assert!((cmp.auc_delta - (cmp.after.auc_roc - cmp.before.auc_roc)).abs() < 1e-12);
        assert_eq!(cmp.before.sample_count, cmp.after.sample_count);
        assert_eq!(cmp.provenance.strategy_applied, Strategy::Moderate);
    }
}
