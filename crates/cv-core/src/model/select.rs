//! Candidate training and held-out selection.

use std::thread;

use cv_common::{BinaryLabel, Error, ModelKind, Result, Strategy};
use cv_config::TrainingConfig;
use cv_math::{classification_metrics, ClassificationMetrics};
use serde::Serialize;

use super::split::{stratified_split, SplitSummary};
use super::{targets, Classifier, TrainedModel};
use crate::balance::{BalancingEngine, Provenance};
use crate::dataset::FeatureTable;
use crate::seed::{derive_seed, stream_rng};

/// Features listed for the winner.
pub const TOP_FEATURES: usize = 5;

/// Held-out evaluation of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateResult {
    pub model: ModelKind,
    pub complexity: u8,
    pub metrics: ClassificationMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Outcome of a selection run. `ranked[0]` is always the winner.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    pub winner: ModelKind,
    pub ranked: Vec<CandidateResult>,
    pub feature_names: Vec<String>,
    pub top_features: Vec<FeatureImportance>,
    pub split: SplitSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_balance: Option<Provenance>,
    pub seed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    /// The winning model as fitted on the training partition.
    #[serde(skip)]
    pub model: TrainedModel,
}

impl SelectionResult {
    pub fn winner_metrics(&self) -> &ClassificationMetrics {
        &self.ranked[0].metrics
    }
}

/// Order candidates by AUC, highest first, then move the simplest model
/// within `tolerance` of the best AUC to the front.
///
/// The sort itself is exact so the comparator stays a total order.
pub fn rank_candidates<T>(mut scored: Vec<(CandidateResult, T)>, tolerance: f64) -> Vec<(CandidateResult, T)> {
    scored.sort_by(|(a, _), (b, _)| {
        b.metrics
            .auc_roc
            .total_cmp(&a.metrics.auc_roc)
            .then(a.complexity.cmp(&b.complexity))
    });
    let Some(best) = scored.first().map(|(c, _)| c.metrics.auc_roc) else {
        return scored;
    };
    let pick = scored
        .iter()
        .enumerate()
        .filter(|(_, (c, _))| c.metrics.auc_roc >= best - tolerance)
        .min_by_key(|(i, (c, _))| (c.complexity, *i))
        .map_or(0, |(i, _)| i);
    if pick != 0 {
        let winner = scored.remove(pick);
        scored.insert(0, winner);
    }
    scored
}

/// Trains candidate classifiers on a stratified training partition and
/// picks the best by held-out AUC.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    config: TrainingConfig,
    balancing: Option<(BalancingEngine, Strategy)>,
    config_hash: Option<String>,
}

impl ModelSelector {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            balancing: None,
            config_hash: None,
        }
    }

    /// Balance the training partition with `strategy` before fitting.
    /// The test partition is never resampled.
    pub fn with_balancing(mut self, engine: BalancingEngine, strategy: Strategy) -> Self {
        self.balancing = Some((engine, strategy));
        self
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train each of `candidates` (the configured set when empty) and rank them.
    pub fn select(
        &self,
        features: &FeatureTable,
        labels: &[BinaryLabel],
        candidates: &[ModelKind],
    ) -> Result<SelectionResult> {
        let mut kinds: Vec<ModelKind> = if candidates.is_empty() {
            self.config.candidates.clone()
        } else {
            candidates.to_vec()
        };
        kinds.sort_by_key(|k| k.complexity());
        kinds.dedup();
        if kinds.is_empty() {
            return Err(Error::validation("candidates", "no candidate models to train"));
        }

        let seed = self.config.seed;
        let split = stratified_split(labels, self.config.test_fraction, &mut stream_rng(seed, "split"))?;
        let numeric = features.numeric_rows()?;

        let (train_x, train_y, training_balance) = match &self.balancing {
            Some((engine, strategy)) => {
                let train_labels: Vec<BinaryLabel> = split.train.iter().map(|&i| labels[i]).collect();
                let balanced = engine.balance(&features.select(&split.train), &train_labels, *strategy)?;
                (
                    balanced.features.numeric_rows()?,
                    targets(&balanced.labels),
                    Some(balanced.provenance),
                )
            }
            None => (
                split.train.iter().map(|&i| numeric[i].clone()).collect(),
                split.train.iter().map(|&i| labels[i].is_viable()).collect(),
                None,
            ),
        };
        let test_x: Vec<Vec<f64>> = split.test.iter().map(|&i| numeric[i].clone()).collect();
        let test_y: Vec<bool> = split.test.iter().map(|&i| labels[i].is_viable()).collect();

        let fitted: Vec<Result<(CandidateResult, TrainedModel)>> = thread::scope(|s| {
            let handles: Vec<_> = kinds
                .iter()
                .map(|&kind| {
                    let (train_x, train_y, test_x, test_y) = (&train_x, &train_y, &test_x, &test_y);
                    s.spawn(move || -> Result<(CandidateResult, TrainedModel)> {
                        let model_seed = derive_seed(seed, &format!("model/{kind}"));
                        let model = TrainedModel::fit(kind, train_x, train_y, &self.config, model_seed)?;
                        let probs = model.predict_all(test_x);
                        let metrics =
                            classification_metrics(&probs, test_y, self.config.decision_threshold);
                        tracing::info!(
                            model = %kind,
                            auc = metrics.auc_roc,
                            balanced_accuracy = metrics.balanced_accuracy,
                            "candidate evaluated"
                        );
                        Ok((
                            CandidateResult {
                                model: kind,
                                complexity: kind.complexity(),
                                metrics,
                            },
                            model,
                        ))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });
        let scored = fitted.into_iter().collect::<Result<Vec<_>>>()?;

        let mut ranked = rank_candidates(scored, self.config.auc_tie_tolerance);
        let (head, model) = ranked.remove(0);
        let winner = head.model;

        let feature_names = features.names.clone();
        let mut top_features: Vec<FeatureImportance> = feature_names
            .iter()
            .zip(model.feature_importances())
            .filter(|(_, importance)| *importance > 0.0)
            .map(|(name, importance)| FeatureImportance {
                feature: name.clone(),
                importance,
            })
            .collect();
        top_features.sort_by(|a, b| {
            b.importance
                .total_cmp(&a.importance)
                .then_with(|| a.feature.cmp(&b.feature))
        });
        top_features.truncate(TOP_FEATURES);

        tracing::info!(
            winner = %winner,
            auc = head.metrics.auc_roc,
            candidates = ranked.len() + 1,
            "model selected"
        );

        let mut results = vec![head];
        results.extend(ranked.into_iter().map(|(c, _)| c));
        Ok(SelectionResult {
            winner,
            ranked: results,
            feature_names,
            top_features,
            split: split.summary(labels),
            training_balance,
            seed,
            config_hash: self.config_hash.clone(),
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(model: ModelKind, auc: f64) -> (CandidateResult, ()) {
        (
            CandidateResult {
                model,
                complexity: model.complexity(),
                metrics: ClassificationMetrics {
                    auc_roc: auc,
                    ..ClassificationMetrics::default()
                },
            },
            (),
        )
    }

    fn order(ranked: &[(CandidateResult, ())]) -> Vec<ModelKind> {
        ranked.iter().map(|(c, _)| c.model).collect()
    }

    #[test]
    fn highest_auc_wins() {
        let ranked = rank_candidates(
            vec![
                candidate(ModelKind::Logistic, 0.71),
                candidate(ModelKind::RandomForest, 0.83),
                candidate(ModelKind::GradientBoosting, 0.79),
            ],
            1e-9,
        );
        assert_eq!(
            order(&ranked),
            vec![ModelKind::RandomForest, ModelKind::GradientBoosting, ModelKind::Logistic]
        );
    }

    #[test]
    fn exact_tie_prefers_the_simpler_model() {
        let ranked = rank_candidates(
            vec![
                candidate(ModelKind::RandomForest, 0.8),
                candidate(ModelKind::GradientBoosting, 0.8),
                candidate(ModelKind::Logistic, 0.8),
            ],
            1e-9,
        );
        assert_eq!(
            order(&ranked),
            vec![ModelKind::Logistic, ModelKind::GradientBoosting, ModelKind::RandomForest]
        );
    }

    #[test]
    fn near_tie_within_tolerance_prefers_the_simpler_model() {
        let ranked = rank_candidates(
            vec![
                candidate(ModelKind::RandomForest, 0.801),
                candidate(ModelKind::Logistic, 0.800),
            ],
            0.005,
        );
        assert_eq!(ranked[0].0.model, ModelKind::Logistic);
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = rank_candidates(
            vec![
                candidate(ModelKind::Logistic, 0.7),
                candidate(ModelKind::DecisionTree, 0.75),
            ],
            1e-9,
        );
        let b = rank_candidates(
            vec![
                candidate(ModelKind::DecisionTree, 0.75),
                candidate(ModelKind::Logistic, 0.7),
            ],
            1e-9,
        );
        assert_eq!(order(&a), order(&b));
    }

    fn table() -> (FeatureTable, Vec<BinaryLabel>) {
        let rows: Vec<Vec<f64>> = (0..90)
            .map(|i| vec![(i % 30) as f64, ((i * 13) % 17) as f64])
            .collect();
        let labels = rows
            .iter()
            .map(|r| BinaryLabel::from_class(u8::from(r[0] >= 21.0)))
            .collect();
        (FeatureTable::from_numeric(vec!["a".into(), "b".into()], rows), labels)
    }

    #[test]
    fn select_reports_every_candidate() {
        let (features, labels) = table();
        let result = ModelSelector::new(TrainingConfig::default())
            .select(&features, &labels, &[])
            .unwrap();
        assert_eq!(result.ranked.len(), 3);
        assert_eq!(result.ranked[0].model, result.winner);
        assert_eq!(result.model.kind(), result.winner);
        assert!(result.winner_metrics().auc_roc > 0.9);
        assert_eq!(result.split.test_rows + result.split.train_rows, 90);
        assert!(result.training_balance.is_none());
    }

    #[test]
    fn balancing_touches_only_the_training_partition() {
        let (features, labels) = table();
        let engine = BalancingEngine::new(&cv_config::EngineConfig::default());
        let result = ModelSelector::new(TrainingConfig::default())
            .with_balancing(engine, Strategy::RandomOversample)
            .select(&features, &labels, &[ModelKind::Logistic])
            .unwrap();
        let provenance = result.training_balance.clone().unwrap();
        assert_eq!(provenance.pre_counts, result.split.train_counts);
        assert_eq!(provenance.post_counts.viable, provenance.post_counts.not_viable);
        assert_eq!(
            result.winner_metrics().sample_count,
            result.split.test_rows
        );
    }
}
