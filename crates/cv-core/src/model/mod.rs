//! Classifiers trained on encoded case features.
//!
//! Four families are available, named by [`ModelKind`]: logistic regression,
//! a single tree, gradient boosting and a random forest. All of them read a
//! dense numeric matrix and emit a probability for the VIABLE class.

pub mod boosting;
pub mod forest;
pub mod logistic;
pub mod select;
pub mod split;
pub mod tree;

pub use select::{CandidateResult, FeatureImportance, ModelSelector, SelectionResult};
pub use split::{stratified_split, Split, SplitSummary};

use cv_common::{BinaryLabel, Error, ModelKind, Result};
use cv_config::TrainingConfig;
use serde::{Deserialize, Serialize};

use crate::seed::stream_rng;

/// Probability model over one feature row.
pub trait Classifier {
    /// Probability that the row is VIABLE.
    fn predict_proba(&self, row: &[f64]) -> f64;

    fn predict_all(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict_proba(r)).collect()
    }

    /// Per-feature importance shares summing to 1, or all zeros when the
    /// model never used a feature.
    fn feature_importances(&self) -> Vec<f64>;
}

/// A fitted classifier of any supported family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum TrainedModel {
    Logistic(logistic::LogisticModel),
    DecisionTree(tree::DecisionTree),
    GradientBoosting(boosting::GradientBoosting),
    RandomForest(forest::RandomForest),
}

impl TrainedModel {
    /// Fit `kind` on `x`/`y` with the family's configured parameters.
    ///
    /// `seed` feeds every random draw the family makes.
    pub fn fit(
        kind: ModelKind,
        x: &[Vec<f64>],
        y: &[bool],
        config: &TrainingConfig,
        seed: u64,
    ) -> Result<Self> {
        if x.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if x.len() != y.len() {
            return Err(Error::validation(
                "labels",
                format!("{} labels for {} feature rows", y.len(), x.len()),
            ));
        }

        let model = match kind {
            ModelKind::Logistic => {
                TrainedModel::Logistic(logistic::LogisticModel::fit(x, y, &config.logistic))
            }
            ModelKind::DecisionTree => TrainedModel::DecisionTree(tree::DecisionTree::fit(
                x,
                y,
                &config.tree,
                &mut stream_rng(seed, "tree"),
            )),
            ModelKind::GradientBoosting => TrainedModel::GradientBoosting(
                boosting::GradientBoosting::fit(x, y, &config.boosting, &config.tree, seed),
            ),
            ModelKind::RandomForest => TrainedModel::RandomForest(forest::RandomForest::fit(
                x,
                y,
                &config.forest,
                &config.tree,
                seed,
            )),
        };
        Ok(model)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::Logistic(_) => ModelKind::Logistic,
            TrainedModel::DecisionTree(_) => ModelKind::DecisionTree,
            TrainedModel::GradientBoosting(_) => ModelKind::GradientBoosting,
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            TrainedModel::Logistic(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::GradientBoosting(m) => m,
            TrainedModel::RandomForest(m) => m,
        }
    }
}

impl Classifier for TrainedModel {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        self.inner().predict_proba(row)
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.inner().feature_importances()
    }
}

/// Labels as classifier targets; VIABLE is the positive class.
pub fn targets(labels: &[BinaryLabel]) -> Vec<bool> {
    labels.iter().map(|l| l.is_viable()).collect()
}
