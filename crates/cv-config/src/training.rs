//! Model training and selection configuration.

use cv_common::ModelKind;
use serde::{Deserialize, Serialize};

/// Complete training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Single seed from which every random stream is derived.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Fraction of rows held out for evaluation.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Classifier variants trained by the model selector.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<ModelKind>,

    /// Fast classifier used to rank balancing strategies.
    #[serde(default = "default_reference_model")]
    pub reference_model: ModelKind,

    /// AUC differences at or below this are treated as ties.
    #[serde(default = "default_auc_tie_tolerance")]
    pub auc_tie_tolerance: f64,

    /// Probability at or above which a prediction counts as VIABLE.
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,

    #[serde(default)]
    pub logistic: LogisticParams,

    #[serde(default)]
    pub tree: TreeParams,

    #[serde(default)]
    pub forest: ForestParams,

    #[serde(default)]
    pub boosting: BoostingParams,
}

fn default_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.3
}

fn default_candidates() -> Vec<ModelKind> {
    vec![
        ModelKind::Logistic,
        ModelKind::GradientBoosting,
        ModelKind::RandomForest,
    ]
}

fn default_reference_model() -> ModelKind {
    ModelKind::RandomForest
}

fn default_auc_tie_tolerance() -> f64 {
    1e-9
}

fn default_decision_threshold() -> f64 {
    0.5
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            test_fraction: default_test_fraction(),
            candidates: default_candidates(),
            reference_model: default_reference_model(),
            auc_tie_tolerance: default_auc_tie_tolerance(),
            decision_threshold: default_decision_threshold(),
            logistic: LogisticParams::default(),
            tree: TreeParams::default(),
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
        }
    }
}

/// Batch gradient descent settings for the linear baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub iterations: usize,
    pub learning_rate: f64,
    /// L2 penalty on weights (the intercept is not penalised).
    pub l2: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            iterations: 400,
            learning_rate: 0.5,
            l2: 1e-3,
        }
    }
}

/// CART settings shared by the single tree and as the forest's base learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_split: 4,
            min_samples_leaf: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    /// Features considered per split; `None` means sqrt(n_features).
    #[serde(default)]
    pub max_features: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 8,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Row fraction sampled per round; 1.0 disables subsampling.
    pub subsample: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_rounds: 60,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
        }
    }
}
