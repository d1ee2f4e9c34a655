//! Offline flow from records to a selected model.
//!
//! records -> historical stats -> scores/labels -> encoded features ->
//! imbalance report -> balanced data -> model selection.

use cv_common::{BinaryLabel, CaseRecord, ModelKind, Result, Strategy};
use cv_config::{EngineConfig, ScoringConfig};
use serde::Serialize;

use crate::balance::{BalancedDataset, BalancingEngine, PrePostComparison, StrategyComparison};
use crate::dataset::{labels_of, FeatureEncoder, FeatureTable, DEFAULT_TOP_STATES};
use crate::imbalance::{ImbalanceAnalyzer, ImbalanceReport};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::model::{ModelSelector, SelectionResult, TrainedModel};
use crate::recommend::Recommender;
use crate::scoring::{
    analyze_label_quality, derive_scoring_config, HistoricalStats, LabelQuality, ScoreResult,
    ViabilityScorer,
};

/// Scored and encoded records, ready for analysis, balancing and training.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub records: Vec<CaseRecord>,
    pub stats: HistoricalStats,
    /// Scoring configuration actually used (derived from data when requested).
    pub scoring: ScoringConfig,
    pub results: Vec<ScoreResult>,
    pub encoder: FeatureEncoder,
    pub features: FeatureTable,
    pub labels: Vec<BinaryLabel>,
}

impl PreparedData {
    pub fn label_quality(&self) -> LabelQuality {
        analyze_label_quality(&self.records, &self.results)
    }
}

/// Summary of the scoring pass, suitable for a JSON payload.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub records: usize,
    pub subjects: usize,
    pub problems: usize,
    pub global_success_rate: Option<f64>,
    pub criteria_derived: bool,
    pub label_quality: LabelQuality,
}

pub struct Pipeline {
    config: EngineConfig,
    config_hash: Option<String>,
    derive_criteria: bool,
    ctx: LogContext,
}

impl Pipeline {
    pub fn new(config: EngineConfig, ctx: LogContext) -> Self {
        Self {
            config,
            config_hash: None,
            derive_criteria: false,
            ctx,
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Calibrate value/success/potential bands from the records before scoring.
    pub fn with_derived_criteria(mut self, enabled: bool) -> Self {
        self.derive_criteria = enabled;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn engine(&self) -> BalancingEngine {
        let engine = BalancingEngine::new(&self.config);
        match &self.config_hash {
            Some(hash) => engine.with_config_hash(hash.clone()),
            None => engine,
        }
    }

    /// Build stats, score every record and encode features.
    pub fn prepare(&self, records: Vec<CaseRecord>) -> Result<PreparedData> {
        let stats = HistoricalStats::from_records(&records);
        log_event!(
            self.ctx,
            INFO,
            event_names::SCORE_STATS_BUILT,
            Stage::Score,
            "historical stats built",
            subjects = stats.subjects.len(),
            problems = stats.problems.len()
        );

        let scoring = if self.derive_criteria {
            let derived = derive_scoring_config(&records, &stats, &self.config.scoring)?;
            log_event!(
                self.ctx,
                INFO,
                event_names::SCORE_CRITERIA_DERIVED,
                Stage::Score,
                "scoring bands derived from data",
                value_high = derived.value_bands.high,
                success_high = derived.success_bands.high
            );
            derived
        } else {
            self.config.scoring.clone()
        };

        let scorer = ViabilityScorer::new(scoring.clone());
        let results = scorer.score_all(&records, &stats)?;
        let labels = labels_of(&results);
        let encoder = FeatureEncoder::fit(&records, DEFAULT_TOP_STATES);
        let features = encoder.encode_all(&records);

        let viable = labels.iter().filter(|l| l.is_viable()).count();
        log_event!(
            self.ctx,
            INFO,
            event_names::SCORE_COMPLETED,
            Stage::Score,
            "records scored",
            records = records.len(),
            viable = viable,
            features = features.width()
        );

        Ok(PreparedData {
            records,
            stats,
            scoring,
            results,
            encoder,
            features,
            labels,
        })
    }

    pub fn summarize(&self, data: &PreparedData) -> ScoreSummary {
        ScoreSummary {
            records: data.records.len(),
            subjects: data.stats.subjects.len(),
            problems: data.stats.problems.len(),
            global_success_rate: data.stats.global_success_rate,
            criteria_derived: self.derive_criteria,
            label_quality: data.label_quality(),
        }
    }

    pub fn analyze(&self, data: &PreparedData) -> Result<ImbalanceReport> {
        let report = ImbalanceAnalyzer::new(self.config.balancing.cutoffs.clone())
            .analyze(&data.labels)?;
        log_event!(
            self.ctx,
            INFO,
            event_names::ANALYZE_REPORT,
            Stage::Analyze,
            "imbalance analysed",
            ratio = report.ratio,
            recommended = report.recommended.as_str()
        );
        Ok(report)
    }

    pub fn balance(&self, data: &PreparedData, strategy: Strategy) -> Result<BalancedDataset> {
        let balanced = self.engine().balance(&data.features, &data.labels, strategy)?;
        let provenance = &balanced.provenance;
        if provenance.fallback.is_some() {
            log_event!(
                self.ctx,
                WARN,
                event_names::BALANCE_FALLBACK,
                Stage::Balance,
                "minority duplicated instead of interpolated",
                strategy = provenance.strategy_applied.as_str()
            );
        }
        log_event!(
            self.ctx,
            INFO,
            event_names::BALANCE_COMPLETED,
            Stage::Balance,
            "dataset balanced",
            requested = provenance.strategy_requested.as_str(),
            applied = provenance.strategy_applied.as_str(),
            rows = balanced.len()
        );
        Ok(balanced)
    }

    pub fn compare(&self, data: &PreparedData, strategies: &[Strategy]) -> Result<StrategyComparison> {
        let comparison = self.engine().compare(&data.features, &data.labels, strategies)?;
        for evaluation in &comparison.ranking {
            match &evaluation.error {
                Some(error) => log_event!(
                    self.ctx,
                    WARN,
                    event_names::BALANCE_STRATEGY_FAILED,
                    Stage::Balance,
                    "strategy could not run",
                    strategy = evaluation.strategy.as_str(),
                    error = error.as_str()
                ),
                None => log_event!(
                    self.ctx,
                    INFO,
                    event_names::BALANCE_STRATEGY_EVALUATED,
                    Stage::Balance,
                    "strategy evaluated",
                    strategy = evaluation.strategy.as_str(),
                    auc = evaluation.metrics.as_ref().map_or(0.0, |m| m.auc_roc)
                ),
            }
        }
        log_event!(
            self.ctx,
            INFO,
            event_names::BALANCE_STRATEGY_SELECTED,
            Stage::Balance,
            "winning strategy chosen",
            strategy = comparison.winner.as_str()
        );
        Ok(comparison)
    }

    pub fn compare_pre_post(&self, data: &PreparedData, strategy: Strategy) -> Result<PrePostComparison> {
        self.engine()
            .compare_pre_post(&data.features, &data.labels, strategy)
    }

    /// Split, balance the training partition with `strategy`, then train and
    /// rank `candidates` (the configured set when empty).
    pub fn select(
        &self,
        data: &PreparedData,
        strategy: Strategy,
        candidates: &[ModelKind],
    ) -> Result<SelectionResult> {
        let mut selector = ModelSelector::new(self.config.training.clone())
            .with_balancing(self.engine(), strategy);
        if let Some(hash) = &self.config_hash {
            selector = selector.with_config_hash(hash.clone());
        }
        let result = selector.select(&data.features, &data.labels, candidates)?;
        for candidate in &result.ranked {
            log_event!(
                self.ctx,
                DEBUG,
                event_names::TRAIN_CANDIDATE_DONE,
                Stage::Train,
                "candidate trained",
                model = candidate.model.as_str(),
                auc = candidate.metrics.auc_roc
            );
        }
        log_event!(
            self.ctx,
            INFO,
            event_names::SELECT_WINNER,
            Stage::Select,
            "model selected",
            model = result.winner.as_str(),
            auc = result.winner_metrics().auc_roc
        );
        Ok(result)
    }

    /// Recommender over the prepared snapshot, optionally backed by a model.
    pub fn recommender(&self, data: &PreparedData, model: Option<TrainedModel>) -> Recommender {
        let recommender = Recommender::new(
            ViabilityScorer::new(data.scoring.clone()),
            data.stats.clone(),
        );
        match model {
            Some(model) => recommender.with_model(
                model,
                data.encoder.clone(),
                self.config.training.decision_threshold,
            ),
            None => recommender,
        }
    }
}
