//! Online single-case recommendation.
//!
//! The same [`ViabilityScorer`] that labels training data scores the case.
//! When a trained classifier is attached, its probability replaces the
//! normalised aggregate and its own verdict is reported as `model_label`.
//! Decision, label, grade, components and factors always come from the rules,
//! so the label is always the coarsened grade.

use cv_common::{BinaryLabel, CaseRecord, ModelKind, Result, ViabilityGrade};
use serde::{Deserialize, Serialize};

use crate::dataset::FeatureEncoder;
use crate::model::{Classifier, TrainedModel};
use crate::scoring::{
    rank_factors, ConfidenceNote, HistoricalStats, InfluencingFactor, ScoreComponents,
    ViabilityScorer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Accept,
    Reject,
}

impl From<BinaryLabel> for Decision {
    fn from(label: BinaryLabel) -> Self {
        if label.is_viable() {
            Decision::Accept
        } else {
            Decision::Reject
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilitySource {
    /// Aggregate score divided by its maximum.
    RuleScore,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub decision: Decision,
    pub binary_label: BinaryLabel,
    pub grade: ViabilityGrade,
    /// Verdict of the attached classifier at its decision threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_label: Option<BinaryLabel>,
    pub aggregate: u8,
    pub probability: f64,
    pub probability_source: ProbabilitySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelKind>,
    pub low_confidence: bool,
    pub notes: Vec<ConfidenceNote>,
    pub components: ScoreComponents,
    pub factors: Vec<InfluencingFactor>,
}

struct AttachedModel {
    model: TrainedModel,
    encoder: FeatureEncoder,
    threshold: f64,
}

/// Scores single cases against a fixed historical snapshot.
pub struct Recommender {
    scorer: ViabilityScorer,
    stats: HistoricalStats,
    model: Option<AttachedModel>,
}

impl Recommender {
    pub fn new(scorer: ViabilityScorer, stats: HistoricalStats) -> Self {
        Self {
            scorer,
            stats,
            model: None,
        }
    }

    /// Use `model` for the probability; rows are encoded with `encoder` and
    /// the model's own label is VIABLE at or above `threshold`.
    pub fn with_model(mut self, model: TrainedModel, encoder: FeatureEncoder, threshold: f64) -> Self {
        self.model = Some(AttachedModel {
            model,
            encoder,
            threshold,
        });
        self
    }

    pub fn recommend(&self, record: &CaseRecord) -> Result<Recommendation> {
        let result = self.scorer.score(record, &self.stats)?;
        let factors = rank_factors(record, &result, &self.stats, self.scorer.config());

        let (probability, model_label, source, model) = match &self.model {
            Some(attached) => {
                let p = attached
                    .model
                    .predict_proba(&attached.encoder.encode(record));
                let label = if p >= attached.threshold {
                    BinaryLabel::Viable
                } else {
                    BinaryLabel::NotViable
                };
                (
                    p,
                    Some(label),
                    ProbabilitySource::Model,
                    Some(attached.model.kind()),
                )
            }
            None => (result.probability, None, ProbabilitySource::RuleScore, None),
        };

        tracing::debug!(
            aggregate = result.aggregate,
            grade = %result.grade,
            probability,
            source = ?source,
            "case recommended"
        );

        Ok(Recommendation {
            decision: Decision::from(result.binary_label),
            binary_label: result.binary_label,
            grade: result.grade,
            model_label,
            aggregate: result.aggregate,
            probability,
            probability_source: source,
            model,
            low_confidence: result.low_confidence,
            notes: result.notes,
            components: result.components,
            factors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::CategoryStats;
    use cv_common::Region;
    use cv_config::{ScoringConfig, TrainingConfig};

    fn recommender() -> Recommender {
        let stats = HistoricalStats::empty()
            .with_subject("Energia Elétrica", CategoryStats::from_rate(0.65, 1200));
        Recommender::new(ViabilityScorer::new(ScoringConfig::default()), stats)
    }

    #[test]
    fn rule_based_accept() {
        let record = CaseRecord::new(5000.0, "Energia Elétrica")
            .with_problem("Cobrança indevida")
            .with_region(Region::Sudeste);
        let rec = recommender().recommend(&record).unwrap();
        assert_eq!(rec.decision, Decision::Accept);
        assert_eq!(rec.probability_source, ProbabilitySource::RuleScore);
        assert!(rec.model_label.is_none());
        assert!((rec.probability - f64::from(rec.aggregate) / 10.0).abs() < 1e-12);
        assert_eq!(rec.factors.len(), 4);
        assert!(rec.model.is_none());
    }

    #[test]
    fn unknown_subject_is_rejected_with_low_confidence() {
        let record = CaseRecord::new(0.0, "Something never seen");
        let rec = recommender().recommend(&record).unwrap();
        assert_eq!(rec.decision, Decision::Reject);
        assert_eq!(rec.grade, ViabilityGrade::NotViable);
        assert!(rec.low_confidence);
        assert!(rec.notes.contains(&ConfidenceNote::UnknownSubject));
    }

    #[test]
    fn negative_amount_is_a_validation_error() {
        let record = CaseRecord::new(-1.0, "Energia Elétrica");
        assert!(recommender().recommend(&record).is_err());
    }

    #[test]
    fn attached_model_supplies_the_probability() {
        let records: Vec<CaseRecord> = (0..40)
            .map(|i| CaseRecord::new(f64::from(i) * 500.0, "Energia Elétrica").with_year(2020))
            .collect();
        let encoder = FeatureEncoder::fit(&records, 5);
        let x = encoder.encode_all(&records).numeric_rows().unwrap();
        let y: Vec<bool> = (0..40).map(|i| i >= 20).collect();
        let model = TrainedModel::fit(ModelKind::Logistic, &x, &y, &TrainingConfig::default(), 1)
            .unwrap();

        let rec = recommender()
            .with_model(model, encoder, 0.5)
            .recommend(&CaseRecord::new(19_000.0, "Energia Elétrica").with_year(2020))
            .unwrap();
        assert_eq!(rec.probability_source, ProbabilitySource::Model);
        assert_eq!(rec.model, Some(ModelKind::Logistic));
        assert!(rec.probability > 0.5);
        assert_eq!(rec.model_label, Some(BinaryLabel::Viable));
        assert_eq!(rec.binary_label, rec.grade.coarsen());
    }

    #[test]
    fn model_verdict_never_overrides_the_graded_label() {
        // The model learns the opposite of the rules: small amounts are viable.
        let records: Vec<CaseRecord> = (0..40)
            .map(|i| CaseRecord::new(f64::from(i) * 500.0, "Energia Elétrica").with_year(2020))
            .collect();
        let encoder = FeatureEncoder::fit(&records, 5);
        let x = encoder.encode_all(&records).numeric_rows().unwrap();
        let y: Vec<bool> = (0..40).map(|i| i < 20).collect();
        let model = TrainedModel::fit(ModelKind::Logistic, &x, &y, &TrainingConfig::default(), 1)
            .unwrap();
        let recommender = recommender().with_model(model, encoder, 0.5);

        for amount in [0.0, 1_000.0, 5_000.0, 12_000.0, 19_500.0] {
            let case = CaseRecord::new(amount, "Energia Elétrica")
                .with_problem("Cobrança indevida")
                .with_year(2020);
            let rec = recommender.recommend(&case).unwrap();
            assert_eq!(rec.binary_label, rec.grade.coarsen(), "amount {amount}");
            assert_eq!(rec.decision, Decision::from(rec.binary_label));
            assert!(rec.model_label.is_some());
        }
    }
}
