//! Sanity checks on the labels produced by a scoring pass.

use std::collections::BTreeMap;

use cv_common::{BinaryLabel, CaseRecord, ViabilityGrade};
use cv_math::{mean, median, quantile};
use serde::{Deserialize, Serialize};

use super::ScoreResult;

/// Per-label summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub label: BinaryLabel,
    pub count: usize,
    pub share: f64,
    pub mean_amount: Option<f64>,
    pub median_amount: Option<f64>,
    /// Fraction of the label's records with a resolved outcome.
    pub resolution_rate: f64,
}

/// Label-quality report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelQuality {
    pub labels: Vec<LabelSummary>,
    pub grades: BTreeMap<ViabilityGrade, usize>,
    /// Count of records per aggregate score, index = score.
    pub score_histogram: Vec<usize>,
    /// Share of the top-10% amount cases labelled VIABLE.
    pub top_decile_viable_share: Option<f64>,
    /// Share of the bottom-20% amount cases labelled NOT_VIABLE.
    pub bottom_quintile_not_viable_share: Option<f64>,
    pub low_confidence_count: usize,
}

/// Summarise how labels relate to amounts and outcomes.
///
/// `records` and `results` are paired by position.
pub fn analyze_label_quality(records: &[CaseRecord], results: &[ScoreResult]) -> LabelQuality {
    let pairs: Vec<(&CaseRecord, &ScoreResult)> = records.iter().zip(results).collect();
    let total = pairs.len();

    let labels = [BinaryLabel::Viable, BinaryLabel::NotViable]
        .into_iter()
        .map(|label| {
            let group: Vec<_> = pairs.iter().filter(|(_, r)| r.binary_label == label).collect();
            let amounts: Vec<f64> = group.iter().filter_map(|(rec, _)| rec.amount).collect();
            let resolved = group.iter().filter(|(rec, _)| rec.outcome.is_resolved()).count();
            LabelSummary {
                label,
                count: group.len(),
                share: ratio(group.len(), total),
                mean_amount: mean(&amounts),
                median_amount: median(&amounts),
                resolution_rate: ratio(resolved, group.len()),
            }
        })
        .collect();

    let mut grades: BTreeMap<ViabilityGrade, usize> =
        ViabilityGrade::ALL.iter().map(|g| (*g, 0)).collect();
    let mut score_histogram = vec![0usize; usize::from(cv_config::scoring::AGGREGATE_MAX) + 1];
    for (_, result) in &pairs {
        *grades.entry(result.grade).or_default() += 1;
        if let Some(slot) = score_histogram.get_mut(usize::from(result.aggregate)) {
            *slot += 1;
        }
    }

    let amounts: Vec<f64> = pairs.iter().map(|(rec, _)| rec.amount_or_zero()).collect();
    let top_decile_viable_share = quantile(&amounts, 0.9).and_then(|cut| {
        share_where(&pairs, |rec| rec.amount_or_zero() >= cut, BinaryLabel::Viable)
    });
    let bottom_quintile_not_viable_share = quantile(&amounts, 0.2).and_then(|cut| {
        share_where(&pairs, |rec| rec.amount_or_zero() <= cut, BinaryLabel::NotViable)
    });

    LabelQuality {
        labels,
        grades,
        score_histogram,
        top_decile_viable_share,
        bottom_quintile_not_viable_share,
        low_confidence_count: pairs.iter().filter(|(_, r)| r.low_confidence).count(),
    }
}

fn share_where(
    pairs: &[(&CaseRecord, &ScoreResult)],
    select: impl Fn(&CaseRecord) -> bool,
    label: BinaryLabel,
) -> Option<f64> {
    let chosen: Vec<_> = pairs.iter().filter(|(rec, _)| select(rec)).collect();
    if chosen.is_empty() {
        return None;
    }
    let hits = chosen.iter().filter(|(_, r)| r.binary_label == label).count();
    Some(ratio(hits, chosen.len()))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{HistoricalStats, ViabilityScorer};
    use cv_common::Outcome;
    use cv_config::ScoringConfig;

    #[test]
    fn high_amounts_are_mostly_viable() {
        let records: Vec<_> = (0..100)
            .map(|i| {
                CaseRecord::new(i as f64 * 300.0, "Bancos")
                    .with_problem("Juros")
                    .with_outcome(if i % 4 == 0 { Outcome::Unresolved } else { Outcome::Resolved })
            })
            .collect();
        let stats = HistoricalStats::from_records(&records);
        let results = ViabilityScorer::new(ScoringConfig::default())
            .score_all(&records, &stats)
            .unwrap();
        let quality = analyze_label_quality(&records, &results);

        assert_eq!(quality.labels.iter().map(|l| l.count).sum::<usize>(), 100);
        assert_eq!(quality.score_histogram.iter().sum::<usize>(), 100);
        assert_eq!(quality.grades.values().sum::<usize>(), 100);
        assert_eq!(quality.top_decile_viable_share, Some(1.0));
        assert!(quality.bottom_quintile_not_viable_share.is_some());

        let viable = &quality.labels[0];
        let not_viable = &quality.labels[1];
        assert!(viable.mean_amount.unwrap() > not_viable.mean_amount.unwrap());
    }

    #[test]
    fn empty_input_has_no_shares() {
        let quality = analyze_label_quality(&[], &[]);
        assert_eq!(quality.top_decile_viable_share, None);
        assert_eq!(quality.labels[0].share, 0.0);
    }
}
