//! Tabular input/output and feature encoding.
//!
//! Records arrive as a flat CSV with the columns `amount`, `subject`,
//! `problem`, `region`, `state`, `outcome`, `year` (plus an optional
//! `amount_estimated` flag). Resampling and training work on a
//! [`FeatureTable`]; [`FeatureEncoder`] turns records into one without
//! leaking the score inputs (subject and problem are left out).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use cv_common::{BinaryLabel, CaseRecord, Error, Outcome, Region, Result};
use cv_math::median;
use serde::{Deserialize, Serialize};

use crate::balance::BalancedDataset;
use crate::scoring::ScoreResult;

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 7] =
    ["amount", "subject", "problem", "region", "state", "outcome", "year"];

/// Number of most frequent states that get their own indicator column.
pub const DEFAULT_TOP_STATES: usize = 10;

/// One cell of a feature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Feature {
    Number(f64),
    Text(String),
}

impl Feature {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Feature::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for Feature {
    fn from(v: f64) -> Self {
        Feature::Number(v)
    }
}

impl From<&str> for Feature {
    fn from(v: &str) -> Self {
        Feature::Text(v.to_string())
    }
}

/// Named feature columns over rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub names: Vec<String>,
    pub rows: Vec<Vec<Feature>>,
}

impl FeatureTable {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            rows: Vec::new(),
        }
    }

    /// Build an all-numeric table.
    pub fn from_numeric(names: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self {
            names,
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Feature::Number).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Append a row; its width must match the header.
    pub fn push_row(&mut self, row: Vec<Feature>) -> Result<()> {
        if row.len() != self.width() {
            return Err(Error::validation(
                "features",
                format!("row has {} cells, header has {}", row.len(), self.width()),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> FeatureTable {
        FeatureTable {
            names: self.names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// The table as a dense numeric matrix.
    ///
    /// Fails with [`Error::NonNumericFeature`] naming the first column that
    /// holds text or a non-finite number.
    pub fn numeric_rows(&self) -> Result<Vec<Vec<f64>>> {
        self.rows
            .iter()
            .map(|row| {
                if row.len() != self.width() {
                    return Err(Error::validation(
                        "features",
                        format!("row has {} cells, header has {}", row.len(), self.width()),
                    ));
                }
                row.iter()
                    .enumerate()
                    .map(|(col, cell)| {
                        cell.as_number().ok_or_else(|| Error::NonNumericFeature {
                            feature: self.names[col].clone(),
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Record-to-feature mapping fitted on a training set.
///
/// Features: `log_amount` (log1p), `amount_missing`, `amount_estimated`,
/// `year` (median-filled), one indicator per known region and one per
/// frequent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub states: Vec<String>,
    pub year_fill: f64,
}

impl FeatureEncoder {
    /// Fit on `records`, keeping the `max_states` most frequent states.
    pub fn fit(records: &[CaseRecord], max_states: usize) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for uf in records.iter().filter_map(|r| r.state.as_deref()) {
            let uf = uf.trim().to_ascii_uppercase();
            if !uf.is_empty() {
                *counts.entry(uf).or_default() += 1;
            }
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        // BTreeMap order makes the name tie-break alphabetical.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let states = ranked.into_iter().take(max_states).map(|(uf, _)| uf).collect();

        let years: Vec<f64> = records.iter().filter_map(|r| r.year).map(f64::from).collect();
        Self {
            states,
            year_fill: median(&years).unwrap_or(0.0),
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names = vec![
            "log_amount".to_string(),
            "amount_missing".to_string(),
            "amount_estimated".to_string(),
            "year".to_string(),
        ];
        names.extend(Region::KNOWN.iter().map(|r| format!("region_{}", slug(r.as_str()))));
        names.extend(self.states.iter().map(|uf| format!("state_{uf}")));
        names
    }

    pub fn encode(&self, record: &CaseRecord) -> Vec<f64> {
        let amount = record.amount.filter(|a| a.is_finite() && *a >= 0.0);
        let mut row = vec![
            amount.map_or(0.0, f64::ln_1p),
            if amount.is_none() { 1.0 } else { 0.0 },
            if record.amount_estimated { 1.0 } else { 0.0 },
            record.year.map_or(self.year_fill, f64::from),
        ];
        let region = record.effective_region();
        row.extend(Region::KNOWN.iter().map(|r| if *r == region { 1.0 } else { 0.0 }));
        let uf = record
            .state
            .as_deref()
            .map(|s| s.trim().to_ascii_uppercase())
            .unwrap_or_default();
        row.extend(self.states.iter().map(|s| if *s == uf { 1.0 } else { 0.0 }));
        row
    }

    pub fn encode_all(&self, records: &[CaseRecord]) -> FeatureTable {
        FeatureTable::from_numeric(
            self.names(),
            records.iter().map(|r| self.encode(r)).collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    amount_estimated: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    problem: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    outcome: Option<String>,
    #[serde(default)]
    year: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Whole years only; `2019.0` is accepted, `2019.5` and out-of-range values are not.
fn parse_year(raw: &str) -> Option<i32> {
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    let value = raw.parse::<f64>().ok()?;
    let integral = value.is_finite() && value.fract() == 0.0;
    (integral && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX))
        .then_some(value as i32)
}

impl RawRow {
    fn into_record(self, row: usize) -> Result<CaseRecord> {
        let amount = match non_blank(self.amount) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                Error::validation("amount", format!("row {row}: '{raw}' is not numeric"))
            })?),
            None => None,
        };
        let year = match non_blank(self.year) {
            Some(raw) => Some(parse_year(&raw).ok_or_else(|| {
                Error::validation("year", format!("row {row}: '{raw}' is not a year"))
            })?),
            None => None,
        };
        let state = non_blank(self.state);
        let region = match non_blank(self.region) {
            Some(raw) => Region::parse(&raw),
            None => state.as_deref().map_or(Region::Unknown, Region::from_state),
        };

        let record = CaseRecord {
            amount,
            amount_estimated: non_blank(self.amount_estimated)
                .is_some_and(|v| Outcome::parse(&v).is_resolved()),
            subject: non_blank(self.subject),
            problem: non_blank(self.problem),
            region,
            state,
            outcome: non_blank(self.outcome).map_or(Outcome::Unknown, |v| Outcome::parse(&v)),
            year,
        };
        record.validate().map_err(|err| match err {
            Error::Validation { field, message } => {
                Error::validation(field, format!("row {row}: {message}"))
            }
            other => other,
        })?;
        Ok(record)
    }
}

/// Read case records from CSV.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<CaseRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::Csv(e.to_string()))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.eq_ignore_ascii_case(column)) {
            return Err(Error::MissingColumn(column.to_string()));
        }
    }
    let lowered: csv::StringRecord = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
    csv_reader.set_headers(lowered);

    let mut records = Vec::new();
    for (row, raw) in csv_reader.deserialize::<RawRow>().enumerate() {
        let raw = raw.map_err(|e| Error::Csv(e.to_string()))?;
        records.push(raw.into_record(row)?);
    }
    if records.is_empty() {
        return Err(Error::EmptyDataset);
    }
    Ok(records)
}

/// Read case records from a CSV file.
pub fn read_records_path(path: &Path) -> Result<Vec<CaseRecord>> {
    let file = File::open(path)?;
    let records = read_records(file)?;
    tracing::info!(path = %path.display(), records = records.len(), "records loaded");
    Ok(records)
}

/// Write records with their sub-scores, grade and label.
pub fn write_scored<W: Write>(
    writer: W,
    records: &[CaseRecord],
    results: &[ScoreResult],
) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    let csv_err = |e: csv::Error| Error::Csv(e.to_string());
    out.write_record([
        "amount",
        "subject",
        "problem",
        "region",
        "state",
        "outcome",
        "year",
        "value_score",
        "success_score",
        "potential_score",
        "confidence_score",
        "volume_score",
        "aggregate",
        "grade",
        "label",
        "low_confidence",
    ])
    .map_err(csv_err)?;

    for (record, result) in records.iter().zip(results) {
        let c = &result.components;
        out.write_record([
            record.amount.map(|a| a.to_string()).unwrap_or_default(),
            record.subject.clone().unwrap_or_default(),
            record.problem.clone().unwrap_or_default(),
            record.effective_region().to_string(),
            record.state.clone().unwrap_or_default(),
            record.outcome.as_str().to_string(),
            record.year.map(|y| y.to_string()).unwrap_or_default(),
            c.value.to_string(),
            c.success.to_string(),
            c.potential.to_string(),
            c.confidence.to_string(),
            c.volume.to_string(),
            result.aggregate.to_string(),
            result.grade.to_string(),
            result.binary_label.to_string(),
            result.low_confidence.to_string(),
        ])
        .map_err(csv_err)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a balanced dataset: features, `label`, `strategy`, `synthetic`.
pub fn write_balanced<W: Write>(writer: W, dataset: &BalancedDataset) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    let csv_err = |e: csv::Error| Error::Csv(e.to_string());

    let mut header = dataset.features.names.clone();
    header.extend(["label", "strategy", "synthetic"].map(String::from));
    out.write_record(&header).map_err(csv_err)?;

    let strategy = dataset.provenance.strategy_applied.as_str();
    for ((row, label), synthetic) in dataset
        .features
        .rows
        .iter()
        .zip(&dataset.labels)
        .zip(&dataset.synthetic)
    {
        let mut cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Feature::Number(v) => v.to_string(),
                Feature::Text(s) => s.clone(),
            })
            .collect();
        cells.push(label.as_str().to_string());
        cells.push(strategy.to_string());
        cells.push(u8::from(*synthetic).to_string());
        out.write_record(&cells).map_err(csv_err)?;
    }
    out.flush()?;
    Ok(())
}

/// Labels from scoring results, in record order.
pub fn labels_of(results: &[ScoreResult]) -> Vec<BinaryLabel> {
    results.iter().map(|r| r.binary_label).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
amount,subject,problem,region,state,outcome,year
5000,Energia Elétrica,Cobrança indevida,Sudeste,SP,S,2019
,Bancos,Juros,,BA,N,
120.5,Telefonia,Contrato,Nordeste,PE,S,2020
300,,Juros,Sul,RS,N,2021.0
";

    #[test]
    fn reads_sample_csv() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].amount, Some(5000.0));
        assert_eq!(records[0].outcome, Outcome::Resolved);
        assert_eq!(records[1].amount, None);
        assert_eq!(records[1].region, Region::Nordeste);
        assert_eq!(records[1].year, None);
        assert_eq!(records[2].subject.as_deref(), Some("Telefonia"));
        assert_eq!(records[3].subject, None);
        assert_eq!(records[3].year, Some(2021));
    }

    #[test]
    fn blank_subject_scores_with_the_missing_subject_note() {
        use crate::scoring::{ConfidenceNote, HistoricalStats, ViabilityScorer};
        use cv_config::ScoringConfig;

        let records = read_records(SAMPLE.as_bytes()).unwrap();
        let stats = HistoricalStats::from_records(&records);
        let result = ViabilityScorer::new(ScoringConfig::default())
            .score(&records[3], &stats)
            .unwrap();
        assert!(result.low_confidence);
        assert!(result.notes.contains(&ConfidenceNote::MissingSubject));
        assert_eq!(result.components.confidence, 0);
    }

    #[test]
    fn malformed_years_are_rejected_not_coerced() {
        for year in ["2020.7", "1e12", "NaN", "inf", "twenty"] {
            let input = format!(
                "amount,subject,problem,region,state,outcome,year\n10,A,B,Sul,RS,S,{year}\n"
            );
            let err = read_records(input.as_bytes()).unwrap_err();
            assert!(
                matches!(err, Error::Validation { ref field, .. } if field == "year"),
                "{year}: {err}"
            );
        }
    }

    #[test]
    fn missing_column_is_reported() {
        let err = read_records("amount,subject\n1,A\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "problem"));
    }

    #[test]
    fn non_numeric_amount_names_the_row() {
        let input = "amount,subject,problem,region,state,outcome,year\nabc,A,B,Sul,RS,S,2020\n";
        let err = read_records(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn negative_amount_is_rejected_on_read() {
        let input = "amount,subject,problem,region,state,outcome,year\n-5,A,B,Sul,RS,S,2020\n";
        assert!(matches!(
            read_records(input.as_bytes()),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn header_only_is_empty() {
        let input = "amount,subject,problem,region,state,outcome,year\n";
        assert!(matches!(read_records(input.as_bytes()), Err(Error::EmptyDataset)));
    }

    #[test]
    fn encoder_keeps_top_states_and_excludes_categories() {
        let records = vec![
            CaseRecord::new(100.0, "A").with_state("SP").with_year(2018),
            CaseRecord::new(200.0, "B").with_state("SP").with_year(2020),
            CaseRecord::new(300.0, "C").with_state("RJ"),
            CaseRecord::new(400.0, "D").with_state("BA"),
        ];
        let encoder = FeatureEncoder::fit(&records, 2);
        assert_eq!(encoder.states, vec!["SP".to_string(), "BA".to_string()]);
        assert_eq!(encoder.year_fill, 2019.0);

        let names = encoder.names();
        assert!(names.contains(&"region_centro_oeste".to_string()));
        assert!(!names.iter().any(|n| n.contains("subject") || n.contains("problem")));

        let table = encoder.encode_all(&records);
        assert_eq!(table.width(), names.len());
        let rows = table.numeric_rows().unwrap();
        assert!((rows[0][0] - 101f64.ln()).abs() < 1e-12);
        assert_eq!(rows[2][3], 2019.0);
    }

    #[test]
    fn text_cell_is_non_numeric() {
        let mut table = FeatureTable::new(vec!["x".into(), "channel".into()]);
        table.push_row(vec![1.0.into(), "web".into()]).unwrap();
        let err = table.numeric_rows().unwrap_err();
        assert!(matches!(err, Error::NonNumericFeature { ref feature } if feature == "channel"));
        assert!(table.push_row(vec![1.0.into()]).is_err());
    }
}
