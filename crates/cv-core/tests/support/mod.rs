//! Synthetic case datasets shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use cv_common::{CaseRecord, Outcome, Region};

const SUBJECTS: [(&str, f64); 4] = [
    ("Energia Elétrica", 0.8),
    ("Telefonia", 0.35),
    ("Bancos", 0.55),
    ("Planos de Saúde", 0.2),
];

const STATES: [(&str, Region); 4] = [
    ("SP", Region::Sudeste),
    ("BA", Region::Nordeste),
    ("RS", Region::Sul),
    ("AM", Region::Norte),
];

/// `n` records over four subjects with fixed per-subject resolution rates.
pub fn records(n: u32) -> Vec<CaseRecord> {
    (0..n)
        .map(|i| {
            let (subject, rate) = SUBJECTS[(i % 4) as usize];
            let (state, region) = STATES[((i / 4) % 4) as usize];
            let resolved = f64::from(i % 20) / 20.0 < rate;
            CaseRecord::new(f64::from((i * 37) % 80) * 250.0, subject)
                .with_problem(if i % 3 == 0 { "Cobrança indevida" } else { "Vício do produto" })
                .with_region(region)
                .with_state(state)
                .with_outcome(if resolved {
                    Outcome::Resolved
                } else {
                    Outcome::Unresolved
                })
                .with_year(2015 + (i % 6) as i32)
        })
        .collect()
}

/// Render records as an input CSV.
pub fn csv(records: &[CaseRecord]) -> String {
    let mut out = String::from("amount,subject,problem,region,state,outcome,year\n");
    for r in records {
        let outcome = match r.outcome {
            Outcome::Resolved => "S",
            Outcome::Unresolved => "N",
            Outcome::Unknown => "",
        };
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            r.amount.map(|a| a.to_string()).unwrap_or_default(),
            r.subject.clone().unwrap_or_default(),
            r.problem.clone().unwrap_or_default(),
            r.region.as_str(),
            r.state.clone().unwrap_or_default(),
            outcome,
            r.year.map(|y| y.to_string()).unwrap_or_default(),
        ));
    }
    out
}

/// Write `n` synthetic records to `dir/records.csv`.
pub fn write_records(dir: &Path, n: u32) -> PathBuf {
    let path = dir.join("records.csv");
    let mut file = std::fs::File::create(&path).expect("create records.csv");
    file.write_all(csv(&records(n)).as_bytes())
        .expect("write records.csv");
    path
}

/// Two well-separated numeric features; the first `minority` rows are VIABLE.
pub fn two_feature_table(majority: usize, minority: usize) -> (Vec<Vec<f64>>, Vec<bool>) {
    let mut x = Vec::with_capacity(majority + minority);
    let mut y = Vec::with_capacity(majority + minority);
    for i in 0..minority {
        let t = i as f64;
        x.push(vec![8.0 + (t * 0.37) % 2.0, 8.0 + (t * 0.61) % 2.0]);
        y.push(true);
    }
    for i in 0..majority {
        let t = i as f64;
        x.push(vec![(t * 0.13) % 5.0, (t * 0.29) % 5.0]);
        y.push(false);
    }
    (x, y)
}
