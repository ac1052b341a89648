use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use utoipa::ToSchema;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

/// Trim a province name and collapse internal whitespace runs to one space
///
/// "  Jawa   Barat " → "Jawa Barat"
pub fn normalize_province_name(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned()
}

/// One province-year observation of the three anomaly series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Observation {
    pub province: String,
    pub year: i32,
    pub sst_anomaly: Option<f64>,
    pub rainfall_anomaly: Option<f64>,
    pub productivity_anomaly: Option<f64>,
}

impl Observation {
    fn dedup_key(&self) -> (String, i32, [Option<u64>; 3]) {
        // -0.0 and 0.0 count as the same value
        let bits = |v: Option<f64>| v.map(|x| if x == 0.0 { 0 } else { x.to_bits() });
        (
            self.province.clone(),
            self.year,
            [
                bits(self.sst_anomaly),
                bits(self.rainfall_anomaly),
                bits(self.productivity_anomaly),
            ],
        )
    }
}

/// Tidy per-province yearly table for one workbook, sorted by (province, year)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TidyTable {
    observations: Vec<Observation>,
}

impl TidyTable {
    /// Normalize raw extracted records into a tidy table
    ///
    /// Province names are normalized, empty names dropped, exact duplicate
    /// records removed (first kept) and the result sorted by (province, year).
    pub fn from_records(records: Vec<Observation>) -> Self {
        let mut seen = HashSet::new();
        let mut observations: Vec<Observation> = records
            .into_iter()
            .map(|mut obs| {
                obs.province = normalize_province_name(&obs.province);
                obs
            })
            .filter(|obs| !obs.province.is_empty())
            .filter(|obs| seen.insert(obs.dedup_key()))
            .collect();

        // Stable: rows sharing (province, year) keep their sheet order
        observations.sort_by(|a, b| (&a.province, a.year).cmp(&(&b.province, b.year)));

        Self { observations }
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Distinct province names in first-appearance order
    pub fn provinces(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.observations
            .iter()
            .map(|obs| obs.province.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Observations of one province, ascending by year
    pub fn for_province<'a>(&'a self, province: &'a str) -> impl Iterator<Item = &'a Observation> {
        self.observations
            .iter()
            .filter(move |obs| obs.province == province)
    }

    /// (province, year) keys carried by more than one record
    ///
    /// Exact duplicates are already gone, so these rows disagree on at least
    /// one metric and all of them feed the province's correlations.
    pub fn duplicate_keys(&self) -> Vec<(String, i32)> {
        let mut keys: Vec<(String, i32)> = self
            .observations
            .windows(2)
            .filter(|pair| pair[0].province == pair[1].province && pair[0].year == pair[1].year)
            .map(|pair| (pair[0].province.clone(), pair[0].year))
            .collect();
        keys.dedup();
        keys
    }
}
