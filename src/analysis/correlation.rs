use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use utoipa::ToSchema;

use crate::analysis::coordinates::{Coordinate, CoordinateLookup};
use crate::workbook::{Observation, TidyTable};

/// Fewer paired samples than this leaves the coefficient undefined
pub const MIN_PAIRED_SAMPLES: usize = 3;

/// One of the three anomaly series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Sst,
    Rainfall,
    Productivity,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Sst, Metric::Rainfall, Metric::Productivity];

    pub fn value(self, obs: &Observation) -> Option<f64> {
        match self {
            Metric::Sst => obs.sst_anomaly,
            Metric::Rainfall => obs.rainfall_anomaly,
            Metric::Productivity => obs.productivity_anomaly,
        }
    }
}

/// Unordered pair of metrics a coefficient is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MetricPair {
    #[default]
    SstProductivity,
    SstRainfall,
    RainfallProductivity,
}

impl MetricPair {
    /// Presentation order used by the map layer selector
    pub const ALL: [MetricPair; 3] = [
        MetricPair::SstProductivity,
        MetricPair::SstRainfall,
        MetricPair::RainfallProductivity,
    ];

    pub fn metrics(self) -> (Metric, Metric) {
        match self {
            MetricPair::SstProductivity => (Metric::Sst, Metric::Productivity),
            MetricPair::SstRainfall => (Metric::Sst, Metric::Rainfall),
            MetricPair::RainfallProductivity => (Metric::Rainfall, Metric::Productivity),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricPair::SstProductivity => "sst-productivity",
            MetricPair::SstRainfall => "sst-rainfall",
            MetricPair::RainfallProductivity => "rainfall-productivity",
        }
    }
}

impl fmt::Display for MetricPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricPair::ALL
            .into_iter()
            .find(|pair| pair.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown metric pair '{s}' \
                     (expected sst-productivity, sst-rainfall or rainfall-productivity)"
                )
            })
    }
}

/// Correlation coefficients of one province, joined with its map position
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CorrelationRow {
    pub province: String,
    pub sst_productivity: Option<f64>,
    pub sst_rainfall: Option<f64>,
    pub rainfall_productivity: Option<f64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl CorrelationRow {
    pub fn coefficient(&self, pair: MetricPair) -> Option<f64> {
        match pair {
            MetricPair::SstProductivity => self.sst_productivity,
            MetricPair::SstRainfall => self.sst_rainfall,
            MetricPair::RainfallProductivity => self.rainfall_productivity,
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate {
            longitude: self.longitude?,
            latitude: self.latitude?,
        })
    }
}

/// Pearson product-moment correlation of two equally long series
///
/// Returns `None` below [`MIN_PAIRED_SAMPLES`], when either series is
/// constant, or when the result is not a finite number.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < MIN_PAIRED_SAMPLES {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);

    // Constant input can leave rounding noise in the deviations, so check directly
    if xs.iter().all(|x| *x == xs[0]) || ys.iter().all(|y| *y == ys[0]) {
        return None;
    }

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    // The (n - 1) normalization of the sample covariance and deviations cancels
    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }

    let r = sxy / denominator;
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Coefficient for one metric pair over a province's observations
///
/// Only years where both metrics are present take part.
pub fn paired_correlation<'a>(
    observations: impl IntoIterator<Item = &'a Observation>,
    pair: MetricPair,
) -> Option<f64> {
    let (a, b) = pair.metrics();
    let (xs, ys): (Vec<f64>, Vec<f64>) = observations
        .into_iter()
        .filter_map(|obs| Some((a.value(obs)?, b.value(obs)?)))
        .unzip();

    pearson(&xs, &ys)
}

/// One row per province (first-appearance order), coordinates left unset
pub fn compute(table: &TidyTable) -> Vec<CorrelationRow> {
    table
        .provinces()
        .into_iter()
        .map(|province| {
            let row = CorrelationRow {
                province: province.to_string(),
                sst_productivity: paired_correlation(
                    table.for_province(province),
                    MetricPair::SstProductivity,
                ),
                sst_rainfall: paired_correlation(
                    table.for_province(province),
                    MetricPair::SstRainfall,
                ),
                rainfall_productivity: paired_correlation(
                    table.for_province(province),
                    MetricPair::RainfallProductivity,
                ),
                longitude: None,
                latitude: None,
            };
            debug!(
                "Correlations for {}: sst/prod={:?} sst/rain={:?} rain/prod={:?}",
                row.province, row.sst_productivity, row.sst_rainfall, row.rainfall_productivity
            );
            row
        })
        .collect()
}

/// [`compute`], then join each province's coordinate from the lookup
pub fn compute_with_coordinates(
    table: &TidyTable,
    lookup: &CoordinateLookup,
) -> Vec<CorrelationRow> {
    compute(table)
        .into_iter()
        .map(|mut row| {
            if let Some(coordinate) = lookup.get(&row.province) {
                row.longitude = Some(coordinate.longitude);
                row.latitude = Some(coordinate.latitude);
            }
            row
        })
        .collect()
}
