use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::analysis::correlation::{Metric, MetricPair};

/// Display names for the three series
///
/// The same workbook layout is used with two naming conventions: SST
/// anomaly wording, or ENSO wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LabelSet {
    #[default]
    Anomaly,
    Enso,
}

impl LabelSet {
    pub fn metric_label(self, metric: Metric) -> &'static str {
        match (self, metric) {
            (LabelSet::Anomaly, Metric::Sst) => "Anomali SST",
            (LabelSet::Anomaly, Metric::Rainfall) => "Anomali Curah Hujan",
            (LabelSet::Anomaly, Metric::Productivity) => "Anomali Produktivitas",
            (LabelSet::Enso, Metric::Sst) => "ENSO",
            (LabelSet::Enso, Metric::Rainfall) => "Curah Hujan",
            (LabelSet::Enso, Metric::Productivity) => "Produktivitas",
        }
    }

    /// Map layer title, e.g. "Anomali SST vs Anomali Produktivitas"
    pub fn pair_title(self, pair: MetricPair) -> String {
        let (a, b) = pair.metrics();
        format!("{} vs {}", self.metric_label(a), self.metric_label(b))
    }
}

impl FromStr for LabelSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anomaly" | "anomali" => Ok(LabelSet::Anomaly),
            "enso" => Ok(LabelSet::Enso),
            other => Err(format!("Unknown label set '{other}' (expected anomaly or enso)")),
        }
    }
}
