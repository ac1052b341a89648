use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::analysis::{CorrelationRow, LabelSet, MetricPair};
use crate::workbook::TidyTable;

/// Everything computed from one uploaded workbook
#[derive(Debug, Clone)]
pub struct WorkbookAnalysis {
    pub workbook_id: String,
    pub sheet_name: String,
    pub analyzed_at: DateTime<Utc>,
    pub label_set: LabelSet,
    pub table: TidyTable,
    pub correlations: Vec<CorrelationRow>,
}

impl WorkbookAnalysis {
    /// Provinces that have no coordinate and are left off the map
    pub fn unmapped_provinces(&self) -> Vec<String> {
        self.correlations
            .iter()
            .filter(|row| row.coordinate().is_none())
            .map(|row| row.province.clone())
            .collect()
    }

    /// User-facing, non-fatal notes about the analysis
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let unmapped = self.unmapped_provinces();
        if !unmapped.is_empty() {
            diagnostics.push(Diagnostic::ProvinceWithoutCoordinate {
                message: format!(
                    "Provinces without coordinates (not shown on the map): {}",
                    unmapped.join(", ")
                ),
                provinces: unmapped,
            });
        }

        for (province, year) in self.table.duplicate_keys() {
            diagnostics.push(Diagnostic::DuplicateProvinceYear {
                message: format!(
                    "{province} has conflicting rows for {year}; \
                     all of them are used in its correlations"
                ),
                province,
                year,
            });
        }

        diagnostics
    }

    pub fn summary(&self) -> WorkbookSummary {
        WorkbookSummary {
            workbook_id: self.workbook_id.clone(),
            sheet_name: self.sheet_name.clone(),
            analyzed_at: self.analyzed_at,
            province_count: self.correlations.len(),
            observation_count: self.table.len(),
            provinces: self
                .correlations
                .iter()
                .map(|row| row.province.clone())
                .collect(),
            diagnostics: self.diagnostics(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Diagnostic {
    ProvinceWithoutCoordinate {
        message: String,
        provinces: Vec<String>,
    },
    DuplicateProvinceYear {
        message: String,
        province: String,
        year: i32,
    },
}

impl Diagnostic {
    pub fn message(&self) -> &str {
        match self {
            Diagnostic::ProvinceWithoutCoordinate { message, .. }
            | Diagnostic::DuplicateProvinceYear { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkbookSummary {
    pub workbook_id: String,
    pub sheet_name: String,
    pub analyzed_at: DateTime<Utc>,
    pub province_count: usize,
    pub observation_count: usize,
    pub provinces: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MapMarker {
    pub province: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Correlation coefficient in [-1, 1]; null when undefined
    pub r: Option<f64>,
}

/// One selectable map layer: a marker per province that has a coordinate
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapLayer {
    pub pair: MetricPair,
    pub title: String,
    pub markers: Vec<MapMarker>,
    pub excluded_provinces: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: Option<f64>,
}

/// Year series of each metric for one province (bar chart view)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProvinceSeries {
    pub province: String,
    pub sst: Vec<SeriesPoint>,
    pub rainfall: Vec<SeriesPoint>,
    pub productivity: Vec<SeriesPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{compute_with_coordinates, CoordinateLookup};
    use crate::workbook::Observation;

    fn obs(province: &str, year: i32, sst: f64) -> Observation {
        Observation {
            province: province.to_string(),
            year,
            sst_anomaly: Some(sst),
            rainfall_anomaly: None,
            productivity_anomaly: None,
        }
    }

    fn analysis(records: Vec<Observation>) -> WorkbookAnalysis {
        let table = TidyTable::from_records(records);
        let correlations = compute_with_coordinates(&table, &CoordinateLookup::builtin());
        WorkbookAnalysis {
            workbook_id: "abc".to_string(),
            sheet_name: "Gabung".to_string(),
            analyzed_at: Utc::now(),
            label_set: LabelSet::Anomaly,
            table,
            correlations,
        }
    }

    #[test]
    fn test_clean_analysis_has_no_diagnostics() {
        let analysis = analysis(vec![obs("Bali", 2018, 0.1), obs("Bali", 2019, 0.2)]);
        assert!(analysis.diagnostics().is_empty());
        assert!(analysis.unmapped_provinces().is_empty());
    }

    #[test]
    fn test_diagnostics_report_unmapped_and_conflicting_rows() {
        let analysis = analysis(vec![
            obs("Bali", 2018, 0.1),
            obs("Bali", 2018, 0.9),
            obs("Atlantis", 2018, 0.3),
        ]);

        let diagnostics = analysis.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            &diagnostics[0],
            Diagnostic::ProvinceWithoutCoordinate { provinces, .. } if provinces == &["Atlantis"]
        ));
        assert!(matches!(
            &diagnostics[1],
            Diagnostic::DuplicateProvinceYear { province, year: 2018, .. } if province == "Bali"
        ));
        assert!(diagnostics[1].message().contains("Bali"));
    }

    #[test]
    fn test_summary_counts() {
        let analysis = analysis(vec![
            obs("Bali", 2018, 0.1),
            obs("Bali", 2019, 0.2),
            obs("Aceh", 2018, 0.3),
        ]);

        let summary = analysis.summary();
        assert_eq!(summary.province_count, 2);
        assert_eq!(summary.observation_count, 3);
        assert_eq!(summary.provinces, vec!["Aceh", "Bali"]);
    }

    #[test]
    fn test_diagnostic_serializes_with_code_tag() {
        let diagnostic = Diagnostic::DuplicateProvinceYear {
            message: "m".to_string(),
            province: "Bali".to_string(),
            year: 2018,
        };
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["code"], "duplicate_province_year");
        assert_eq!(json["year"], 2018);
    }
}
