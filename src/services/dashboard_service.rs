use chrono::Utc;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::analysis::{compute_with_coordinates, CoordinateLookup, LabelSet, Metric, MetricPair};
use crate::cache::{content_hash, AnalysisCache};
use crate::config::Config;
use crate::models::{MapLayer, MapMarker, ProvinceSeries, SeriesPoint, WorkbookAnalysis};
use crate::workbook::{
    normalize_province_name, parse_with_report, read_grid_from_bytes, RawGrid, WorkbookReadError,
};

/// Error types for dashboard operations
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Workbook could not be read: {0}")]
    Read(#[from] WorkbookReadError),

    #[error("No province blocks recognized in sheet '{0}'")]
    NoProvinceBlocks(String),

    #[error("Workbook not found: {0}")]
    WorkbookNotFound(String),

    #[error("Province not found: {0}")]
    ProvinceNotFound(String),

    #[error("Uploaded workbook is empty")]
    EmptyUpload,

    #[error("Analysis task failed: {0}")]
    Task(String),
}

/// Upload analysis and the views the dashboard renders from it
#[derive(Clone)]
pub struct DashboardService {
    cache: Arc<AnalysisCache<WorkbookAnalysis>>,
    coordinates: Arc<CoordinateLookup>,
    sheet_name: String,
    label_set: LabelSet,
}

impl DashboardService {
    pub fn new(
        coordinates: CoordinateLookup,
        sheet_name: impl Into<String>,
        label_set: LabelSet,
        cache_capacity: NonZeroUsize,
    ) -> Self {
        Self {
            cache: Arc::new(AnalysisCache::new(cache_capacity)),
            coordinates: Arc::new(coordinates),
            sheet_name: sheet_name.into(),
            label_set,
        }
    }

    pub fn from_config(config: &Config, coordinates: CoordinateLookup) -> Self {
        Self::new(
            coordinates,
            config.sheet_name.clone(),
            config.label_set,
            config.cache_capacity,
        )
    }

    /// Analyze an uploaded .xlsx workbook
    ///
    /// This is the main entry point that:
    /// 1. Hashes the upload and returns the cached analysis on a repeat upload
    /// 2. Reads the configured sheet (on the blocking pool, calamine is synchronous)
    /// 3. Parses province blocks into the tidy table
    /// 4. Computes correlations and joins coordinates
    #[instrument(skip(self, bytes), fields(size = bytes.as_ref().len()))]
    pub async fn analyze_upload<B>(&self, bytes: B) -> Result<Arc<WorkbookAnalysis>, DashboardError>
    where
        B: AsRef<[u8]> + Send + 'static,
    {
        if bytes.as_ref().is_empty() {
            warn!("Rejecting empty upload");
            return Err(DashboardError::EmptyUpload);
        }

        let workbook_id = content_hash(bytes.as_ref());
        if let Some(analysis) = self.cache.get(&workbook_id) {
            info!("Reusing cached analysis for workbook {}", workbook_id);
            return Ok(analysis);
        }

        let service = self.clone();
        let analysis = tokio::task::spawn_blocking(move || {
            let grid = read_grid_from_bytes(bytes.as_ref(), &service.sheet_name)?;
            service.analyze_grid(workbook_id, &grid)
        })
        .await
        .map_err(|e| DashboardError::Task(e.to_string()))??;

        Ok(self.cache.insert(analysis.workbook_id.clone(), analysis))
    }

    /// Parse and correlate an already-read grid
    ///
    /// An empty tidy table is reported as [`DashboardError::NoProvinceBlocks`]
    /// so callers stop before rendering anything.
    pub fn analyze_grid(
        &self,
        workbook_id: String,
        grid: &RawGrid,
    ) -> Result<WorkbookAnalysis, DashboardError> {
        let (table, report) = parse_with_report(grid);
        if table.is_empty() {
            warn!(
                "No province blocks recognized in sheet {} ({} rows)",
                self.sheet_name,
                grid.height()
            );
            return Err(DashboardError::NoProvinceBlocks(self.sheet_name.clone()));
        }

        for (province, year) in table.duplicate_keys() {
            warn!(
                "Conflicting rows for {} {}: both are kept and affect its correlations",
                province, year
            );
        }

        let correlations = compute_with_coordinates(&table, &self.coordinates);
        let analysis = WorkbookAnalysis {
            workbook_id,
            sheet_name: self.sheet_name.clone(),
            analyzed_at: Utc::now(),
            label_set: self.label_set,
            table,
            correlations,
        };

        let unmapped = analysis.unmapped_provinces();
        if !unmapped.is_empty() {
            info!("Provinces without coordinates: {}", unmapped.join(", "));
        }
        info!(
            "Analyzed workbook {}: {} blocks, {} provinces, {} observations",
            analysis.workbook_id,
            report.blocks.len(),
            analysis.correlations.len(),
            analysis.table.len()
        );

        Ok(analysis)
    }

    /// Cached analysis for a previously uploaded workbook
    pub fn get_analysis(&self, workbook_id: &str) -> Result<Arc<WorkbookAnalysis>, DashboardError> {
        self.cache
            .get(workbook_id)
            .ok_or_else(|| DashboardError::WorkbookNotFound(workbook_id.to_string()))
    }

    pub fn map_layer(
        &self,
        workbook_id: &str,
        pair: MetricPair,
    ) -> Result<MapLayer, DashboardError> {
        let analysis = self.get_analysis(workbook_id)?;
        Ok(Self::build_map_layer(&analysis, pair))
    }

    pub fn province_series(
        &self,
        workbook_id: &str,
        province: &str,
    ) -> Result<ProvinceSeries, DashboardError> {
        let analysis = self.get_analysis(workbook_id)?;
        Self::build_province_series(&analysis, province)
    }

    // View builders (pure)

    /// Markers for provinces with a coordinate; the rest are listed as excluded
    pub fn build_map_layer(analysis: &WorkbookAnalysis, pair: MetricPair) -> MapLayer {
        let mut markers = Vec::new();
        let mut excluded_provinces = Vec::new();

        for row in &analysis.correlations {
            match row.coordinate() {
                Some(coordinate) => markers.push(MapMarker {
                    province: row.province.clone(),
                    longitude: coordinate.longitude,
                    latitude: coordinate.latitude,
                    r: row.coefficient(pair),
                }),
                None => excluded_provinces.push(row.province.clone()),
            }
        }

        debug!(
            "Map layer {}: {} markers, {} excluded",
            pair,
            markers.len(),
            excluded_provinces.len()
        );

        MapLayer {
            pair,
            title: analysis.label_set.pair_title(pair),
            markers,
            excluded_provinces,
        }
    }

    /// Ordered (year, value) series of each metric for one province
    pub fn build_province_series(
        analysis: &WorkbookAnalysis,
        province: &str,
    ) -> Result<ProvinceSeries, DashboardError> {
        let province = normalize_province_name(province);
        let observations: Vec<_> = analysis.table.for_province(&province).collect();
        if observations.is_empty() {
            return Err(DashboardError::ProvinceNotFound(province));
        }

        let series = |metric: Metric| -> Vec<SeriesPoint> {
            observations
                .iter()
                .map(|obs| SeriesPoint {
                    year: obs.year,
                    value: metric.value(obs),
                })
                .collect()
        };

        Ok(ProvinceSeries {
            sst: series(Metric::Sst),
            rainfall: series(Metric::Rainfall),
            productivity: series(Metric::Productivity),
            province,
        })
    }
}
