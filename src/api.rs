use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::{OpenApi, ToSchema};

use crate::analysis::{CorrelationRow, MetricPair};
use crate::models::{Diagnostic, MapLayer, MapMarker, ProvinceSeries, SeriesPoint, WorkbookSummary};
use crate::services::{DashboardError, DashboardService};
use crate::workbook::Observation;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub max_upload_bytes: usize,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MapQuery {
    #[serde(default, deserialize_with = "deserialize_pair")]
    pub pair: MetricPair,
}

/// Accepts any casing and surrounding whitespace, e.g. `?pair=SST-Rainfall`
fn deserialize_pair<'de, D>(deserializer: D) -> Result<MetricPair, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Error returned by handlers, rendered as `{ "error": code, "message": text }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        let (status, code, message) = match &err {
            DashboardError::Read(cause) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "workbook_unreadable",
                format!("The uploaded file could not be read. Detail: {cause}"),
            ),
            DashboardError::NoProvinceBlocks(sheet) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_province_blocks",
                format!("No province blocks were recognized in sheet '{sheet}'"),
            ),
            DashboardError::WorkbookNotFound(_) => {
                (StatusCode::NOT_FOUND, "workbook_not_found", err.to_string())
            }
            DashboardError::ProvinceNotFound(_) => {
                (StatusCode::NOT_FOUND, "province_not_found", err.to_string())
            }
            DashboardError::EmptyUpload => {
                (StatusCode::BAD_REQUEST, "empty_upload", err.to_string())
            }
            DashboardError::Task(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                err.to_string(),
            ),
        };

        Self {
            status,
            code,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        upload_workbook,
        get_workbook,
        get_observations,
        get_correlations,
        get_map_layer,
        get_province_series
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        WorkbookSummary,
        Diagnostic,
        Observation,
        CorrelationRow,
        MetricPair,
        MapLayer,
        MapMarker,
        ProvinceSeries,
        SeriesPoint
    )),
    tags((name = "dashboard", description = "Province anomaly correlation dashboard"))
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    let api_routes = Router::new()
        .route("/health", get(health))
        .route(
            "/workbooks",
            post(upload_workbook).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/workbooks/{workbook_id}", get(get_workbook))
        .route("/workbooks/{workbook_id}/observations", get(get_observations))
        .route("/workbooks/{workbook_id}/correlations", get(get_correlations))
        .route("/workbooks/{workbook_id}/map", get(get_map_layer))
        .route(
            "/workbooks/{workbook_id}/provinces/{province}/series",
            get(get_province_series),
        )
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "dashboard",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/workbooks",
    tag = "dashboard",
    request_body(content = String, description = "Raw .xlsx workbook bytes", content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Workbook analyzed", body = WorkbookSummary),
        (status = 400, description = "Empty upload", body = ErrorResponse),
        (status = 413, description = "Upload larger than the configured limit"),
        (status = 422, description = "Workbook unreadable or no province blocks recognized", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body), fields(size = body.len()))]
async fn upload_workbook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<WorkbookSummary>), ApiError> {
    debug!("Received workbook upload ({} bytes)", body.len());
    let analysis = state
        .dashboard_service
        .analyze_upload(body)
        .await
        .map_err(|e| {
            match &e {
                DashboardError::Task(_) => error!("Workbook analysis failed: {}", e),
                _ => warn!("Workbook upload rejected: {}", e),
            }
            ApiError::from(e)
        })?;

    let summary = analysis.summary();
    info!(
        "Workbook {} analyzed: {} provinces, {} observations",
        summary.workbook_id, summary.province_count, summary.observation_count
    );

    Ok((StatusCode::CREATED, Json(summary)))
}

#[utoipa::path(
    get,
    path = "/api/v1/workbooks/{workbook_id}",
    tag = "dashboard",
    params(("workbook_id" = String, Path, description = "Content hash returned by the upload")),
    responses(
        (status = 200, description = "Summary of an analyzed workbook", body = WorkbookSummary),
        (status = 404, description = "Unknown workbook", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(workbook_id = %workbook_id))]
async fn get_workbook(
    State(state): State<AppState>,
    Path(workbook_id): Path<String>,
) -> Result<Json<WorkbookSummary>, ApiError> {
    let analysis = state
        .dashboard_service
        .get_analysis(&workbook_id)
        .map_err(|e| {
            warn!("Workbook {} not available: {}", workbook_id, e);
            ApiError::from(e)
        })?;

    Ok(Json(analysis.summary()))
}

#[utoipa::path(
    get,
    path = "/api/v1/workbooks/{workbook_id}/observations",
    tag = "dashboard",
    params(("workbook_id" = String, Path, description = "Content hash returned by the upload")),
    responses(
        (status = 200, description = "Tidy table sorted by province and year", body = [Observation]),
        (status = 404, description = "Unknown workbook", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(workbook_id = %workbook_id))]
async fn get_observations(
    State(state): State<AppState>,
    Path(workbook_id): Path<String>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let analysis = state
        .dashboard_service
        .get_analysis(&workbook_id)
        .map_err(|e| {
            warn!("Workbook {} not available: {}", workbook_id, e);
            ApiError::from(e)
        })?;

    debug!("Returning {} observations", analysis.table.len());
    Ok(Json(analysis.table.observations().to_vec()))
}

#[utoipa::path(
    get,
    path = "/api/v1/workbooks/{workbook_id}/correlations",
    tag = "dashboard",
    params(("workbook_id" = String, Path, description = "Content hash returned by the upload")),
    responses(
        (status = 200, description = "Correlation coefficients per province", body = [CorrelationRow]),
        (status = 404, description = "Unknown workbook", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(workbook_id = %workbook_id))]
async fn get_correlations(
    State(state): State<AppState>,
    Path(workbook_id): Path<String>,
) -> Result<Json<Vec<CorrelationRow>>, ApiError> {
    let analysis = state
        .dashboard_service
        .get_analysis(&workbook_id)
        .map_err(|e| {
            warn!("Workbook {} not available: {}", workbook_id, e);
            ApiError::from(e)
        })?;

    Ok(Json(analysis.correlations.clone()))
}

#[utoipa::path(
    get,
    path = "/api/v1/workbooks/{workbook_id}/map",
    tag = "dashboard",
    params(
        ("workbook_id" = String, Path, description = "Content hash returned by the upload"),
        ("pair" = Option<MetricPair>, Query, description = "Metric pair to color markers by (default sst-productivity)")
    ),
    responses(
        (status = 200, description = "Map markers for one metric pair", body = MapLayer),
        (status = 400, description = "Unknown metric pair"),
        (status = 404, description = "Unknown workbook", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(workbook_id = %workbook_id, pair = %query.pair))]
async fn get_map_layer(
    State(state): State<AppState>,
    Path(workbook_id): Path<String>,
    Query(query): Query<MapQuery>,
) -> Result<Json<MapLayer>, ApiError> {
    let layer = state
        .dashboard_service
        .map_layer(&workbook_id, query.pair)
        .map_err(|e| {
            warn!("Map layer for workbook {} unavailable: {}", workbook_id, e);
            ApiError::from(e)
        })?;

    info!(
        "Map layer '{}': {} markers, {} provinces without coordinates",
        layer.title,
        layer.markers.len(),
        layer.excluded_provinces.len()
    );
    Ok(Json(layer))
}

#[utoipa::path(
    get,
    path = "/api/v1/workbooks/{workbook_id}/provinces/{province}/series",
    tag = "dashboard",
    params(
        ("workbook_id" = String, Path, description = "Content hash returned by the upload"),
        ("province" = String, Path, description = "Province name")
    ),
    responses(
        (status = 200, description = "Year series of each metric", body = ProvinceSeries),
        (status = 404, description = "Unknown workbook or province", body = ErrorResponse)
    )
)]
#[instrument(skip(state), fields(workbook_id = %workbook_id, province = %province))]
async fn get_province_series(
    State(state): State<AppState>,
    Path((workbook_id, province)): Path<(String, String)>,
) -> Result<Json<ProvinceSeries>, ApiError> {
    let series = state
        .dashboard_service
        .province_series(&workbook_id, &province)
        .map_err(|e| {
            warn!("Series for {} in workbook {} unavailable: {}", province, workbook_id, e);
            ApiError::from(e)
        })?;

    debug!("Returning {} years for {}", series.sst.len(), series.province);
    Ok(Json(series))
}
