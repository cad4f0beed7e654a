use axum::{Json, http::StatusCode};
use chrono::NaiveDate;
use common::{DateInterval, ForecastRow, RateStream};
use compute::ComputeError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::{Validate, ValidationError};

use crate::source::ForecastSource;

pub use common::ApiResponse;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Lazily loaded forecast table
    pub source: Arc<ForecastSource>,
}

/// Query parameters for the forecast and chart endpoints
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams, Validate)]
#[validate(schema(function = "validate_date_order"))]
pub struct ForecastQuery {
    /// Entities to include (comma-separated, empty for all)
    pub entities: Option<String>,
    /// Likelihood tags to include (comma-separated, empty for all)
    pub likelihoods: Option<String>,
    /// First date included (YYYY-MM-DD), defaults to the earliest date in the data
    pub start_date: Option<NaiveDate>,
    /// Last date included (YYYY-MM-DD), defaults to the latest date in the data
    pub end_date: Option<NaiveDate>,
}

fn validate_date_order(query: &ForecastQuery) -> Result<(), ValidationError> {
    match (query.start_date, query.end_date) {
        (Some(start), Some(end)) if start > end => {
            let mut err = ValidationError::new("date_order");
            err.message = Some("start_date must not be after end_date".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Filter choices offered by the viewer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForecastOptions {
    /// All entities, alphabetically
    pub entities: Vec<String>,
    /// All likelihood tags, in order of appearance
    pub likelihoods: Vec<String>,
    /// Earliest and latest resolved date
    pub date_bounds: Option<DateInterval>,
    /// Entity preselected on first visit
    pub default_entities: Vec<String>,
    /// Likelihood preselected on first visit
    pub default_likelihoods: Vec<String>,
}

/// Chart of one rate stream
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChartResponse {
    /// Rate stream charted
    pub rate: RateStream,
    /// Panel title
    pub title: String,
    /// Plotly figure, `null` when the selection is empty
    #[schema(value_type = Option<Object>)]
    pub figure: Option<serde_json::Value>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

/// Maps a data-layer failure to an API error.
pub fn compute_error_response(err: ComputeError) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("Request failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(err.to_string(), err.code())),
    )
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Path of the forecast table
    pub data_source: String,
    /// Whether the forecast table has been loaded yet
    pub table_loaded: bool,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::forecast::get_forecast,
        crate::handlers::forecast::get_forecast_options,
        crate::handlers::charts::get_rate_chart,
    ),
    components(
        schemas(
            ApiResponse<Vec<ForecastRow>>,
            ApiResponse<ForecastOptions>,
            ApiResponse<ChartResponse>,
            ErrorResponse,
            HealthResponse,
            ForecastQuery,
            ForecastOptions,
            ChartResponse,
            ForecastRow,
            DateInterval,
            RateStream,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "forecast", description = "Resolved forecast rows"),
        (name = "charts", description = "Stacked-area rate charts"),
    ),
    info(
        title = "Wellcast API",
        description = "Well production forecast viewer",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
