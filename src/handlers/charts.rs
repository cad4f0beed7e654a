use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::RateStream;
use tracing::{debug, instrument, warn};

use crate::charts::render_series;
use crate::handlers::forecast::filter_by_query;
use crate::schemas::{
    ApiResponse, AppState, ChartResponse, ErrorResponse, ForecastQuery, compute_error_response,
};

/// Get the stacked-area chart of one rate stream
#[utoipa::path(
    get,
    path = "/api/v1/charts/{rate}",
    tag = "charts",
    params(
        ("rate" = String, Path, description = "Rate stream: oil, gas or water"),
        ForecastQuery,
    ),
    responses(
        (status = 200, description = "Chart rendered, figure is null when no rows match", body = ApiResponse<ChartResponse>),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Unknown rate stream", body = ErrorResponse),
        (status = 500, description = "Forecast table could not be loaded", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_rate_chart(
    Path(rate): Path<String>,
    Valid(Query(query)): Valid<Query<ForecastQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ChartResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let rate: RateStream = match rate.parse() {
        Ok(rate) => rate,
        Err(e) => {
            warn!("{}", e);
            return Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new(e, "UNKNOWN_RATE"))));
        }
    };

    let table = state.source.table().await.map_err(compute_error_response)?;
    let plot = match filter_by_query(&table, &query).map_err(compute_error_response)? {
        Some(filtered) => render_series(&filtered, rate).map_err(compute_error_response)?,
        None => None,
    };

    let figure = match plot {
        Some(plot) => Some(serde_json::from_str(&plot.to_json()).map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string(), "CHART_ERROR")),
            )
        })?),
        None => None,
    };
    debug!("Chart for {} has figure: {}", rate, figure.is_some());

    let message = if figure.is_some() {
        "Chart rendered successfully".to_string()
    } else {
        "No data to display. Please select different filters.".to_string()
    };

    Ok(Json(ApiResponse {
        data: ChartResponse {
            rate,
            title: rate.title().to_string(),
            figure,
        },
        message,
        success: true,
    }))
}
