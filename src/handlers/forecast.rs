use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{DateInterval, ForecastRow};
use compute::{ForecastFilter, ForecastTable, ViewerDefaults};
use tracing::{debug, info, instrument, trace};

use crate::schemas::{
    ApiResponse, AppState, ErrorResponse, ForecastOptions, ForecastQuery, compute_error_response,
};

/// Splits a comma-separated list, dropping blank items.
pub(crate) fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Applies the query to the table.
///
/// Returns `None` when the requested dates cannot match any row: the data has
/// no dates at all, or the interval lies outside the data's range.
pub(crate) fn filter_by_query(
    table: &ForecastTable,
    query: &ForecastQuery,
) -> compute::Result<Option<ForecastTable>> {
    let Some(bounds) = table.date_bounds()? else {
        debug!("Forecast table has no resolved dates");
        return Ok(None);
    };

    let start = query.start_date.unwrap_or(bounds.start);
    let end = query.end_date.unwrap_or(bounds.end);
    let Some(interval) = DateInterval::new(start, end) else {
        debug!("Empty interval {} to {}", start, end);
        return Ok(None);
    };

    let selection = ForecastFilter::new(
        split_list(query.entities.as_deref()),
        interval,
        split_list(query.likelihoods.as_deref()),
    );
    trace!("Selection: {:?}", selection);
    table.filter(&selection).map(Some)
}

/// Get resolved forecast rows matching the filters
#[utoipa::path(
    get,
    path = "/api/v1/forecast",
    tag = "forecast",
    params(ForecastQuery),
    responses(
        (status = 200, description = "Forecast rows retrieved successfully", body = ApiResponse<Vec<ForecastRow>>),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Forecast table could not be loaded", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_forecast(
    Valid(Query(query)): Valid<Query<ForecastQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ForecastRow>>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_forecast function");

    let table = state.source.table().await.map_err(compute_error_response)?;
    let rows = match filter_by_query(&table, &query).map_err(compute_error_response)? {
        Some(filtered) => filtered.rows().map_err(compute_error_response)?,
        None => Vec::new(),
    };

    info!("Returning {} forecast rows", rows.len());
    let message = if rows.is_empty() {
        "No data to display. Please select different filters.".to_string()
    } else {
        "Forecast rows retrieved successfully".to_string()
    };

    Ok(Json(ApiResponse {
        data: rows,
        message,
        success: true,
    }))
}

/// Get the filter choices and first-visit defaults of the viewer
#[utoipa::path(
    get,
    path = "/api/v1/forecast/options",
    tag = "forecast",
    responses(
        (status = 200, description = "Options retrieved successfully", body = ApiResponse<ForecastOptions>),
        (status = 500, description = "Forecast table could not be loaded", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_forecast_options(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ForecastOptions>>, (StatusCode, Json<ErrorResponse>)> {
    let table = state.source.table().await.map_err(compute_error_response)?;
    let options = build_options(&table).map_err(compute_error_response)?;

    Ok(Json(ApiResponse {
        data: options,
        message: "Forecast options retrieved successfully".to_string(),
        success: true,
    }))
}

fn build_options(table: &ForecastTable) -> compute::Result<ForecastOptions> {
    let defaults = ViewerDefaults::for_table(table)?;
    Ok(ForecastOptions {
        entities: table.entities()?,
        likelihoods: table.likelihoods()?,
        date_bounds: defaults.interval,
        default_entities: defaults.entities,
        default_likelihoods: defaults.likelihoods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("A-1, B-2,,")), vec!["A-1", "B-2"]);
        assert!(split_list(Some("")).is_empty());
        assert!(split_list(None).is_empty());
    }
}
