use crate::handlers::{
    charts::get_rate_chart,
    forecast::{get_forecast, get_forecast_options},
    health::health_check,
    viewer::viewer_page,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{Router, routing::get};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Viewer page
        .route("/", get(viewer_page))
        // Health check
        .route("/health", get(health_check))
        // Forecast data
        .route("/api/v1/forecast", get(get_forecast))
        .route("/api/v1/forecast/options", get(get_forecast_options))
        // Charts
        .route("/api/v1/charts/:rate", get(get_rate_chart))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
