use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — permissive CORS so the dashboard frontend can be served
///    from a different origin during development.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/report/summary", get(routes::report::summary))
        .route("/api/report/hourly", get(routes::report::hourly))
        .route("/api/report/insights", get(routes::report::insights))
        .route("/api/report/export", get(routes::export::export_summary))
        .route("/api/report/refresh", post(routes::refresh::refresh))
        .route("/api/ingest", post(routes::ingest::ingest))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
