use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `POST /api/report/refresh` — explicit cache invalidation.
///
/// Drops every cached report so the next render re-queries the source. This
/// is the only way to see fresh numbers before the TTL elapses.
pub async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.invalidate().await;
    Json(json!({ "data": { "invalidated": true } }))
}
