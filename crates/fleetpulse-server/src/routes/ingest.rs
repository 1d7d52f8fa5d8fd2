use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use fleetpulse_core::event::{DeliveryEvent, IngestOrBatch};

use crate::{error::AppError, state::AppState};

/// Maximum events accepted in one ingest request.
const MAX_BATCH: usize = 500;

/// `POST /api/ingest` — record a delivery event or a batch of them.
///
/// Accepts a single JSON object or an array. The whole batch is written in
/// one transaction; ids are generated server-side and `occurred_at` defaults
/// to the receive time.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IngestOrBatch>,
) -> Result<impl IntoResponse, AppError> {
    let payloads = match body {
        IngestOrBatch::Single(payload) => vec![*payload],
        IngestOrBatch::Batch(payloads) => payloads,
    };
    if payloads.is_empty() {
        return Err(AppError::BadRequest("empty batch".to_string()));
    }
    if payloads.len() > MAX_BATCH {
        return Err(AppError::BatchTooLarge(payloads.len()));
    }

    let received_at = Utc::now();
    let events: Vec<DeliveryEvent> = payloads
        .into_iter()
        .map(|payload| DeliveryEvent::from_payload(payload, received_at))
        .collect();

    state
        .db
        .record_events(&events)
        .await
        .map_err(AppError::Internal)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "data": { "recorded": events.len() } })),
    ))
}
