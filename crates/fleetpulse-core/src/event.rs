use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::filter::EventSource;

/// The payload the client sends to POST /api/ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestPayload {
    pub brand: String,
    pub feature: String,
    pub source: EventSource,
    pub device_id: Option<String>,
    /// First time this device was seen by the fleet.
    #[serde(default)]
    pub new_device: bool,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub notifications_shown: i64,
    #[serde(default)]
    pub experiences_shown: i64,
    #[serde(default)]
    pub installs: i64,
    /// Defaults to the server's receive time when absent.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Accepts either a single event or a batch array at POST /api/ingest.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IngestOrBatch {
    Single(Box<IngestPayload>),
    Batch(Vec<IngestPayload>),
}

/// The stored version of an event — mirrors the `delivery_events` table
/// columns exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryEvent {
    pub id: String,
    pub brand: String,
    pub feature: String,
    pub source: EventSource,
    pub device_id: Option<String>,
    pub new_device: bool,
    pub revenue: f64,
    pub notifications_shown: i64,
    pub experiences_shown: i64,
    pub installs: i64,
    pub occurred_at: DateTime<Utc>,
}

impl DeliveryEvent {
    pub fn from_payload(payload: IngestPayload, received_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            brand: payload.brand,
            feature: payload.feature,
            source: payload.source,
            device_id: payload.device_id,
            new_device: payload.new_device,
            revenue: payload.revenue,
            notifications_shown: payload.notifications_shown,
            experiences_shown: payload.experiences_shown,
            installs: payload.installs,
            occurred_at: payload.occurred_at.unwrap_or(received_at),
        }
    }
}
