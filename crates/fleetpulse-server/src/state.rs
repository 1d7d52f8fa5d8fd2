use std::sync::Arc;

use chrono_tz::Tz;

use fleetpulse_core::{config::Config, engine::ComparisonEngine};
use fleetpulse_duckdb::DuckDbBackend;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// All fields are safe to clone cheaply — heavy resources are wrapped in
/// `Arc`.
pub struct AppState {
    /// The DuckDB backend. Internally uses `Arc<tokio::sync::Mutex<Connection>>`
    /// so it is already cheap to clone and async-safe. Used directly by the
    /// ingest and health routes; report routes go through the engine.
    pub db: Arc<DuckDbBackend>,

    /// The aggregation engine wrapping the backend as its metrics source,
    /// with the process-wide TTL report cache.
    pub engine: ComparisonEngine,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct a new `AppState` wrapping the given backend and config.
    ///
    /// `timezone` is the already-parsed declared reporting timezone; the
    /// engine and the backend share the same value.
    pub fn new(db: DuckDbBackend, config: Config, timezone: Tz) -> Self {
        let db = Arc::new(db);
        let engine = ComparisonEngine::new(db.clone(), timezone, config.cache_ttl());
        Self {
            db,
            engine,
            config: Arc::new(config),
        }
    }
}
