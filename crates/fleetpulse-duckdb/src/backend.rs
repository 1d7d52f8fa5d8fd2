use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use chrono_tz::Tz;
use fleetpulse_core::event::DeliveryEvent;

use crate::schema::init_sql;

/// A DuckDB-backed metrics source.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. We wrap the connection in `Arc<Mutex<_>>` so the async
/// runtime serialises access while the struct stays cheap to clone and share
/// across Axum handlers.
///
/// The reporting timezone is fixed at open time and used for exactly one
/// thing: converting UTC hour buckets to hour-of-day in the aggregate
/// queries. Nothing downstream converts again.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
    pub(crate) timezone: Tz,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`,
    /// read from `Config.duckdb_memory_limit` at the call site. Runs the
    /// schema init SQL so tables and indexes exist.
    pub fn open(path: &str, memory_limit: &str, timezone: Tz) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2, reporting tz={}",
            path, memory_limit, timezone
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            timezone,
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only — data is discarded when the struct is
    /// dropped. Uses a 1GB memory limit (tests are not memory-constrained).
    pub fn open_in_memory(timezone: Tz) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            timezone,
        })
    }

    /// Insert a batch of delivery events in a single transaction.
    ///
    /// Returns immediately (no-op) if `events` is empty. One fsync for the
    /// whole batch instead of N.
    pub async fn record_events(&self, events: &[DeliveryEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        for event in events {
            tx.execute(
                r#"INSERT INTO delivery_events (
                    id, brand, feature, source, device_id, new_device,
                    revenue, notifications_shown, experiences_shown, installs,
                    occurred_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                duckdb::params![
                    event.id,
                    event.brand,
                    event.feature,
                    event.source.as_str(),
                    event.device_id,
                    event.new_device,
                    event.revenue,
                    event.notifications_shown,
                    event.experiences_shown,
                    event.installs,
                    event
                        .occurred_at
                        .naive_utc()
                        .format("%Y-%m-%d %H:%M:%S%.6f")
                        .to_string(),
                ],
            )?;
        }

        tx.commit()?;
        tracing::info!("Recorded {} delivery events", events.len());
        Ok(())
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    ///
    /// Called by the `/health` endpoint. Returns an error if the connection
    /// is unavailable (file locked, disk full, etc.).
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    /// Production code should use the typed methods and query modules.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
