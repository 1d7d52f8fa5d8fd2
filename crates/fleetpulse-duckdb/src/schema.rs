/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup (idempotent).
///
/// `memory_limit` is passed at runtime from `Config.duckdb_memory_limit`
/// (env `FLEETPULSE_DUCKDB_MEMORY`, default `"1GB"`). DuckDB accepts any
/// size string it supports — e.g. `"512MB"`, `"1GB"`, `"4GB"`.
///
/// `SET threads = 2` limits the background thread pool; safe for
/// single-writer embedded use.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- DELIVERY EVENTS
-- ===========================================
-- One row per raw counter record from a brand integration. Timestamps are
-- stored as UTC; hour-of-day is derived at read time in the declared
-- reporting timezone (one conversion, at the source boundary).
CREATE TABLE IF NOT EXISTS delivery_events (
    id                  VARCHAR PRIMARY KEY,
    brand               VARCHAR NOT NULL,
    feature             VARCHAR NOT NULL,
    source              VARCHAR NOT NULL,          -- 'device' | 'sdk' | 'portal'
    device_id           VARCHAR,
    new_device          BOOLEAN NOT NULL DEFAULT FALSE,
    revenue             DOUBLE NOT NULL DEFAULT 0,
    notifications_shown BIGINT NOT NULL DEFAULT 0,
    experiences_shown   BIGINT NOT NULL DEFAULT 0,
    installs            BIGINT NOT NULL DEFAULT 0,
    occurred_at         TIMESTAMP NOT NULL
);
-- Window queries always restrict on occurred_at plus brand/feature lists.
CREATE INDEX IF NOT EXISTS idx_delivery_brand_time
    ON delivery_events(brand, occurred_at);
CREATE INDEX IF NOT EXISTS idx_delivery_feature_time
    ON delivery_events(feature, occurred_at);
"#
    )
}
