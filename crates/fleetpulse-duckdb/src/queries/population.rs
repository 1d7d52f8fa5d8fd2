use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use fleetpulse_core::counter::{Counter, MetricValue, PopulationTotal};
use fleetpulse_core::filter::FilterSpec;
use fleetpulse_core::window::ComparisonWindow;

use crate::queries::{bind_instant, filter_clause};
use crate::DuckDbBackend;

/// Distinct-device total per window side, at filter granularity.
///
/// This is a dedicated query rather than a sum over the grouped rows: the
/// same device appears under several brand/feature combinations, so per-row
/// sums would double count it.
pub(crate) async fn fetch_population_total_inner(
    db: &DuckDbBackend,
    window: &ComparisonWindow,
    filter: &FilterSpec,
    counter: Counter,
) -> Result<PopulationTotal> {
    if counter != Counter::NewDevices {
        return Err(anyhow!(
            "{} is not tracked at filter granularity",
            counter.as_str()
        ));
    }

    let conn = db.conn.lock().await;
    let today = query_side(&conn, filter, &window.today_start, &window.today_end)?;
    let last_week = query_side(
        &conn,
        filter,
        &window.last_week_start,
        &window.last_week_end,
    )?;

    Ok(PopulationTotal {
        counter,
        value: MetricValue::from_windows(today, last_week),
    })
}

fn query_side(
    conn: &duckdb::Connection,
    filter: &FilterSpec,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<f64> {
    let mut params: Vec<Box<dyn duckdb::types::ToSql>> = Vec::new();
    params.push(Box::new(bind_instant(start)));
    params.push(Box::new(bind_instant(end)));
    let mut idx = 3;
    let filter_sql = filter_clause(filter, &mut idx, &mut params);

    let sql = format!(
        r#"
        SELECT CAST(COUNT(DISTINCT CASE WHEN new_device THEN device_id END) AS DOUBLE)
        FROM delivery_events
        WHERE occurred_at >= ?1
          AND occurred_at <= ?2
          {filter_sql}
        "#
    );

    let param_refs: Vec<&dyn duckdb::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let total: f64 = stmt.query_row(param_refs.as_slice(), |row| row.get(0))?;
    Ok(total)
}
