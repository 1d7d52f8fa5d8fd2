use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use fleetpulse_core::counter::Counter;
use fleetpulse_core::filter::FilterSpec;
use fleetpulse_core::report::{RawRow, WindowRows};
use fleetpulse_core::source::Grouping;
use fleetpulse_core::window::ComparisonWindow;

use crate::queries::{bind_instant, filter_clause};
use crate::DuckDbBackend;

/// Aggregate the tabular counters into both window sides.
///
/// Each side is one grouped query over `[start, end]` (both bounds
/// inclusive: `today_end` is the still-advancing reference instant). For the
/// hourly grouping the query buckets by UTC hour and the bucket is converted
/// to hour-of-day in the reporting timezone here, once — the only place in
/// the system that conversion happens.
pub(crate) async fn fetch_aggregates_inner(
    db: &DuckDbBackend,
    window: &ComparisonWindow,
    filter: &FilterSpec,
    grouping: Grouping,
) -> Result<WindowRows> {
    let conn = db.conn.lock().await;
    let today = query_side(
        &conn,
        filter,
        grouping,
        db.timezone,
        &window.today_start,
        &window.today_end,
    )?;
    let last_week = query_side(
        &conn,
        filter,
        grouping,
        db.timezone,
        &window.last_week_start,
        &window.last_week_end,
    )?;
    Ok(WindowRows { today, last_week })
}

fn query_side(
    conn: &duckdb::Connection,
    filter: &FilterSpec,
    grouping: Grouping,
    tz: Tz,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<Vec<RawRow>> {
    let mut params: Vec<Box<dyn duckdb::types::ToSql>> = Vec::new();
    params.push(Box::new(bind_instant(start)));
    params.push(Box::new(bind_instant(end)));
    let mut idx = 3;
    let filter_sql = filter_clause(filter, &mut idx, &mut params);

    let (bucket_select, group_by) = match grouping {
        Grouping::BrandFeature => ("", "GROUP BY brand, feature"),
        Grouping::BrandFeatureHour => (
            ",\n            CAST(EPOCH(date_trunc('hour', occurred_at)) AS BIGINT) AS bucket",
            "GROUP BY brand, feature, bucket",
        ),
    };

    let sql = format!(
        r#"
        SELECT
            brand,
            feature,
            CAST(COALESCE(SUM(revenue), 0) AS DOUBLE) AS revenue,
            CAST(COALESCE(SUM(notifications_shown), 0) AS DOUBLE) AS notifications_shown,
            CAST(COALESCE(SUM(experiences_shown), 0) AS DOUBLE) AS experiences_shown,
            CAST(COALESCE(SUM(installs), 0) AS DOUBLE) AS installs{bucket_select}
        FROM delivery_events
        WHERE occurred_at >= ?1
          AND occurred_at <= ?2
          {filter_sql}
        {group_by}
        "#
    );

    let param_refs: Vec<&dyn duckdb::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(param_refs.as_slice(), |row| {
        let brand: String = row.get(0)?;
        let feature: String = row.get(1)?;
        let revenue: f64 = row.get(2)?;
        let notifications: f64 = row.get(3)?;
        let experiences: f64 = row.get(4)?;
        let installs: f64 = row.get(5)?;
        let bucket: Option<i64> = match grouping {
            Grouping::BrandFeature => None,
            Grouping::BrandFeatureHour => Some(row.get(6)?),
        };
        Ok((
            brand,
            feature,
            bucket,
            [revenue, notifications, experiences, installs],
        ))
    })?;

    // Re-accumulate per (brand, feature, local hour): across a DST fall-back
    // two UTC buckets can land on the same local hour.
    let mut grouped: BTreeMap<(String, String, Option<u32>), BTreeMap<Counter, f64>> =
        BTreeMap::new();
    for row in mapped {
        let (brand, feature, bucket, sums) = row?;
        let hour = bucket.map(|epoch| hour_of_bucket(epoch, tz));
        let slot = grouped.entry((brand, feature, hour)).or_default();
        for (counter, value) in Counter::TABULAR.iter().zip(sums) {
            *slot.entry(*counter).or_insert(0.0) += value;
        }
    }

    Ok(grouped
        .into_iter()
        .map(|((brand, feature, hour), counters)| RawRow {
            brand,
            feature,
            hour,
            counters,
        })
        .collect())
}

/// Hour-of-day of a UTC hour bucket (epoch seconds) in the reporting
/// timezone.
fn hour_of_bucket(epoch_secs: i64, tz: Tz) -> u32 {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .unwrap_or_default()
        .with_timezone(&tz)
        .hour()
}
