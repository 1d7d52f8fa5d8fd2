use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use chrono::Utc;

use fleetpulse_core::counter::Counter;
use fleetpulse_core::report::MetricRow;
use fleetpulse_core::window::Bucketing;

use crate::routes::report::{parse_filter, report_or_fallback, ReportQuery};
use crate::{error::AppError, state::AppState};

/// `GET /api/report/export` — download the daily summary rowset as CSV.
///
/// The same flat structure the summary endpoint serves, one column group per
/// counter. An undefined percentage exports as an empty cell, never 0.
/// Response: `Content-Type: text/csv` with `Content-Disposition: attachment`.
#[tracing::instrument(skip(state))]
pub async fn export_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let filter = parse_filter(&query)?;
    let combine = query.combine.unwrap_or(false) && filter.brands.len() > 1;

    let report = report_or_fallback(&state, &filter, Bucketing::Day).await?;
    let report = if combine { report.combined() } else { report };

    let csv_bytes =
        Bytes::from(build_csv(&report.rows).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?);
    let filename = format!(
        "fleetpulse-summary-{}.csv",
        Utc::now().format("%Y%m%d-%H%M")
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(csv_bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("response build failed: {e}")))
}

/// Sanitize a CSV field value against formula injection.
///
/// Spreadsheet apps (Excel, Google Sheets, LibreOffice) interpret values that
/// begin with `=`, `+`, `-`, `@`, TAB, or CR as formula expressions. Prepending
/// a single quote (`'`) causes them to treat the value as a literal string.
fn sanitize_csv_field(val: &str) -> std::borrow::Cow<'_, str> {
    if val.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        std::borrow::Cow::Owned(format!("'{val}"))
    } else {
        std::borrow::Cow::Borrowed(val)
    }
}

fn build_csv(rows: &[MetricRow]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::with_capacity(rows.len().saturating_mul(128)));

    let mut headers = vec!["brand".to_string(), "feature".to_string()];
    for counter in Counter::TABULAR {
        let name = counter.as_str();
        headers.push(format!("{name}_today"));
        headers.push(format!("{name}_last_week"));
        headers.push(format!("{name}_diff"));
        headers.push(format!("{name}_pct_diff"));
    }
    wtr.write_record(&headers)
        .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;

    for row in rows {
        let mut record = vec![
            sanitize_csv_field(&row.key.brand).into_owned(),
            sanitize_csv_field(&row.key.feature).into_owned(),
        ];
        for counter in Counter::TABULAR {
            let value = row.counters.get(&counter).copied().unwrap_or_else(|| {
                fleetpulse_core::counter::MetricValue::from_windows(0.0, 0.0)
            });
            record.push(format_amount(value.today, counter));
            record.push(format_amount(value.last_week, counter));
            record.push(format_amount(value.diff, counter));
            record.push(
                value
                    .pct_diff
                    .map(|pct| format!("{pct:.1}"))
                    .unwrap_or_default(),
            );
        }
        wtr.write_record(&record)
            .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))
}

fn format_amount(value: f64, counter: Counter) -> String {
    if counter.is_currency() {
        format!("{value:.2}")
    } else {
        format!("{value}")
    }
}
