use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use fleetpulse_core::error::EngineError;
use fleetpulse_core::filter::{EventSource, FilterSpec};
use fleetpulse_core::insights::{derive_insights, InsightRules};
use fleetpulse_core::report::ComparisonReport;
use fleetpulse_core::window::Bucketing;

use crate::{error::AppError, fallback, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Comma-separated brand ids. Required (non-empty) — an empty selection
    /// is rejected, never widened to all brands.
    pub brands: Option<String>,
    /// Comma-separated feature ids. Required (non-empty).
    pub features: Option<String>,
    pub source: Option<String>,
    /// Collapse the selected brands into one synthetic row per remaining key.
    pub combine: Option<bool>,
}

pub(crate) fn parse_filter(query: &ReportQuery) -> Result<FilterSpec, AppError> {
    let split = |raw: &Option<String>| -> Vec<String> {
        raw.as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    let source = EventSource::parse(query.source.as_deref())
        .map_err(|e| AppError::InvalidFilter(e.to_string()))?;
    Ok(FilterSpec::new(
        split(&query.brands),
        split(&query.features),
        source,
    ))
}

/// Run the engine for `filter`, degrading to the placeholder dataset when the
/// source is down and the demo fallback is enabled. Placeholder reports are
/// never cached, so a recovered source wins on the next request.
pub(crate) async fn report_or_fallback(
    state: &AppState,
    filter: &FilterSpec,
    bucketing: Bucketing,
) -> Result<ComparisonReport, AppError> {
    match state.engine.report(filter, bucketing).await {
        Ok(report) => Ok(report),
        Err(EngineError::FetchUnavailable(err)) if state.config.demo_fallback => {
            tracing::warn!(error = %err, "Metrics source unavailable — serving placeholder dataset");
            Ok(fallback::placeholder_report(
                filter,
                bucketing,
                state.engine.timezone(),
            ))
        }
        Err(err) => Err(err.into()),
    }
}

async fn run_report(
    state: Arc<AppState>,
    query: ReportQuery,
    bucketing: Bucketing,
) -> Result<impl IntoResponse, AppError> {
    let filter = parse_filter(&query)?;
    // Combination is only meaningful across several brands; with one selected
    // brand the request is served as-is.
    let combine = query.combine.unwrap_or(false) && filter.brands.len() > 1;

    let report = report_or_fallback(&state, &filter, bucketing).await?;
    let report = if combine { report.combined() } else { report };

    Ok(Json(json!({
        "data": {
            "rows": report.rows,
            "population": report.population,
        },
        "meta": {
            "origin": report.origin,
            "bucketing": report.bucketing,
            "window": report.window,
            "combined": combine,
        }
    })))
}

/// `GET /api/report/summary` — today vs. last week per (brand, feature).
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    run_report(state, query, Bucketing::Day).await
}

/// `GET /api/report/hourly` — the same comparison per (brand, feature, hour).
pub async fn hourly(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    run_report(state, query, Bucketing::Hour).await
}

/// `GET /api/report/insights` — threshold-rule observations over the daily
/// summary rowset.
pub async fn insights(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = parse_filter(&query)?;
    let combine = query.combine.unwrap_or(false) && filter.brands.len() > 1;

    let report = report_or_fallback(&state, &filter, Bucketing::Day).await?;
    let report = if combine { report.combined() } else { report };

    let insights = derive_insights(
        &report.rows,
        report.population.as_ref(),
        &InsightRules::default(),
    );

    Ok(Json(json!({
        "data": { "insights": insights },
        "meta": {
            "origin": report.origin,
            "window": report.window,
            "combined": combine,
        }
    })))
}
