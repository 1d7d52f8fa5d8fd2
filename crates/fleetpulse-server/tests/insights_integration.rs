use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use chrono_tz::Tz;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use fleetpulse_core::config::Config;
use fleetpulse_core::event::DeliveryEvent;
use fleetpulse_core::filter::EventSource;
use fleetpulse_core::window::ComparisonWindow;
use fleetpulse_duckdb::DuckDbBackend;
use fleetpulse_server::app::build_app;
use fleetpulse_server::state::AppState;

fn setup() -> (Arc<AppState>, axum::Router) {
    let db = DuckDbBackend::open_in_memory(Tz::UTC).expect("in-memory DuckDB");
    let config = Config {
        port: 0,
        data_dir: "/tmp/fleetpulse-test".to_string(),
        timezone: "UTC".to_string(),
        cache_ttl_secs: 300,
        cors_origins: vec![],
        duckdb_memory_limit: "1GB".to_string(),
        demo_fallback: true,
    };
    let state = Arc::new(AppState::new(db, config, Tz::UTC));
    let app = build_app(Arc::clone(&state));
    (state, app)
}

fn event(feature: &str, revenue: f64, installs: i64, last_week: bool) -> DeliveryEvent {
    let window = ComparisonWindow::for_reference(Utc::now(), Tz::UTC);
    let mut occurred_at = window.today_start + (window.today_end - window.today_start) / 2;
    if last_week {
        occurred_at -= Duration::days(7);
    }
    DeliveryEvent {
        id: uuid::Uuid::new_v4().to_string(),
        brand: "acme".to_string(),
        feature: feature.to_string(),
        source: EventSource::Device,
        device_id: None,
        new_device: false,
        revenue,
        notifications_shown: 0,
        experiences_shown: 0,
        installs,
        occurred_at,
    }
}

async fn get_insights(app: &axum::Router) -> Value {
    let req = Request::builder()
        .uri("/api/report/insights?brands=acme&features=oobe,gotw")
        .body(Body::empty())
        .expect("request");
    let res = app.clone().oneshot(req).await.expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

#[tokio::test]
async fn surges_and_new_activity_are_flagged() {
    let (state, app) = setup();
    state
        .db
        .record_events(&[
            // oobe revenue: 180 vs 100 — an 80% surge.
            event("oobe", 180.0, 0, false),
            event("oobe", 100.0, 0, true),
            // gotw: activity with no baseline at all.
            event("gotw", 40.0, 2, false),
        ])
        .await
        .expect("seed");

    let body = get_insights(&app).await;
    let insights = body["data"]["insights"].as_array().expect("insights");
    let kinds: Vec<&str> = insights
        .iter()
        .filter_map(|i| i["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"surge"));
    assert!(kinds.contains(&"new_activity"));

    let surge = insights
        .iter()
        .find(|i| i["kind"] == "surge")
        .expect("surge insight");
    assert_eq!(surge["counter"], "revenue");
    assert_eq!(surge["brand"], "acme");
    assert_eq!(surge["pct_diff"], 80.0);
}

#[tokio::test]
async fn steady_counters_produce_no_insights() {
    let (state, app) = setup();
    state
        .db
        .record_events(&[
            event("oobe", 105.0, 0, false),
            event("oobe", 100.0, 0, true),
        ])
        .await
        .expect("seed");

    let body = get_insights(&app).await;
    let insights = body["data"]["insights"].as_array().expect("insights");
    assert!(insights.is_empty());
}
