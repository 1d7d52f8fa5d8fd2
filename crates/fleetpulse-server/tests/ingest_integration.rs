use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono_tz::Tz;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use fleetpulse_core::config::Config;
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
        demo_fallback: false,
    };
    let state = Arc::new(AppState::new(db, config, Tz::UTC));
    let app = build_app(Arc::clone(&state));
    (state, app)
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> axum::http::Response<Body> {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    app.clone().oneshot(req).await.expect("response")
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn payload(brand: &str) -> Value {
    json!({
        "brand": brand,
        "feature": "oobe",
        "source": "device",
        "device_id": "dev-1",
        "new_device": true,
        "revenue": 12.5,
        "installs": 2
    })
}

#[tokio::test]
async fn single_event_is_recorded() {
    let (state, app) = setup();
    let res = post_json(&app, "/api/ingest", payload("acme")).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body = json_body(res).await;
    assert_eq!(body["data"]["recorded"], 1);

    let conn = state.db.conn_for_test().await;
    let count: i64 = conn
        .prepare("SELECT COUNT(*) FROM delivery_events WHERE brand = 'acme'")
        .expect("prepare")
        .query_row([], |row| row.get(0))
        .expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn batch_is_recorded_in_one_call() {
    let (_state, app) = setup();
    let res = post_json(
        &app,
        "/api/ingest",
        json!([payload("acme"), payload("zephyr")]),
    )
    .await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body = json_body(res).await;
    assert_eq!(body["data"]["recorded"], 2);
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let (_state, app) = setup();
    let res = post_json(&app, "/api/ingest", json!([])).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_batch_is_rejected() {
    let (_state, app) = setup();
    let events: Vec<Value> = (0..501).map(|_| payload("acme")).collect();
    let res = post_json(&app, "/api/ingest", json!(events)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["error"]["code"], "batch_too_large");
}

#[tokio::test]
async fn unknown_source_tag_is_rejected() {
    let (_state, app) = setup();
    let mut bad = payload("acme");
    bad["source"] = json!("carrier");
    let res = post_json(&app, "/api/ingest", bad).await;
    // Serde rejects the unknown enum tag during extraction.
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn ingested_events_show_up_in_the_summary() {
    let (_state, app) = setup();
    post_json(&app, "/api/ingest", payload("acme")).await;

    let req = Request::builder()
        .uri("/api/report/summary?brands=acme&features=oobe")
        .body(Body::empty())
        .expect("request");
    let res = app.clone().oneshot(req).await.expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    let revenue = &body["data"]["rows"][0]["counters"]["revenue"];
    assert_eq!(revenue["today"], 12.5);
    assert!(revenue["pct_diff"].is_null());
}
