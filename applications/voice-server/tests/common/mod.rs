//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use voice_playback::PlaybackConfig;
use voice_server::{api, AppState, CatalogTrackSource, EngineSettings};

pub const CATALOG: &str = r#"
[[tracks]]
id = "rick"
title = "Never Gonna Give You Up"
source_url = "https://media.example/rick.opus"
duration_seconds = 213

[[tracks]]
id = "sandstorm"
title = "Sandstorm"
source_url = "https://media.example/sandstorm.opus"
duration_seconds = 225

[[tracks]]
id = "africa"
title = "Africa"
source_url = "https://media.example/africa.opus"
duration_seconds = 295
"#;

/// Router plus state for inspecting the simulated engine
pub fn create_test_app(auto_join: bool, playback: PlaybackConfig) -> (Router, AppState) {
    let catalog = CatalogTrackSource::from_toml_str(CATALOG).unwrap();
    let engine = EngineSettings {
        auto_join_sessions: auto_join,
        ..EngineSettings::default()
    };
    let state = AppState::new(Arc::new(catalog), &engine, playback);
    (api::router(state.clone()), state)
}

pub fn default_app() -> (Router, AppState) {
    create_test_app(true, PlaybackConfig::default())
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

pub async fn play(app: &Router, tenant: i64, query: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/tenants/{}/play", tenant),
        Some(serde_json::json!({ "query": query, "requested_by": "alice" })),
    )
    .await
}
