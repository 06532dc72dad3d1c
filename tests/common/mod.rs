//! Common test utilities and helpers

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rapport_core::{api::build_router, LibsqlStorage, Tracker};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Create a tracker backed by a fresh database file
///
/// libSQL's `:memory:` mode gives each connection its own database, so tests
/// use a temporary file instead. Keep the `TempDir` alive for the test.
pub async fn create_test_tracker() -> (Tracker, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = LibsqlStorage::open_or_create(temp_dir.path().join("rapport.db"))
        .await
        .expect("Failed to create test storage");
    (Tracker::new(Arc::new(storage)), temp_dir)
}

/// Router plus the tracker behind it
pub async fn create_test_app() -> (Router, Tracker, TempDir) {
    let (tracker, dir) = create_test_tracker().await;
    (build_router(tracker.clone()), tracker, dir)
}

/// Send a request through the router and decode the JSON body (Null if empty)
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
