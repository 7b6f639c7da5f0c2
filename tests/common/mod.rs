// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use mindmap_server::{
    db,
    preview::{LinkPreviewResolver, ResolverOptions},
    routes,
    state::AppState,
};

/// Fresh in-memory database with migrations applied.
///
/// Every call gets its own database, so tests never see each other's rows.
pub async fn test_pool() -> SqlitePool {
    let pool = db::create_memory_pool()
        .await
        .expect("Failed to open in-memory database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Resolver with production limits but a short deadline.
pub fn test_resolver() -> LinkPreviewResolver {
    resolver_with(ResolverOptions {
        timeout: Duration::from_secs(2),
        ..ResolverOptions::default()
    })
}

pub fn resolver_with(options: ResolverOptions) -> LinkPreviewResolver {
    LinkPreviewResolver::new(options).expect("Failed to build resolver")
}

/// Build the full application router wired to a test database pool.
pub fn create_test_app(pool: SqlitePool) -> Router {
    routes::router(AppState {
        pool,
        preview: test_resolver(),
    })
}

/// Percent-encode a URL for use as a query parameter value.
pub fn encode_query(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_json(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_json(app, Method::PUT, uri, body).await
}

pub async fn patch_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send_json(app, Method::PATCH, uri, body).await
}

pub async fn delete(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

async fn send_json(app: Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ── Scenario helpers ─────────────────────────────────────────────────────────

/// Create a mind map and return the full response body.
pub async fn create_mindmap(app: Router, body: Value) -> Value {
    let (status, body) = post_json(app, "/api/mindmaps", body).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "setup create_mindmap failed: {body}"
    );
    body
}
