//! Proxy pass-through behaviour against a local stub upstream.
//!
//! Spins up a throwaway Axum server standing in for the sports API and
//! asserts the proxy forwards the query string and API key header, and
//! relays the upstream status code.

use axum::body::Body;
use axum::extract::RawQuery;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use pitchside::config::UpstreamConfig;
use pitchside::proxy::{self, ProxyState};

const TEST_KEY: &str = "test-key-123";

/// Start a stub upstream on an ephemeral port; returns its base URL.
async fn spawn_stub() -> String {
    let app = Router::new()
        .route(
            "/fixtures",
            get(|headers: HeaderMap, RawQuery(query): RawQuery| async move {
                let key = headers
                    .get("x-apisports-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({ "seen_key": key, "seen_query": query.unwrap_or_default() }))
            }),
        )
        .route(
            "/standings",
            get(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "errors": "rate limit reached" })),
                )
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn proxy_router(base_url: &str) -> Router {
    let cfg = UpstreamConfig {
        base_url: base_url.to_string(),
        api_key_env: "UNUSED".to_string(),
        timeout_secs: 5,
    };
    let state = ProxyState::new(&cfg, Secret::new(TEST_KEY.to_string())).unwrap();
    proxy::router(Arc::new(state))
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_forwards_key_header_and_query() {
    let base = spawn_stub().await;
    let app = proxy_router(&base);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/proxy/fixtures?date=2026-03-07&league=39")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["seen_key"], TEST_KEY);
    assert_eq!(json["seen_query"], "date=2026-03-07&league=39");
}

#[tokio::test]
async fn test_relays_upstream_status_code() {
    let base = spawn_stub().await;
    let app = proxy_router(&base);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/proxy/standings?league=39&season=2025")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(resp).await;
    assert_eq!(json["errors"], "rate limit reached");
}

#[tokio::test]
async fn test_unknown_prefix_rejected_without_upstream_call() {
    // Base URL points nowhere; the allowlist must reject before dialing.
    let app = proxy_router("http://127.0.0.1:9");

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/proxy/admin/drop-tables")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let app = proxy_router("http://127.0.0.1:9");

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/proxy/fixtures?date=2026-03-07")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}
