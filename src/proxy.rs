//! Upstream API proxy.
//!
//! `GET /proxy/{path}?{query}` forwards to `{base_url}/{path}?{query}`
//! with the API key header attached, and relays the upstream status
//! code and JSON body to the client verbatim. The browser never sees
//! the key. Only a fixed allowlist of upstream path prefixes is
//! forwarded; anything else is a 404.

use anyhow::{Context, Result};
use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::ApiError;
use crate::upstream::api_football::API_KEY_HEADER;

/// Upstream path prefixes the proxy will forward.
const ALLOWED_PREFIXES: &[&str] = &["fixtures", "standings", "leagues", "teams", "highlights"];

/// Shared state for the proxy routes.
pub struct ProxyState {
    http: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl ProxyState {
    pub fn new(cfg: &UpstreamConfig, api_key: Secret<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .user_agent("pitchside/0.1.0")
            .build()
            .context("Failed to build proxy HTTP client")?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// Build the proxy sub-router.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/proxy/*path", get(forward))
        .with_state(state)
}

/// Whether the first path segment is on the allowlist.
fn is_allowed(path: &str) -> bool {
    let first = path.split('/').next().unwrap_or("");
    ALLOWED_PREFIXES.contains(&first)
}

/// Join base, path, and the raw query string into the upstream URL.
fn target_url(base_url: &str, path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{base_url}/{path}?{q}"),
        _ => format!("{base_url}/{path}"),
    }
}

/// The pass-through handler.
async fn forward(
    State(state): State<Arc<ProxyState>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    if !is_allowed(&path) {
        return Err(ApiError::NotFound);
    }

    let url = target_url(&state.base_url, &path, query.as_deref());
    debug!(url = %url, "Proxying upstream request");

    let upstream = state
        .http
        .get(&url)
        .header(API_KEY_HEADER, state.api_key.expose_secret())
        .send()
        .await?;

    // Relay whatever the upstream said, success or not.
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = upstream.bytes().await?;

    Ok((
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowlist_accepts_known_prefixes() {
        assert!(is_allowed("fixtures"));
        assert!(is_allowed("fixtures/events"));
        assert!(is_allowed("standings"));
        assert!(is_allowed("highlights"));
    }

    #[test]
    fn test_allowlist_rejects_unknown_paths() {
        assert!(!is_allowed("admin"));
        assert!(!is_allowed(""));
        assert!(!is_allowed("odds/live"));
    }

    #[test]
    fn test_target_url_with_query() {
        assert_eq!(
            target_url("https://api.example.com", "fixtures", Some("date=2026-03-07")),
            "https://api.example.com/fixtures?date=2026-03-07"
        );
    }

    #[test]
    fn test_target_url_without_query() {
        assert_eq!(
            target_url("https://api.example.com", "fixtures/events", None),
            "https://api.example.com/fixtures/events"
        );
        assert_eq!(
            target_url("https://api.example.com", "leagues", Some("")),
            "https://api.example.com/leagues"
        );
    }
}
