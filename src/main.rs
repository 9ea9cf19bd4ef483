//! pitchside — football schedule and highlights backend.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! connects to Postgres and applies migrations, starts the periodic
//! ingest loop, and serves the frontend API plus the upstream proxy.

use anyhow::{Context, Result};
use secrecy::Secret;
use std::sync::Arc;
use tracing::info;

use pitchside::api;
use pitchside::api::routes::AppContext;
use pitchside::config::AppConfig;
use pitchside::proxy::{self, ProxyState};
use pitchside::store;
use pitchside::sync::Syncer;
use pitchside::upstream::api_football::ApiFootballClient;
use pitchside::upstream::SportsApi;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;
    init_logging();

    info!(
        port = cfg.server.port,
        upstream = %cfg.upstream.base_url,
        sync_enabled = cfg.sync.enabled,
        tracked_leagues = cfg.leagues.tracked.len(),
        "pitchside starting up"
    );

    // -- Secrets ---------------------------------------------------------

    let api_key = Secret::new(AppConfig::resolve_env(&cfg.upstream.api_key_env)?);
    let database_url = AppConfig::resolve_env(&cfg.database.url_env)?;

    // -- Storage ---------------------------------------------------------

    let pool = store::connect(&database_url, cfg.database.max_connections).await?;
    store::migrate(&pool).await?;

    // -- Upstream client and routers -------------------------------------

    let sports_api: Arc<dyn SportsApi> = Arc::new(ApiFootballClient::new(
        &cfg.upstream.base_url,
        api_key.clone(),
        cfg.upstream.timeout_secs,
    )?);

    let proxy_state = Arc::new(ProxyState::new(&cfg.upstream, api_key)?);

    let api_state = Arc::new(AppContext {
        pool: pool.clone(),
        window_days: cfg.sync.window_days,
        default_season: cfg.leagues.season,
    });

    let app = api::build_router(api_state, &cfg.server.cors_allow_origin)
        .merge(proxy::router(proxy_state));

    // -- Background ingest ------------------------------------------------

    if cfg.sync.enabled {
        let syncer = Syncer::new(
            sports_api,
            pool.clone(),
            cfg.sync.clone(),
            cfg.leagues.clone(),
        );
        tokio::spawn(syncer.run());
    } else {
        info!("Sync disabled by config — serving stored data only");
    }

    // -- Serve -------------------------------------------------------------

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {}", cfg.server.port))?;

    info!(port = cfg.server.port, "Listening on http://localhost:{}", cfg.server.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received.");
        })
        .await
        .context("Server error")?;

    info!("pitchside shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pitchside=info"));

    let json_logging = std::env::var("PITCHSIDE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
