//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the upstream API key, the database URL) are referenced by
//! env-var name in the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub leagues: LeaguesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Origin passed to the CORS layer. "*" during local development.
    pub cors_allow_origin: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the third-party football-data API.
    pub base_url: String,
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Name of the env var holding the Postgres connection URL.
    pub url_env: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Upper bound on the offset added to each interval tick.
    #[serde(default)]
    pub jitter_secs: u64,
    /// Length of the schedule window fetched per cycle.
    pub window_days: u32,
    /// Fixture detail fetches per chunk.
    pub batch_size: usize,
    /// Sleep between chunks, to stay under the upstream rate limit.
    pub batch_delay_ms: u64,
    /// How many recent highlights to pull per cycle.
    pub highlight_limit: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeaguesConfig {
    /// Upstream league ids we ingest standings and fixtures for.
    pub tracked: Vec<i64>,
    pub season: i32,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
