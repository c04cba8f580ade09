//! Configuration management for the recommendation server.
//!
//! Values are read from environment variables, optionally seeded from a `.env`
//! file in the local data directory. The configuration system follows a
//! hierarchical approach:
//! 1. Command-line flags (for the few settings `serve` exposes)
//! 2. Environment variables
//! 3. `.env` file in the local data directory
//! 4. Application defaults

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    error::ConfigError, recommend::StrategyKind, server::ServerOptions, spotify::CatalogConfig,
};

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:5050";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory structure if it doesn't exist. A missing `.env` file is
/// not an error: every setting can also come from the process environment.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/tunerec/.env`
/// - macOS: `~/Library/Application Support/tunerec/.env`
/// - Windows: `%LOCALAPPDATA%/tunerec/.env`
///
/// # Errors
///
/// Returns an error string if the directory cannot be created or an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = env_file_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

pub fn env_file_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("tunerec/.env");
    path
}

/// Everything the `serve` command needs, resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog: CatalogConfig,
    pub server: ServerOptions,
    pub strategy: StrategyKind,
    pub health_address: Option<String>,
}

impl Settings {
    /// Resolves all settings. Credentials are required; everything else falls
    /// back to a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let catalog = CatalogConfig {
            client_id: required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            client_secret: required("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
            token_url: spotify_apitoken_url(),
            api_url: spotify_apiurl(),
            market: or_default("SPOTIFY_MARKET", "US"),
            timeout: Duration::from_secs(parsed("HTTP_TIMEOUT_SECS", 10)?),
            max_retries: parsed("HTTP_MAX_RETRIES", 3)?,
            ..CatalogConfig::default()
        };

        let server = ServerOptions {
            address: server_addr(),
            workers: positive("SERVER_WORKERS", 10)?,
            queue: parsed("SERVER_QUEUE", 32)?,
            pool_size: positive("TRACK_POOL_SIZE", 50)?,
            default_search_limit: parsed("DEFAULT_SEARCH_LIMIT", 20)?,
            default_count: parsed("DEFAULT_RECOMMENDATIONS", 10)?,
            idle_timeout: Duration::from_secs(parsed("IDLE_TIMEOUT_SECS", 300)?),
            shutdown_grace: Duration::from_secs(parsed("SHUTDOWN_GRACE_SECS", 5)?),
        };

        Ok(Self {
            catalog,
            server,
            strategy: parsed("RECOMMENDATION_STRATEGY", StrategyKind::Popularity)?,
            health_address: optional("HEALTH_ADDRESS"),
        })
    }
}

/// Returns the address the request server binds to and the line client
/// connects to. Defaults to `127.0.0.1:5050`.
pub fn server_addr() -> String {
    or_default("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Returns the Spotify OAuth token exchange URL.
pub fn spotify_apitoken_url() -> String {
    or_default("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Returns the Spotify Web API base URL.
pub fn spotify_apiurl() -> String {
    or_default("SPOTIFY_API_URL", DEFAULT_API_URL)
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing(var))
}

fn or_default(var: &'static str, default: &str) -> String {
    optional(var).unwrap_or_else(|| default.to_string())
}

fn parsed<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(var) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn positive(var: &'static str, default: usize) -> Result<usize, ConfigError> {
    let value = parsed(var, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
