//! Track Recommendation Server Library
//!
//! Lets many concurrent clients search the Spotify catalog and ask for track
//! recommendations derived from a seed track. Clients speak newline-delimited
//! JSON over TCP; recommendations come from one of several interchangeable
//! scoring strategies.
//!
//! # Modules
//!
//! - `api` - HTTP health and admin endpoints next to the line server
//! - `cli` - Command implementations (serve, console client)
//! - `config` - Configuration management and environment variables
//! - `error` - Catalog, authentication and configuration errors
//! - `management` - Access token lifecycle
//! - `recommend` - Recommendation strategies and the engine
//! - `server` - Line-protocol server, connection handling and wire envelopes
//! - `spotify` - Spotify Web API catalog client
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tunerec::{recommend::{RecommendationEngine, StrategyKind}, spotify::{CatalogClient, CatalogConfig}};
//!
//! #[tokio::main]
//! async fn main() -> tunerec::Res<()> {
//!     let client = Arc::new(CatalogClient::new(CatalogConfig::default())?);
//!     let engine = RecommendationEngine::new(StrategyKind::Popularity.build(50), client);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod recommend;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Uses a boxed dynamic error trait object with `Send + Sync` bounds so it can
/// cross task boundaries.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational line with a blue bullet and the local time.
///
/// Used for server progress such as accepted connections, requests and token
/// refreshes.
///
/// # Example
///
/// ```
/// info!("[client {}] connected from {}", id, peer);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!(
      "{} [{}] {}",
      chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
      "o".blue().bold(),
      std::format_args!($($arg)*)
    );
  })
}

/// Prints a success line with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Authenticated with Spotify API");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!(
      "{} [{}] {}",
      chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
      "✓".green().bold(),
      std::format_args!($($arg)*)
    );
  })
}

/// Prints an error line with a red exclamation mark and exits with code 1.
///
/// Only for failures the process cannot recover from, such as invalid
/// configuration at startup. Request-level failures never reach this macro;
/// they are answered with an error envelope instead.
///
/// # Example
///
/// ```
/// error!("Cannot bind {}. Err: {}", address, e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning line with a yellow exclamation mark and the local time.
///
/// Used for recoverable trouble: rejected requests, catalog retries,
/// saturated worker pool, connection errors.
///
/// # Example
///
/// ```
/// warning!("Catalog request failed, retry {}/{}", attempt, max);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!(
      "{} [{}] {}",
      chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
      "!".yellow().bold(),
      std::format_args!($($arg)*)
    );
  })
}
