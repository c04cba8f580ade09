//! # API Module
//!
//! Small HTTP side channel next to the line-protocol server, built on
//! [Axum](https://docs.rs/axum). It is only started when `HEALTH_ADDRESS` is
//! configured.
//!
//! ## Endpoints
//!
//! - `GET /health` - status, version, active strategy and connection counters
//!   for monitoring systems.
//! - `PUT /strategy` - switches the active recommendation strategy, e.g.
//!   `{"strategy": "audio"}`. Unknown names are answered with 400.

mod health;
mod strategy;

use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Extension, Router,
    routing::{get, put},
};
use tokio_util::sync::CancellationToken;

pub use health::health;
pub use strategy::{StrategyChange, set_strategy};

use crate::{Res, info, recommend::RecommendationEngine, server::ServerStats};

/// State shared with the handlers.
pub struct ApiState {
    pub engine: Arc<RecommendationEngine>,
    pub stats: Arc<ServerStats>,
    pub pool_size: usize,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/strategy", put(set_strategy))
        .layer(Extension(state))
}

/// Serves the API on `address` until `shutdown` is cancelled.
pub async fn start_api_server(
    address: &str,
    state: Arc<ApiState>,
    shutdown: CancellationToken,
) -> Res<()> {
    let addr = SocketAddr::from_str(address)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Health endpoint listening on http://{}/health", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
