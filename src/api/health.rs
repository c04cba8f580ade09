use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::api::ApiState;

pub async fn health(Extension(state): Extension<Arc<ApiState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "strategy": state.engine.strategy_name(),
        "activeConnections": state.stats.active_connections(),
        "servedConnections": state.stats.served_connections(),
        "rejectedConnections": state.stats.rejected_connections(),
        "workers": state.stats.workers,
    }))
}
