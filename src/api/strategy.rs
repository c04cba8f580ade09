use std::sync::Arc;

use axum::{Extension, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{api::ApiState, recommend::StrategyKind};

#[derive(Debug, Deserialize)]
pub struct StrategyChange {
    pub strategy: String,
}

/// Swaps the engine's active strategy. Calls already running keep the
/// strategy they started with.
pub async fn set_strategy(
    Extension(state): Extension<Arc<ApiState>>,
    Json(change): Json<StrategyChange>,
) -> (StatusCode, Json<Value>) {
    match change.strategy.parse::<StrategyKind>() {
        Ok(kind) => {
            state.engine.set_strategy(kind.build(state.pool_size));
            (
                StatusCode::OK,
                Json(json!({ "strategy": kind.display_name() })),
            )
        }
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e }))),
    }
}
