use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::api::middleware::session::AppState;
use crate::error::AppError;

/// Liveness check with a database round-trip
async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(json!({
        "status": "ok",
        "database": "connected",
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
