use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::api::middleware::{auth::require_customer, session::AppState};
use crate::error::AppError;
use crate::models::CheckIn;
use crate::services::check_in_tracker;

const RECENT_CHECK_INS: i64 = 30;

#[derive(Deserialize, Default)]
struct CheckInBody {
    location: Option<String>,
}

/// Records today's check-in for the logged-in customer
async fn check_in(
    State(state): State<AppState>,
    session: Session,
    body: Option<Json<CheckInBody>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let customer = require_customer(&session).await?;
    let Json(body) = body.unwrap_or_default();

    let location = body
        .location
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let outcome =
        check_in_tracker::check_in(&state.pool, customer.customer_id, Utc::now(), location).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "check_in": outcome.check_in,
            "days_visited": outcome.days_visited,
            "reachable_bonus": outcome.reachable_bonus,
            "newly_reachable": outcome.newly_reachable,
        })),
    ))
}

/// The customer's recent check-ins
async fn list_check_ins(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<CheckIn>>, AppError> {
    let customer = require_customer(&session).await?;

    let check_ins =
        CheckIn::list_recent(&state.pool, customer.customer_id, RECENT_CHECK_INS).await?;

    Ok(Json(check_ins))
}

/// Whether a check-in is still possible today, for UI gating
async fn can_check_in_today(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Value>, AppError> {
    let customer = require_customer(&session).await?;

    let can_check_in =
        check_in_tracker::can_check_in(&state.pool, customer.customer_id, Utc::now()).await?;

    Ok(Json(json!({ "can_check_in": can_check_in })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/check-ins", post(check_in).get(list_check_ins))
        .route("/api/check-ins/today", get(can_check_in_today))
}
