use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{auth::require_admin, session::AppState};
use crate::error::AppError;
use crate::models::customer::RankedCustomer;
use crate::models::{Customer, LedgerEntry, Tier, VenueSettings};
use crate::services::ledger;

const RANKING_SIZE: i64 = 10;

#[derive(Deserialize)]
struct CreditBody {
    customer_id: Uuid,
    points: i32,
    description: Option<String>,
}

/// Credits purchase points to a customer (admin)
async fn credit_points(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreditBody>,
) -> Result<Json<Value>, AppError> {
    require_admin(&session).await?;

    let thresholds = VenueSettings::load_thresholds(&state.pool).await?;
    let description = body.description.unwrap_or_default();

    let outcome = ledger::credit_points(
        &state.pool,
        body.customer_id,
        body.points,
        &description,
        &thresholds,
        Utc::now(),
    )
    .await?;

    Ok(Json(json!({
        "points_total": outcome.points_total,
        "tier": outcome.tier,
        "bonus_points": outcome.bonus_points,
        "days_visited": outcome.days_visited,
    })))
}

/// Top customers by balance, public
async fn ranking(State(state): State<AppState>) -> Result<Json<Vec<RankedCustomer>>, AppError> {
    let ranking = Customer::ranking(&state.pool, RANKING_SIZE).await?;
    Ok(Json(ranking))
}

/// Program statistics for the admin dashboard
async fn statistics(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Value>, AppError> {
    require_admin(&session).await?;

    let total_customers = Customer::count(&state.pool).await?;
    let green = Customer::count_by_tier(&state.pool, Tier::Green).await?;
    let yellow = Customer::count_by_tier(&state.pool, Tier::Yellow).await?;
    let red = Customer::count_by_tier(&state.pool, Tier::Red).await?;
    let points_issued = LedgerEntry::total_issued(&state.pool).await?;

    Ok(Json(json!({
        "total_customers": total_customers,
        "customers_green": green,
        "customers_yellow": yellow,
        "customers_red": red,
        "points_issued": points_issued,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/points", post(credit_points))
        .route("/api/ranking", get(ranking))
        .route("/api/statistics", get(statistics))
}
