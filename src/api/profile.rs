use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{auth::require_customer, session::AppState};
use crate::error::AppError;
use crate::models::{LedgerEntry, Thresholds, Tier, VenueSettings};
use crate::services::{frequency, tier};

/// Merged customer view: live balances, bonus standing, tier and history.
#[derive(Serialize)]
struct ProfileResponse {
    id: Uuid,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    registered_at: DateTime<Utc>,
    last_visit: Option<DateTime<Utc>>,
    points_total: i32,
    expired_points: i32,
    tier: Tier,
    days_visited: i32,
    reachable_bonus: i32,
    thresholds: Thresholds,
    history: Vec<LedgerEntry>,
}

/// The logged-in customer's profile. Balances and tier are recomputed
/// from the ledger here rather than read from the cache, so the view is
/// exact even for points that expired since the last mutation.
async fn profile(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ProfileResponse>, AppError> {
    let identity = require_customer(&session).await?;
    let now = Utc::now();

    let customer = crate::models::Customer::find_by_id(&state.pool, identity.customer_id)
        .await?
        .ok_or(AppError::CustomerNotFound)?;

    let points_total = LedgerEntry::valid_total(&state.pool, customer.id, now).await?;
    let expired_points = LedgerEntry::expired_total(&state.pool, customer.id, now).await?;
    let standing = frequency::standing(&state.pool, customer.id, now).await?;
    let thresholds = VenueSettings::load_thresholds(&state.pool).await?;
    let history = LedgerEntry::list_by_customer(&state.pool, customer.id, None).await?;

    Ok(Json(ProfileResponse {
        id: customer.id,
        name: customer.name,
        phone: customer.phone,
        email: customer.email,
        registered_at: customer.registered_at,
        last_visit: customer.last_visit,
        points_total,
        expired_points,
        tier: tier::classify(points_total, &thresholds),
        days_visited: standing.days_visited,
        reachable_bonus: standing.bonus_level,
        thresholds,
        history,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/profile", get(profile))
}
