use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{
    auth::{require_admin, require_customer},
    session::AppState,
};
use crate::error::AppError;
use crate::models::redemption_request::RedemptionRequestDetails;
use crate::models::{RedemptionRequest, RedemptionStatus, VenueSettings};
use crate::services::redemption;

#[derive(Deserialize)]
struct SubmitBody {
    product_id: Uuid,
    #[serde(default = "default_quantity")]
    quantity: i32,
    note: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// Files a redemption request for the logged-in customer
async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<RedemptionRequest>), AppError> {
    let customer = require_customer(&session).await?;

    let request = redemption::submit(
        &state.pool,
        customer.customer_id,
        body.product_id,
        body.quantity,
        body.note,
        Utc::now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Deserialize)]
struct ListQuery {
    status: Option<String>,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<RedemptionStatus>, AppError> {
    match raw.unwrap_or("pending") {
        "all" => Ok(None),
        "pending" => Ok(Some(RedemptionStatus::Pending)),
        "approved" => Ok(Some(RedemptionStatus::Approved)),
        "rejected" => Ok(Some(RedemptionStatus::Rejected)),
        other => Err(AppError::Validation(format!(
            "unknown status filter: {other}"
        ))),
    }
}

/// Admin listing, filtered by status (`pending` by default, `all` for
/// everything)
async fn list_requests(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RedemptionRequestDetails>>, AppError> {
    require_admin(&session).await?;

    let status = parse_status_filter(query.status.as_deref())?;
    let requests = RedemptionRequest::list_details(&state.pool, status).await?;

    Ok(Json(requests))
}

/// The logged-in customer's own requests
async fn list_my_requests(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<RedemptionRequestDetails>>, AppError> {
    let customer = require_customer(&session).await?;

    let requests = RedemptionRequest::list_by_customer(&state.pool, customer.customer_id).await?;
    Ok(Json(requests))
}

#[derive(Deserialize)]
struct DecideBody {
    approve: bool,
}

/// Approves or rejects a pending request (admin)
async fn decide(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(body): Json<DecideBody>,
) -> Result<Json<Value>, AppError> {
    let admin = require_admin(&session).await?;

    let thresholds = VenueSettings::load_thresholds(&state.pool).await?;
    let outcome = redemption::decide(
        &state.pool,
        id,
        body.approve,
        &admin.name,
        &thresholds,
        Utc::now(),
    )
    .await?;

    Ok(Json(json!({
        "request": outcome.request,
        "credit": outcome.credit.map(|c| json!({
            "points": c.points,
            "points_total": c.points_total,
            "tier": c.tier,
            "bonus_points": c.bonus_points,
        })),
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/redemptions", get(list_requests).post(submit))
        .route("/api/redemptions/mine", get(list_my_requests))
        .route("/api/redemptions/:id/decide", post(decide))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_defaults_to_pending() {
        assert_eq!(
            parse_status_filter(None).unwrap(),
            Some(RedemptionStatus::Pending)
        );
    }

    #[test]
    fn status_filter_all_means_no_filter() {
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
    }

    #[test]
    fn status_filter_rejects_unknown_values() {
        assert!(parse_status_filter(Some("bogus")).is_err());
    }
}
