use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{auth::require_admin, session::AppState};
use crate::error::AppError;
use crate::models::customer::CreateCustomerData;
use crate::models::{Customer, LedgerEntry};

/// Ledger entries shown on the admin's customer detail view
const HISTORY_LIMIT: i64 = 20;

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Deserialize)]
struct CustomerBody {
    name: String,
    phone: Option<String>,
    email: Option<String>,
}

/// Registers a new customer. Open endpoint: customers sign themselves up.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<CustomerBody>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let customer = Customer::create(
        &state.pool,
        CreateCustomerData {
            name: body.name.trim().to_string(),
            phone: normalize(body.phone),
            email: normalize(body.email),
        },
    )
    .await?;

    tracing::info!(customer_id = %customer.id, "Registered customer");

    Ok((StatusCode::CREATED, Json(customer)))
}

async fn list_customers(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Customer>>, AppError> {
    require_admin(&session).await?;

    let customers = Customer::list(&state.pool).await?;
    Ok(Json(customers))
}

#[derive(Serialize)]
struct CustomerWithHistory {
    #[serde(flatten)]
    customer: Customer,
    history: Vec<LedgerEntry>,
}

async fn get_customer(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerWithHistory>, AppError> {
    require_admin(&session).await?;

    let customer = Customer::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::CustomerNotFound)?;

    let history = LedgerEntry::list_by_customer(&state.pool, id, Some(HISTORY_LIMIT)).await?;

    Ok(Json(CustomerWithHistory { customer, history }))
}

async fn update_customer(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(body): Json<CustomerBody>,
) -> Result<Json<Value>, AppError> {
    require_admin(&session).await?;

    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let updated = Customer::update_contact(
        &state.pool,
        id,
        body.name.trim(),
        normalize(body.phone),
        normalize(body.email),
    )
    .await?;

    if updated == 0 {
        return Err(AppError::CustomerNotFound);
    }

    Ok(Json(json!({ "success": true })))
}

/// Deletes a customer and, through the schema, their ledger entries,
/// check-ins and redemption requests.
async fn delete_customer(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&session).await?;

    let deleted = Customer::delete(&state.pool, id).await?;
    if deleted == 0 {
        return Err(AppError::CustomerNotFound);
    }

    tracing::info!(customer_id = %id, "Deleted customer");

    Ok(Json(json!({ "success": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(register))
        .route(
            "/api/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}
