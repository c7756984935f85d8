use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::session::{AppState, SESSION_KEY_ADMIN, SESSION_KEY_CUSTOMER_ID};
use crate::error::AppError;
use crate::models::{Customer, VenueSettings};

#[derive(Deserialize)]
struct AdminLoginBody {
    password: String,
}

/// Admin login against the credential in the venue settings
async fn admin_login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AdminLoginBody>,
) -> Result<Json<Value>, AppError> {
    let settings = VenueSettings::load(&state.pool)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("venue settings row missing")))?;

    if settings.admin_password != body.password {
        return Err(AppError::Unauthorized);
    }

    session
        .insert(SESSION_KEY_ADMIN, true)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!("Admin logged in");

    Ok(Json(json!({ "success": true })))
}

async fn admin_logout(session: Session) -> Result<Json<Value>, AppError> {
    session
        .remove::<bool>(SESSION_KEY_ADMIN)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
struct CustomerLoginBody {
    phone: String,
    password: Option<String>,
}

/// Customer login by phone. A password is required only once the customer
/// has set one.
async fn customer_login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CustomerLoginBody>,
) -> Result<Json<Customer>, AppError> {
    if body.phone.trim().is_empty() {
        return Err(AppError::Validation("phone is required".to_string()));
    }

    let customer = Customer::find_by_phone(&state.pool, body.phone.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    if let Some(stored) = &customer.password {
        if body.password.as_deref() != Some(stored.as_str()) {
            return Err(AppError::Unauthorized);
        }
    }

    session
        .insert(SESSION_KEY_CUSTOMER_ID, customer.id)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(customer_id = %customer.id, "Customer logged in");

    Ok(Json(customer))
}

async fn customer_logout(session: Session) -> Result<Json<Value>, AppError> {
    session
        .remove::<Uuid>(SESSION_KEY_CUSTOMER_ID)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
struct SetPasswordBody {
    phone: String,
    password: String,
}

/// Lets a customer set their login password
async fn set_password(
    State(state): State<AppState>,
    Json(body): Json<SetPasswordBody>,
) -> Result<Json<Value>, AppError> {
    if body.password.len() < 4 {
        return Err(AppError::Validation(
            "password must be at least 4 characters".to_string(),
        ));
    }

    let updated = Customer::set_password(&state.pool, body.phone.trim(), &body.password).await?;
    if updated == 0 {
        return Err(AppError::CustomerNotFound);
    }

    Ok(Json(json!({ "success": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/login", post(admin_login))
        .route("/api/admin/logout", post(admin_logout))
        .route("/api/customer/login", post(customer_login))
        .route("/api/customer/logout", post(customer_logout))
        .route("/api/customer/password", post(set_password))
}
