use tower_sessions::Session;
use uuid::Uuid;

use super::session::{SESSION_KEY_ADMIN, SESSION_KEY_CUSTOMER_ID};
use crate::error::AppError;

/// Capability value proving the caller is the venue admin. Handlers pass
/// it (or its name) into core calls; the core never reads session state.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub name: String,
}

/// Capability value proving the caller is a logged-in customer.
#[derive(Debug, Clone)]
pub struct CustomerIdentity {
    pub customer_id: Uuid,
}

/// Resolves the session into an admin identity, or rejects the call
pub async fn require_admin(session: &Session) -> Result<AdminIdentity, AppError> {
    let is_admin: Option<bool> = session
        .get(SESSION_KEY_ADMIN)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if is_admin.unwrap_or(false) {
        Ok(AdminIdentity {
            name: "admin".to_string(),
        })
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Resolves the session into a customer identity, or rejects the call
pub async fn require_customer(session: &Session) -> Result<CustomerIdentity, AppError> {
    let customer_id: Option<Uuid> = session
        .get(SESSION_KEY_CUSTOMER_ID)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    customer_id
        .map(|customer_id| CustomerIdentity { customer_id })
        .ok_or(AppError::Unauthorized)
}
