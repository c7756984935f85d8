use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::check_in_tracker::CheckInError;
use crate::services::ledger::LedgerError;
use crate::services::redemption::RedemptionError;

/// Application-level errors. Business-rule violations are expected,
/// recoverable-by-caller conditions; storage failures pass through
/// unchanged.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("point amount must be positive")]
    InvalidAmount,

    #[error("quantity must be positive")]
    InvalidQuantity,

    #[error("product not found")]
    ProductNotFound,

    #[error("customer already checked in on this day")]
    DuplicateCheckIn,

    #[error("redemption request not found")]
    RequestNotFound,

    #[error("redemption request already decided")]
    AlreadyDecided,

    #[error("customer not found")]
    CustomerNotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount => AppError::InvalidAmount,
            LedgerError::CustomerNotFound => AppError::CustomerNotFound,
            LedgerError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<CheckInError> for AppError {
    fn from(err: CheckInError) -> Self {
        match err {
            CheckInError::CustomerNotFound => AppError::CustomerNotFound,
            CheckInError::DuplicateCheckIn => AppError::DuplicateCheckIn,
            CheckInError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<RedemptionError> for AppError {
    fn from(err: RedemptionError) -> Self {
        match err {
            RedemptionError::ProductNotFound => AppError::ProductNotFound,
            RedemptionError::CustomerNotFound => AppError::CustomerNotFound,
            RedemptionError::InvalidQuantity => AppError::InvalidQuantity,
            RedemptionError::RequestNotFound => AppError::RequestNotFound,
            RedemptionError::AlreadyDecided => AppError::AlreadyDecided,
            RedemptionError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let status = match self {
            AppError::InvalidAmount | AppError::InvalidQuantity | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::ProductNotFound
            | AppError::RequestNotFound
            | AppError::CustomerNotFound => StatusCode::NOT_FOUND,
            AppError::DuplicateCheckIn | AppError::AlreadyDecided => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Do not leak storage details to clients
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            message
        };

        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_failures_map_to_client_errors() {
        let cases = [
            (AppError::InvalidAmount, StatusCode::BAD_REQUEST),
            (AppError::InvalidQuantity, StatusCode::BAD_REQUEST),
            (AppError::ProductNotFound, StatusCode::NOT_FOUND),
            (AppError::CustomerNotFound, StatusCode::NOT_FOUND),
            (AppError::RequestNotFound, StatusCode::NOT_FOUND),
            (AppError::DuplicateCheckIn, StatusCode::CONFLICT),
            (AppError::AlreadyDecided, StatusCode::CONFLICT),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn service_errors_convert_to_their_app_kind() {
        assert!(matches!(
            AppError::from(LedgerError::InvalidAmount),
            AppError::InvalidAmount
        ));
        assert!(matches!(
            AppError::from(CheckInError::DuplicateCheckIn),
            AppError::DuplicateCheckIn
        ));
        assert!(matches!(
            AppError::from(RedemptionError::AlreadyDecided),
            AppError::AlreadyDecided
        ));
    }
}
