use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::customer::{Customer, Tier};
use crate::models::ledger_entry::PointCategory;
use crate::models::product::Product;
use crate::models::redemption_request::{
    CreateRequestData, RedemptionRequest, RedemptionStatus,
};
use crate::models::venue_settings::Thresholds;
use crate::services::{frequency, ledger};

#[derive(Error, Debug)]
pub enum RedemptionError {
    #[error("product not found or inactive")]
    ProductNotFound,

    #[error("customer not found")]
    CustomerNotFound,

    #[error("quantity must be positive")]
    InvalidQuantity,

    #[error("redemption request not found")]
    RequestNotFound,

    #[error("redemption request already decided")]
    AlreadyDecided,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ledger::LedgerError> for RedemptionError {
    fn from(err: ledger::LedgerError) -> Self {
        match err {
            // Request totals are validated positive, so InvalidAmount cannot
            // come out of an approval credit.
            ledger::LedgerError::InvalidAmount => RedemptionError::InvalidQuantity,
            ledger::LedgerError::CustomerNotFound => RedemptionError::CustomerNotFound,
            ledger::LedgerError::Database(e) => RedemptionError::Database(e),
        }
    }
}

/// Total point cost of a request
pub fn points_total(product_points: i32, quantity: i32) -> i32 {
    product_points * quantity
}

/// Ledger effect of an approval.
#[derive(Debug, Clone)]
pub struct ApprovedCredit {
    pub points: i32,
    pub points_total: i32,
    pub tier: Tier,
    pub bonus_points: i32,
}

/// Outcome of a decision. `credit` is present only for approvals.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub request: RedemptionRequest,
    pub credit: Option<ApprovedCredit>,
}

/// Files a redemption request for admin review.
#[tracing::instrument(skip(pool, note))]
pub async fn submit(
    pool: &PgPool,
    customer_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<RedemptionRequest, RedemptionError> {
    if quantity <= 0 {
        return Err(RedemptionError::InvalidQuantity);
    }

    let product = Product::find_active_by_id(pool, product_id)
        .await?
        .ok_or(RedemptionError::ProductNotFound)?;

    Customer::find_by_id(pool, customer_id)
        .await?
        .ok_or(RedemptionError::CustomerNotFound)?;

    let request = RedemptionRequest::create(
        pool,
        CreateRequestData {
            customer_id,
            product_id,
            quantity,
            points_total: points_total(product.points, quantity),
            note,
            requested_at: now,
        },
    )
    .await?;

    tracing::info!(
        request_id = %request.id,
        customer_id = %customer_id,
        product = %product.name,
        points_total = request.points_total,
        "Redemption request submitted"
    );

    Ok(request)
}

/// Decides a pending request. The pending check and the transition are one
/// atomic check-and-set, so of two concurrent decisions exactly one wins
/// and the loser observes `AlreadyDecided`. On approval the ledger credit,
/// frequency-bonus application, and cache refresh commit together with the
/// transition or not at all.
#[tracing::instrument(skip(pool, thresholds))]
pub async fn decide(
    pool: &PgPool,
    request_id: Uuid,
    approve: bool,
    decided_by: &str,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Result<DecisionOutcome, RedemptionError> {
    let status = if approve {
        RedemptionStatus::Approved
    } else {
        RedemptionStatus::Rejected
    };

    let mut tx = pool.begin().await?;

    let Some(request) =
        RedemptionRequest::try_decide(&mut *tx, request_id, status, decided_by, now).await?
    else {
        return match RedemptionRequest::find_by_id(&mut *tx, request_id).await? {
            Some(_) => Err(RedemptionError::AlreadyDecided),
            None => Err(RedemptionError::RequestNotFound),
        };
    };

    if !approve {
        tx.commit().await?;

        tracing::info!(request_id = %request.id, decided_by, "Redemption request rejected");

        return Ok(DecisionOutcome {
            request,
            credit: None,
        });
    }

    let customer = Customer::find_by_id(&mut *tx, request.customer_id)
        .await?
        .ok_or(RedemptionError::CustomerNotFound)?;

    ledger::credit(
        &mut *tx,
        request.customer_id,
        request.points_total,
        PointCategory::Redemption,
        &format!("Product redeemed (request {})", request.id),
        now,
    )
    .await?;

    let grant = frequency::apply_bonus(&mut tx, request.customer_id, customer.bonus_level, now).await?;
    let (balance, tier) = ledger::refresh_customer(&mut tx, request.customer_id, thresholds, now).await?;

    tx.commit().await?;

    tracing::info!(
        request_id = %request.id,
        customer_id = %request.customer_id,
        points = request.points_total,
        bonus_points = grant.points,
        decided_by,
        "Redemption request approved and credited"
    );

    Ok(DecisionOutcome {
        credit: Some(ApprovedCredit {
            points: request.points_total,
            points_total: balance,
            tier,
            bonus_points: grant.points,
        }),
        request,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::customer::CreateCustomerData;
    use crate::models::product::CreateProductData;

    #[test]
    fn total_cost_is_unit_cost_times_quantity() {
        assert_eq!(points_total(40, 3), 120);
        assert_eq!(points_total(1, 1), 1);
        assert_eq!(points_total(250, 2), 500);
    }

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PgPool::connect(&url).await.expect("failed to connect")
    }

    #[tokio::test]
    #[ignore] // Requires a migrated database via DATABASE_URL
    async fn concurrent_decisions_leave_exactly_one_winner() {
        let pool = test_pool().await;

        let customer = Customer::create(
            &pool,
            CreateCustomerData {
                name: "decision race".to_string(),
                phone: None,
                email: None,
            },
        )
        .await
        .unwrap();

        let product = Product::create(
            &pool,
            CreateProductData {
                name: "espresso".to_string(),
                description: None,
                points: 40,
            },
        )
        .await
        .unwrap();

        let request = submit(&pool, customer.id, product.id, 3, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(request.points_total, 120);
        assert_eq!(request.status, RedemptionStatus::Pending);

        let thresholds = Thresholds::default();
        let (approve, reject) = tokio::join!(
            decide(&pool, request.id, true, "admin", &thresholds, Utc::now()),
            decide(&pool, request.id, false, "admin", &thresholds, Utc::now()),
        );

        let won = [approve.is_ok(), reject.is_ok()]
            .into_iter()
            .filter(|ok| *ok)
            .count();
        assert_eq!(won, 1);

        for lost in [approve, reject].into_iter().filter_map(Result::err) {
            assert!(matches!(lost, RedemptionError::AlreadyDecided));
        }

        Customer::delete(&pool, customer.id).await.unwrap();
        Product::delete(&pool, product.id).await.unwrap();
    }
}
