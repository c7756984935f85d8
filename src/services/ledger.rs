use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::customer::{Customer, Tier};
use crate::models::ledger_entry::{CreateEntryData, LedgerEntry, PointCategory};
use crate::models::venue_settings::Thresholds;
use crate::services::{frequency, tier};

/// Every point grant expires this many days after creation. A policy
/// constant of the engine, not configurable per entry.
pub const POINT_TTL_DAYS: i64 = 90;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("point amount must be positive")]
    InvalidAmount,

    #[error("customer not found")]
    CustomerNotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Expiry timestamp for an entry created at `now`
pub fn expiry_for(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(POINT_TTL_DAYS)
}

/// Guard applied before any entry is appended
fn validate_amount(points: i32) -> Result<(), LedgerError> {
    if points <= 0 {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(())
}

/// Outcome of a purchase credit, for the caller's response.
#[derive(Debug, Clone)]
pub struct CreditOutcome {
    pub entry: LedgerEntry,
    pub points_total: i32,
    pub tier: Tier,
    pub bonus_points: i32,
    pub days_visited: i32,
}

/// Appends one entry to the ledger. Fails with `InvalidAmount` before
/// touching storage when `points <= 0`.
pub async fn credit<'e>(
    db: impl PgExecutor<'e>,
    customer_id: Uuid,
    points: i32,
    category: PointCategory,
    description: &str,
    now: DateTime<Utc>,
) -> Result<LedgerEntry, LedgerError> {
    validate_amount(points)?;

    let entry = LedgerEntry::insert(
        db,
        CreateEntryData {
            customer_id,
            points,
            category,
            description: description.to_string(),
            created_at: now,
            expires_at: Some(expiry_for(now)),
        },
    )
    .await?;

    Ok(entry)
}

/// Recomputes the customer's valid balance from the ledger, reclassifies
/// the tier, and rewrites the cached fields. Must run in the same
/// transaction as the mutation that made the cache stale.
pub async fn refresh_customer(
    conn: &mut PgConnection,
    customer_id: Uuid,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Result<(i32, Tier), sqlx::Error> {
    let balance = LedgerEntry::valid_total(&mut *conn, customer_id, now).await?;
    let tier = tier::classify(balance, thresholds);
    Customer::update_loyalty_cache(&mut *conn, customer_id, balance, tier, now).await?;

    Ok((balance, tier))
}

/// Credits purchase points to a customer: appends the entry, applies the
/// frequency-bonus policy, and refreshes the cached balance and tier, all
/// in one transaction.
#[tracing::instrument(skip(pool, thresholds))]
pub async fn credit_points(
    pool: &PgPool,
    customer_id: Uuid,
    points: i32,
    description: &str,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Result<CreditOutcome, LedgerError> {
    validate_amount(points)?;

    let mut tx = pool.begin().await?;

    let customer = Customer::find_by_id(&mut *tx, customer_id)
        .await?
        .ok_or(LedgerError::CustomerNotFound)?;

    let entry = credit(
        &mut *tx,
        customer_id,
        points,
        PointCategory::Purchase,
        description,
        now,
    )
    .await?;

    let grant = frequency::apply_bonus(&mut tx, customer_id, customer.bonus_level, now).await?;
    let (points_total, tier) = refresh_customer(&mut tx, customer_id, thresholds, now).await?;

    tx.commit().await?;

    tracing::info!(
        customer_id = %customer_id,
        points,
        bonus_points = grant.points,
        points_total,
        tier = ?tier,
        "Credited purchase points"
    );

    Ok(CreditOutcome {
        entry,
        points_total,
        tier,
        bonus_points: grant.points,
        days_visited: grant.days_visited,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_90_days_out() {
        let now = Utc::now();
        assert_eq!(expiry_for(now) - now, Duration::days(90));
    }

    #[test]
    fn zero_and_negative_amounts_are_rejected() {
        assert!(matches!(validate_amount(0), Err(LedgerError::InvalidAmount)));
        assert!(matches!(validate_amount(-5), Err(LedgerError::InvalidAmount)));
        assert!(validate_amount(1).is_ok());
    }
}
