use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::check_in::CheckIn;
use crate::models::customer::Customer;
use crate::services::frequency;

#[derive(Error, Debug)]
pub enum CheckInError {
    #[error("customer not found")]
    CustomerNotFound,

    #[error("customer already checked in on this day")]
    DuplicateCheckIn,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of a successful check-in, including the frequency standing the
/// visit produced.
#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub check_in: CheckIn,
    pub days_visited: i32,
    /// Step-table bonus the rolling window currently maps to.
    pub reachable_bonus: i32,
    /// Whether this visit pushed the window past a threshold not yet
    /// granted; the credit itself lands with the next point credit.
    pub newly_reachable: bool,
}

/// Records a check-in for the calendar day of `now` (the event's own
/// timestamp, not wall-clock "today") and updates the customer's last
/// visit. The day-uniqueness check and the insert are one atomic unit: the
/// unique index decides races, and a violation surfaces as
/// `DuplicateCheckIn`.
#[tracing::instrument(skip(pool))]
pub async fn check_in(
    pool: &PgPool,
    customer_id: Uuid,
    now: DateTime<Utc>,
    location: Option<String>,
) -> Result<CheckInOutcome, CheckInError> {
    let mut tx = pool.begin().await?;

    let customer = Customer::find_by_id(&mut *tx, customer_id)
        .await?
        .ok_or(CheckInError::CustomerNotFound)?;

    let check_in = CheckIn::insert(&mut *tx, customer_id, now, location)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                CheckInError::DuplicateCheckIn
            } else {
                CheckInError::Database(err)
            }
        })?;

    Customer::touch_last_visit(&mut *tx, customer_id, now).await?;

    let standing = frequency::standing(&mut *tx, customer_id, now).await?;

    tx.commit().await?;

    tracing::info!(
        customer_id = %customer_id,
        days_visited = standing.days_visited,
        reachable_bonus = standing.bonus_level,
        "Recorded check-in"
    );

    Ok(CheckInOutcome {
        check_in,
        days_visited: standing.days_visited,
        reachable_bonus: standing.bonus_level,
        newly_reachable: standing.bonus_level > customer.bonus_level,
    })
}

/// Pure query mirroring the dedup rule, for UI gating
pub async fn can_check_in<'e>(
    db: impl PgExecutor<'e>,
    customer_id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let already = CheckIn::exists_on_day(db, customer_id, now.date_naive()).await?;
    Ok(!already)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::customer::CreateCustomerData;
    use chrono::{Duration, TimeZone};

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PgPool::connect(&url).await.expect("failed to connect")
    }

    #[tokio::test]
    #[ignore] // Requires a migrated database via DATABASE_URL
    async fn second_check_in_on_the_same_day_is_rejected() {
        let pool = test_pool().await;
        let customer = Customer::create(
            &pool,
            CreateCustomerData {
                name: "check-in dedup".to_string(),
                phone: None,
                email: None,
            },
        )
        .await
        .unwrap();

        // Fixed noon timestamp so an hour later is still the same UTC day
        let noon = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();

        let first = check_in(&pool, customer.id, noon, None).await;
        assert!(first.is_ok());

        let second = check_in(&pool, customer.id, noon + Duration::hours(1), None).await;
        assert!(matches!(second, Err(CheckInError::DuplicateCheckIn)));

        assert!(!can_check_in(&pool, customer.id, noon).await.unwrap());

        let next_day = check_in(&pool, customer.id, noon + Duration::days(1), None).await;
        assert!(next_day.is_ok());

        Customer::delete(&pool, customer.id).await.unwrap();
    }
}
