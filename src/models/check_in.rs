use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// One venue visit. The unique index on (customer_id, UTC date) makes
/// "at most one per customer per calendar day" an insertion-time guarantee.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CheckIn {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub location: Option<String>,
}

impl CheckIn {
    /// Inserts a check-in. A unique violation here means the customer
    /// already checked in on that calendar day; callers map it to their
    /// duplicate error.
    pub async fn insert<'e>(
        db: impl PgExecutor<'e>,
        customer_id: Uuid,
        checked_in_at: DateTime<Utc>,
        location: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO check_ins (customer_id, checked_in_at, location)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(checked_in_at)
        .bind(location)
        .fetch_one(db)
        .await
    }

    /// Whether a check-in exists for the customer on this UTC date
    pub async fn exists_on_day<'e>(
        db: impl PgExecutor<'e>,
        customer_id: Uuid,
        day: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM check_ins
                WHERE customer_id = $1
                AND (checked_in_at AT TIME ZONE 'UTC')::date = $2
            )
            "#,
        )
        .bind(customer_id)
        .bind(day)
        .fetch_one(db)
        .await
    }

    /// Distinct calendar days with a check-in inside the trailing window
    /// `(as_of - window_days, as_of]`.
    pub async fn distinct_days_in_window<'e>(
        db: impl PgExecutor<'e>,
        customer_id: Uuid,
        as_of: DateTime<Utc>,
        window_days: i64,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            r#"
            SELECT COUNT(DISTINCT (checked_in_at AT TIME ZONE 'UTC')::date)::INT
            FROM check_ins
            WHERE customer_id = $1
            AND checked_in_at > $2 - make_interval(days => $3::INT)
            AND checked_in_at <= $2
            "#,
        )
        .bind(customer_id)
        .bind(as_of)
        .bind(window_days as i32)
        .fetch_one(db)
        .await
    }

    /// A customer's most recent check-ins
    pub async fn list_recent<'e>(
        db: impl PgExecutor<'e>,
        customer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM check_ins
            WHERE customer_id = $1
            ORDER BY checked_in_at DESC
            LIMIT $2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(db)
        .await
    }
}
