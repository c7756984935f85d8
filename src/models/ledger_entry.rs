use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// Why a point grant was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "point_category", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PointCategory {
    Purchase,
    FrequencyBonus,
    Redemption,
}

/// One immutable point grant. The ledger is append-only: corrections are
/// made by appending offsetting entries, never by editing or deleting.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub points: i32,
    pub category: PointCategory,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreateEntryData {
    pub customer_id: Uuid,
    pub points: i32,
    pub category: PointCategory,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    /// Whether this entry still counts toward the balance at `as_of`.
    pub fn counts_at(&self, as_of: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |e| e > as_of)
    }

    /// Whether this entry has expired at `as_of`.
    pub fn expired_at(&self, as_of: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |e| e <= as_of)
    }

    /// Appends an entry to the ledger
    pub async fn insert<'e>(
        db: impl PgExecutor<'e>,
        data: CreateEntryData,
    ) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO ledger_entries (customer_id, points, category, description, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.customer_id)
        .bind(data.points)
        .bind(data.category)
        .bind(&data.description)
        .bind(data.created_at)
        .bind(data.expires_at)
        .fetch_one(db)
        .await?;

        Ok(entry)
    }

    /// Lists a customer's entries, newest first. `limit` of `None` returns
    /// the full history.
    pub async fn list_by_customer<'e>(
        db: impl PgExecutor<'e>,
        customer_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM ledger_entries
            WHERE customer_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(db)
        .await
    }

    /// Sum of entries still valid at `as_of`. Expired entries are excluded
    /// but never deleted.
    pub async fn valid_total<'e>(
        db: impl PgExecutor<'e>,
        customer_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            r#"
            SELECT COALESCE(SUM(points), 0)::INT
            FROM ledger_entries
            WHERE customer_id = $1
            AND (expires_at IS NULL OR expires_at > $2)
            "#,
        )
        .bind(customer_id)
        .bind(as_of)
        .fetch_one(db)
        .await
    }

    /// Sum of entries whose expiry has passed at `as_of`, for historical
    /// "expired points" reporting.
    pub async fn expired_total<'e>(
        db: impl PgExecutor<'e>,
        customer_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            r#"
            SELECT COALESCE(SUM(points), 0)::INT
            FROM ledger_entries
            WHERE customer_id = $1
            AND expires_at IS NOT NULL
            AND expires_at <= $2
            "#,
        )
        .bind(customer_id)
        .bind(as_of)
        .fetch_one(db)
        .await
    }

    /// Total points ever issued, valid or not
    pub async fn total_issued<'e>(db: impl PgExecutor<'e>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(points), 0) FROM ledger_entries")
            .fetch_one(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(points: i32, expires_at: Option<DateTime<Utc>>) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            points,
            category: PointCategory::Purchase,
            description: String::new(),
            created_at: Utc::now() - Duration::days(1),
            expires_at,
        }
    }

    #[test]
    fn entry_without_expiry_always_counts() {
        let now = Utc::now();
        let e = entry(300, None);
        assert!(e.counts_at(now));
        assert!(!e.expired_at(now));
    }

    #[test]
    fn entry_expiring_in_the_future_counts() {
        let now = Utc::now();
        let e = entry(300, Some(now + Duration::days(90)));
        assert!(e.counts_at(now));
        assert!(!e.expired_at(now));
    }

    #[test]
    fn entry_expired_yesterday_does_not_count() {
        let now = Utc::now();
        let e = entry(50, Some(now - Duration::days(1)));
        assert!(!e.counts_at(now));
        assert!(e.expired_at(now));
    }

    #[test]
    fn expiry_boundary_is_exclusive_for_validity() {
        // An entry whose expiry equals `as_of` no longer counts.
        let now = Utc::now();
        let e = entry(10, Some(now));
        assert!(!e.counts_at(now));
        assert!(e.expired_at(now));
    }
}
