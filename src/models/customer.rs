use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// Loyalty tier derived from the valid point balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Red,
    Yellow,
    Green,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub registered_at: DateTime<Utc>,
    /// Cached valid balance; source of truth is the ledger.
    pub points_total: i32,
    /// Cached tier; source of truth is the ledger plus current thresholds.
    pub tier: Tier,
    /// Frequency-bonus high-water mark (step-table value last granted).
    #[serde(skip_serializing)]
    pub bonus_level: i32,
    pub last_visit: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreateCustomerData {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Slim row for the public ranking view.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RankedCustomer {
    pub id: Uuid,
    pub name: String,
    pub points_total: i32,
    pub tier: Tier,
}

impl Customer {
    /// Creates a new customer record
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        data: CreateCustomerData,
    ) -> Result<Self, sqlx::Error> {
        let customer = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO customers (name, phone, email)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.phone)
        .bind(&data.email)
        .fetch_one(db)
        .await?;

        Ok(customer)
    }

    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_phone<'e>(
        db: impl PgExecutor<'e>,
        phone: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM customers WHERE phone = $1")
            .bind(phone)
            .fetch_optional(db)
            .await
    }

    /// Lists all customers, best balance first
    pub async fn list<'e>(db: impl PgExecutor<'e>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM customers ORDER BY points_total DESC, name")
            .fetch_all(db)
            .await
    }

    /// Top customers by cached balance, for the public ranking
    pub async fn ranking<'e>(
        db: impl PgExecutor<'e>,
        limit: i64,
    ) -> Result<Vec<RankedCustomer>, sqlx::Error> {
        sqlx::query_as::<_, RankedCustomer>(
            r#"
            SELECT id, name, points_total, tier
            FROM customers
            ORDER BY points_total DESC, name
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(db)
        .await
    }

    /// Updates contact information; returns the number of rows touched
    pub async fn update_contact<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        name: &str,
        phone: Option<String>,
        email: Option<String>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = $2, phone = $3, email = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(phone)
        .bind(email)
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Sets the login password for the customer with this phone number
    pub async fn set_password<'e>(
        db: impl PgExecutor<'e>,
        phone: &str,
        password: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE customers SET password = $2 WHERE phone = $1")
            .bind(phone)
            .bind(password)
            .execute(db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes the customer; ledger entries, check-ins and redemption
    /// requests go with it via ON DELETE CASCADE.
    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Rewrites the cached loyalty fields from a fresh ledger computation
    pub async fn update_loyalty_cache<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        points_total: i32,
        tier: Tier,
        last_visit: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE customers
            SET points_total = $2, tier = $3, last_visit = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(points_total)
        .bind(tier)
        .bind(last_visit)
        .execute(db)
        .await?;

        Ok(())
    }

    pub async fn set_bonus_level<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        bonus_level: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE customers SET bonus_level = $2 WHERE id = $1")
            .bind(id)
            .bind(bonus_level)
            .execute(db)
            .await?;

        Ok(())
    }

    pub async fn touch_last_visit<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE customers SET last_visit = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(db)
            .await?;

        Ok(())
    }

    pub async fn count<'e>(db: impl PgExecutor<'e>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(db)
            .await
    }

    pub async fn count_by_tier<'e>(
        db: impl PgExecutor<'e>,
        tier: Tier,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE tier = $1")
            .bind(tier)
            .fetch_one(db)
            .await
    }
}
