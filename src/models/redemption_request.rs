use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "redemption_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
}

/// A customer's request to convert a catalog product into a point credit.
/// Status moves pending -> approved or pending -> rejected, exactly once.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RedemptionRequest {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub points_total: i32,
    pub status: RedemptionStatus,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateRequestData {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub points_total: i32,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
}

/// Request joined with customer and product display fields, for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RedemptionRequestDetails {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub points_total: i32,
    pub status: RedemptionStatus,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub product_name: String,
    pub product_description: Option<String>,
}

const DETAILS_SELECT: &str = r#"
    SELECT r.*,
           c.name AS customer_name, c.phone AS customer_phone,
           p.name AS product_name, p.description AS product_description
    FROM redemption_requests r
    JOIN customers c ON r.customer_id = c.id
    JOIN products p ON r.product_id = p.id
"#;

impl RedemptionRequest {
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        data: CreateRequestData,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO redemption_requests
                (customer_id, product_id, quantity, points_total, note, requested_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.customer_id)
        .bind(data.product_id)
        .bind(data.quantity)
        .bind(data.points_total)
        .bind(&data.note)
        .bind(data.requested_at)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM redemption_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Atomically transitions a pending request to its decision. Returns
    /// `None` when the request is missing or no longer pending, so two
    /// concurrent decisions cannot both succeed.
    pub async fn try_decide<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        status: RedemptionStatus,
        decided_by: &str,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE redemption_requests
            SET status = $2, decided_at = $3, decided_by = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(decided_at)
        .bind(decided_by)
        .fetch_optional(db)
        .await
    }

    /// Admin listing, optionally filtered by status, newest first
    pub async fn list_details<'e>(
        db: impl PgExecutor<'e>,
        status: Option<RedemptionStatus>,
    ) -> Result<Vec<RedemptionRequestDetails>, sqlx::Error> {
        match status {
            Some(status) => {
                let sql = format!("{DETAILS_SELECT} WHERE r.status = $1 ORDER BY r.requested_at DESC");
                sqlx::query_as::<_, RedemptionRequestDetails>(&sql)
                    .bind(status)
                    .fetch_all(db)
                    .await
            }
            None => {
                let sql = format!("{DETAILS_SELECT} ORDER BY r.requested_at DESC");
                sqlx::query_as::<_, RedemptionRequestDetails>(&sql)
                    .fetch_all(db)
                    .await
            }
        }
    }

    /// A customer's own requests, newest first
    pub async fn list_by_customer<'e>(
        db: impl PgExecutor<'e>,
        customer_id: Uuid,
    ) -> Result<Vec<RedemptionRequestDetails>, sqlx::Error> {
        let sql = format!("{DETAILS_SELECT} WHERE r.customer_id = $1 ORDER BY r.requested_at DESC");
        sqlx::query_as::<_, RedemptionRequestDetails>(&sql)
            .bind(customer_id)
            .fetch_all(db)
            .await
    }
}
