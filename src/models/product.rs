use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A redeemable catalog item. Inactive products cannot be redeemed but
/// remain visible in request history.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub points: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProductData {
    pub name: String,
    pub description: Option<String>,
    pub points: i32,
}

impl Product {
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        data: CreateProductData,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO products (name, description, points)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.points)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Finds a product only if it is currently redeemable
    pub async fn find_active_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM products WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn list<'e>(
        db: impl PgExecutor<'e>,
        active_only: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if active_only {
            sqlx::query_as::<_, Self>("SELECT * FROM products WHERE is_active ORDER BY name")
                .fetch_all(db)
                .await
        } else {
            sqlx::query_as::<_, Self>("SELECT * FROM products ORDER BY name")
                .fetch_all(db)
                .await
        }
    }

    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        name: &str,
        description: Option<String>,
        points: i32,
        is_active: bool,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, points = $4, is_active = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(points)
        .bind(is_active)
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        Ok(result.rows_affected())
    }
}
