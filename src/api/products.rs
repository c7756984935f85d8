use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{auth::require_admin, session::AppState};
use crate::error::AppError;
use crate::models::product::CreateProductData;
use crate::models::Product;

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    active: bool,
}

/// Public catalog listing; `?active=true` hides retired products
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = Product::list(&state.pool, query.active).await?;
    Ok(Json(products))
}

#[derive(Deserialize)]
struct ProductBody {
    name: String,
    description: Option<String>,
    points: i32,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

fn validate(body: &ProductBody) -> Result<(), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if body.points <= 0 {
        return Err(AppError::Validation(
            "point cost must be positive".to_string(),
        ));
    }
    Ok(())
}

async fn create_product(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ProductBody>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    require_admin(&session).await?;
    validate(&body)?;

    let product = Product::create(
        &state.pool,
        CreateProductData {
            name: body.name.trim().to_string(),
            description: body.description,
            points: body.points,
        },
    )
    .await?;

    tracing::info!(product_id = %product.id, "Created product");

    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(body): Json<ProductBody>,
) -> Result<Json<Value>, AppError> {
    require_admin(&session).await?;
    validate(&body)?;

    let updated = Product::update(
        &state.pool,
        id,
        body.name.trim(),
        body.description,
        body.points,
        body.is_active,
    )
    .await?;

    if updated == 0 {
        return Err(AppError::ProductNotFound);
    }

    Ok(Json(json!({ "success": true })))
}

async fn delete_product(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&session).await?;

    let deleted = Product::delete(&state.pool, id).await?;
    if deleted == 0 {
        return Err(AppError::ProductNotFound);
    }

    tracing::info!(product_id = %id, "Deleted product");

    Ok(Json(json!({ "success": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            axum::routing::put(update_product).delete(delete_product),
        )
}
