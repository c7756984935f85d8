use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::middleware::{auth::require_admin, session::AppState};
use crate::error::AppError;
use crate::models::venue_settings::UpdateSettingsData;
use crate::models::VenueSettings;

/// Public settings read; the admin credential is never serialized
async fn get_settings(State(state): State<AppState>) -> Result<Json<VenueSettings>, AppError> {
    let settings = VenueSettings::load(&state.pool)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("venue settings row missing")))?;

    Ok(Json(settings))
}

#[derive(Deserialize)]
struct UpdateSettingsBody {
    venue_name: Option<String>,
    logo_path: Option<String>,
    red_min: Option<i32>,
    yellow_min: Option<i32>,
    green_min: Option<i32>,
    admin_password: Option<String>,
}

/// Admin settings update. Threshold ordering is validated against the
/// merged result so a partial update cannot leave the cut-offs inverted.
async fn update_settings(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<UpdateSettingsBody>,
) -> Result<Json<VenueSettings>, AppError> {
    require_admin(&session).await?;

    let current = VenueSettings::load(&state.pool)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("venue settings row missing")))?;

    let red_min = body.red_min.unwrap_or(current.red_min);
    let yellow_min = body.yellow_min.unwrap_or(current.yellow_min);
    let green_min = body.green_min.unwrap_or(current.green_min);

    if !(red_min <= yellow_min && yellow_min <= green_min) {
        return Err(AppError::Validation(
            "thresholds must be non-decreasing: red <= yellow <= green".to_string(),
        ));
    }

    if let Some(password) = &body.admin_password {
        if password.len() < 4 {
            return Err(AppError::Validation(
                "admin password must be at least 4 characters".to_string(),
            ));
        }
    }

    let settings = VenueSettings::update(
        &state.pool,
        UpdateSettingsData {
            venue_name: body.venue_name.filter(|s| !s.trim().is_empty()),
            logo_path: body.logo_path,
            red_min: body.red_min,
            yellow_min: body.yellow_min,
            green_min: body.green_min,
            admin_password: body.admin_password,
        },
    )
    .await?;

    tracing::info!("Venue settings updated");

    Ok(Json(settings))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(get_settings))
        .route("/api/admin/settings", put(update_settings))
}
