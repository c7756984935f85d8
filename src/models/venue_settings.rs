use serde::Serialize;
use sqlx::{FromRow, PgExecutor};

/// The venue's configuration singleton. Loaded as an immutable snapshot at
/// the start of each operation; mutated only through the admin update.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VenueSettings {
    pub id: i32,
    pub venue_name: String,
    pub logo_path: Option<String>,
    pub red_min: i32,
    pub yellow_min: i32,
    pub green_min: i32,
    #[serde(skip_serializing)]
    pub admin_password: String,
}

/// Tier cut-offs snapshot passed into classification. Red is the
/// unconditional floor, so only the upper two bounds matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    pub yellow_min: i32,
    pub green_min: i32,
}

impl Default for Thresholds {
    /// Hardcoded fallback used when settings are unavailable.
    fn default() -> Self {
        Self {
            yellow_min: 200,
            green_min: 500,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsData {
    pub venue_name: Option<String>,
    pub logo_path: Option<String>,
    pub red_min: Option<i32>,
    pub yellow_min: Option<i32>,
    pub green_min: Option<i32>,
    pub admin_password: Option<String>,
}

impl VenueSettings {
    pub async fn load<'e>(db: impl PgExecutor<'e>) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM venue_settings LIMIT 1")
            .fetch_optional(db)
            .await
    }

    /// Applies an admin update, leaving unspecified fields untouched
    pub async fn update<'e>(
        db: impl PgExecutor<'e>,
        data: UpdateSettingsData,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE venue_settings
            SET venue_name = COALESCE($1, venue_name),
                logo_path = COALESCE($2, logo_path),
                red_min = COALESCE($3, red_min),
                yellow_min = COALESCE($4, yellow_min),
                green_min = COALESCE($5, green_min),
                admin_password = COALESCE($6, admin_password)
            WHERE id = 1
            RETURNING *
            "#,
        )
        .bind(data.venue_name)
        .bind(data.logo_path)
        .bind(data.red_min)
        .bind(data.yellow_min)
        .bind(data.green_min)
        .bind(data.admin_password)
        .fetch_one(db)
        .await
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            yellow_min: self.yellow_min,
            green_min: self.green_min,
        }
    }

    /// Thresholds snapshot for one operation, falling back to the
    /// hardcoded defaults when the settings row is unavailable.
    pub async fn load_thresholds<'e>(db: impl PgExecutor<'e>) -> Result<Thresholds, sqlx::Error> {
        let settings = Self::load(db).await?;
        Ok(settings.map(|s| s.thresholds()).unwrap_or_default())
    }
}
