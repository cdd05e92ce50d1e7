//! `/settings` endpoints: the single global location / time policy.

use axum::{extract::State, Json};
use chrono_tz::{Tz, TZ_VARIANTS};
use serde::Deserialize;
use tracing::info;

use attendance_shared::types::is_wall_clock;
use attendance_shared::Operation;
use attendance_store::{Settings, SettingsChanges};

use super::extract::ApiJson;
use super::AppState;
use crate::auth::AuthUser;
use crate::error::ServerError;

#[derive(Deserialize)]
pub(crate) struct UpdateSettingsRequest {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    radius: Option<i64>,
    #[serde(default)]
    in_time: Option<String>,
    #[serde(default)]
    out_time: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

impl UpdateSettingsRequest {
    fn validate(self) -> Result<SettingsChanges, ServerError> {
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ServerError::BadRequest(
                    "latitude must be between -90 and 90".into(),
                ));
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ServerError::BadRequest(
                    "longitude must be between -180 and 180".into(),
                ));
            }
        }
        if matches!(self.radius, Some(r) if r < 0) {
            return Err(ServerError::BadRequest("radius must not be negative".into()));
        }
        for (field, value) in [("in_time", &self.in_time), ("out_time", &self.out_time)] {
            if let Some(value) = value {
                if !is_wall_clock(value) {
                    return Err(ServerError::BadRequest(format!(
                        "{field} must be a 24-hour HH:MM time"
                    )));
                }
            }
        }
        if let Some(tz) = &self.timezone {
            if tz.parse::<Tz>().is_err() {
                return Err(ServerError::BadRequest(format!("Unknown timezone: {tz}")));
            }
        }

        Ok(SettingsChanges {
            latitude: self.latitude,
            longitude: self.longitude,
            radius: self.radius,
            in_time: self.in_time,
            out_time: self.out_time,
            timezone: self.timezone,
        })
    }
}

/// GET /settings/
pub(crate) async fn get_settings(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Settings>, ServerError> {
    state.policy.authorize(&principal, Operation::GetSettings)?;

    let settings = state
        .db
        .lock()
        .await
        .get_settings()
        .map_err(|e| ServerError::from_store(e, "Settings"))?;
    Ok(Json(settings))
}

/// PUT /settings/ -- admin only. Absent fields keep their value.
pub(crate) async fn update_settings(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(req): ApiJson<UpdateSettingsRequest>,
) -> Result<Json<Settings>, ServerError> {
    state.policy.authorize(&principal, Operation::UpdateSettings)?;
    let changes = req.validate()?;

    let settings = state
        .db
        .lock()
        .await
        .update_settings(&changes)
        .map_err(|e| ServerError::from_store(e, "Settings"))?;

    info!(
        latitude = settings.latitude,
        longitude = settings.longitude,
        radius = settings.radius,
        in_time = %settings.in_time,
        out_time = %settings.out_time,
        timezone = %settings.timezone,
        by = %principal.username,
        "Settings updated"
    );
    Ok(Json(settings))
}

/// GET /settings/timezones -- every IANA name accepted by `PUT /settings/`.
pub(crate) async fn list_timezones(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<&'static str>>, ServerError> {
    state.policy.authorize(&principal, Operation::ListTimezones)?;

    let mut names: Vec<&'static str> = TZ_VARIANTS.iter().map(|tz| tz.name()).collect();
    names.sort_unstable();
    Ok(Json(names))
}
