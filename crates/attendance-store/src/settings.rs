//! The singleton settings row (`id = 1`).

use rusqlite::params;

use attendance_shared::constants::DEFAULT_TIMEZONE;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{Settings, SettingsChanges};

/// Primary key of the only settings row.
pub const SETTINGS_ID: i64 = 1;

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID,
            latitude: 0.0,
            longitude: 0.0,
            radius: 0,
            in_time: "00:00".to_string(),
            out_time: "00:00".to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl Database {
    /// Insert the default row if none exists. Returns `true` if it was created.
    pub fn ensure_settings(&self) -> Result<bool> {
        let defaults = Settings::default();
        let affected = self.conn().execute(
            "INSERT OR IGNORE INTO settings
                 (id, latitude, longitude, radius, in_time, out_time, timezone)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                SETTINGS_ID,
                defaults.latitude,
                defaults.longitude,
                defaults.radius,
                defaults.in_time,
                defaults.out_time,
                defaults.timezone,
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn get_settings(&self) -> Result<Settings> {
        self.conn()
            .query_row(
                "SELECT id, latitude, longitude, radius, in_time, out_time, timezone
                 FROM settings WHERE id = ?1",
                params![SETTINGS_ID],
                row_to_settings,
            )
            .map_err(not_found)
    }

    /// Overwrite the provided fields and return the resulting row.
    pub fn update_settings(&self, changes: &SettingsChanges) -> Result<Settings> {
        let affected = self.conn().execute(
            "UPDATE settings SET
                latitude  = COALESCE(?1, latitude),
                longitude = COALESCE(?2, longitude),
                radius    = COALESCE(?3, radius),
                in_time   = COALESCE(?4, in_time),
                out_time  = COALESCE(?5, out_time),
                timezone  = COALESCE(?6, timezone)
             WHERE id = ?7",
            params![
                changes.latitude,
                changes.longitude,
                changes.radius,
                changes.in_time,
                changes.out_time,
                changes.timezone,
                SETTINGS_ID,
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_settings()
    }
}

fn row_to_settings(row: &rusqlite::Row<'_>) -> rusqlite::Result<Settings> {
    Ok(Settings {
        id: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        radius: row.get(3)?,
        in_time: row.get(4)?,
        out_time: row.get(5)?,
        timezone: row.get(6)?,
    })
}
