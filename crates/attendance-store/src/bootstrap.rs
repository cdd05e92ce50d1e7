//! First-run seeding: the settings row and one administrator.

use attendance_shared::password;

use crate::database::Database;
use crate::error::Result;
use crate::models::NewUser;

/// What [`Database::bootstrap`] had to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub settings_created: bool,
    pub admin_created: bool,
}

impl Database {
    /// Create the default settings row if missing, and seed an admin account
    /// when the users table is empty. Safe to call on every start.
    pub fn bootstrap(&self, admin_username: &str, admin_password: &str) -> Result<BootstrapReport> {
        let settings_created = self.ensure_settings()?;
        if settings_created {
            tracing::info!("default settings created");
        }

        let existing = self.count_users()?;
        let admin_created = if existing == 0 {
            self.create_user(&NewUser {
                username: admin_username.to_string(),
                password_hash: password::hash(admin_password)?,
                device_id: None,
                is_admin: true,
            })?;
            tracing::warn!(
                username = admin_username,
                "bootstrap admin created; change its password"
            );
            true
        } else {
            tracing::debug!(users = existing, "users present, skipping admin seed");
            false
        };

        Ok(BootstrapReport {
            settings_created,
            admin_created,
        })
    }
}
