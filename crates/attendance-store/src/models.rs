//! Domain model structs persisted in the SQLite database.

use chrono::{DateTime, Utc};
use serde::Serialize;

use attendance_shared::StampType;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account allowed to call the API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    /// Auto-assigned row id.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Identifier of the device registered to this user, if any.
    pub device_id: Option<String>,
    pub is_admin: bool,
}

/// Values for a user about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub device_id: Option<String>,
    pub is_admin: bool,
}

/// Partial update of a user. `None` leaves the column untouched; the admin
/// flag is deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub device_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The single global location / time policy.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Settings {
    pub id: i64,
    /// Degrees.
    pub latitude: f64,
    /// Degrees.
    pub longitude: f64,
    /// Meters.
    pub radius: i64,
    /// `HH:MM`, stored verbatim.
    pub in_time: String,
    /// `HH:MM`, stored verbatim.
    pub out_time: String,
    /// IANA timezone name.
    pub timezone: String,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsChanges {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<i64>,
    pub in_time: Option<String>,
    pub out_time: Option<String>,
    pub timezone: Option<String>,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A single check-in or check-out stamp.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: i64,
    /// Owning user; `None` after that user has been deleted.
    pub user_id: Option<i64>,
    /// Server-assigned at insertion, UTC.
    pub timestamp: DateTime<Utc>,
    /// Blob store reference of the attached photo.
    pub photo: Option<String>,
    pub device_id: Option<String>,
    pub stamp_type: StampType,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub stamp_type: StampType,
    pub photo: Option<String>,
    pub device_id: Option<String>,
}

/// Conjunctive filter over the transaction log. Every `None` field imposes
/// no constraint; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub user_id: Option<i64>,
    pub stamp_type: Option<StampType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
