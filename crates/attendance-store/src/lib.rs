//! # attendance-store
//!
//! SQLite persistence for the attendance service: user accounts, the single
//! global settings row, and the append-only transaction log.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for every domain
//! model, plus the filtered transaction query.

pub mod bootstrap;
pub mod database;
pub mod migrations;
pub mod models;
pub mod settings;
pub mod transactions;
pub mod users;

mod error;

pub use bootstrap::BootstrapReport;
pub use database::Database;
pub use error::StoreError;
pub use models::*;
