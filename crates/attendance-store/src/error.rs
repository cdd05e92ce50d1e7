use thiserror::Error;

use attendance_shared::PasswordError;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// A unique column already holds the value being written.
    #[error("{0} already exists")]
    Duplicate(&'static str),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Hashing the bootstrap credentials failed.
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// A persisted value could not be decoded.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Map `QueryReturnedNoRows` to [`StoreError::NotFound`].
pub(crate) fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

/// Map a UNIQUE constraint failure to [`StoreError::Duplicate`].
pub(crate) fn unique_violation(e: rusqlite::Error, what: &'static str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::Duplicate(what)
        }
        other => StoreError::Sqlite(other),
    }
}
