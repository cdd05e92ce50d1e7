use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// The stored value is not a PHC string we can verify against.
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Reason an authenticated principal was refused an operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDenied {
    #[error("Admin privileges required")]
    AdminRequired,

    #[error("Not authorized to update this user")]
    NotSelf,

    #[error("Cannot delete admin users")]
    AdminUndeletable,

    #[error("Not authorized to record transactions for this user")]
    NotOwner,
}
