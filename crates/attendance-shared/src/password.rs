//! Salted, adaptive password hashing (Argon2id).
//!
//! [`hash`] produces a PHC string that embeds the algorithm, parameters and
//! a fresh random salt, so [`verify`] needs nothing besides that string.

use argon2::password_hash::{
    Error as PhcError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use rand::rngs::OsRng;

use crate::error::PasswordError;

/// Stand-in stored hash for accounts that do not exist. It carries the
/// parameters [`hash`] uses, so verifying against it costs the same as a real
/// check and never succeeds.
pub const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1\
    $BPmv81Bh9anj7RsxUFFL8w$EbnEvkNCL973bkIiCQNncM0p921bX5rgu/cAfYaqfZA";

pub fn hash(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Returns `Ok(false)` on a mismatch. Only a stored value that cannot be
/// parsed as a PHC string is an error.
pub fn verify(plaintext: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PhcError::Password) => Ok(false),
        Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
    }
}
