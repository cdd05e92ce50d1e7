//! # attendance-shared
//!
//! Vocabulary shared by the store and the HTTP server: stamp types, the
//! authenticated principal, password hashing and the access policy.
//! Nothing in this crate performs I/O.

pub mod constants;
pub mod error;
pub mod password;
pub mod policy;
pub mod types;

pub use error::{PasswordError, PolicyDenied};
pub use policy::{AccessPolicy, Operation};
pub use types::{Principal, StampType};
