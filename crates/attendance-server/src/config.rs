//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use attendance_shared::constants::{
    BOOTSTRAP_ADMIN_PASSWORD, BOOTSTRAP_ADMIN_USERNAME, DEFAULT_HTTP_PORT, MAX_PHOTO_SIZE,
    UPLOAD_DIR,
};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./attendance.db`
    pub database_path: PathBuf,

    /// Filesystem path where uploaded photos are stored.
    /// Env: `UPLOAD_DIR`
    /// Default: `./uploads`
    pub upload_dir: PathBuf,

    /// Maximum photo size in bytes.
    /// Env: `MAX_PHOTO_SIZE`
    /// Default: 10 MiB
    pub max_photo_size: usize,

    /// Account seeded when the users table is empty.
    /// Env: `BOOTSTRAP_ADMIN_USERNAME` / `BOOTSTRAP_ADMIN_PASSWORD`
    /// Default: `admin` / `admin123`
    pub bootstrap_admin_username: String,
    pub bootstrap_admin_password: String,

    /// Restrict non-admins to recording transactions for themselves.
    /// Env: `ENFORCE_TRANSACTION_OWNERSHIP` (true/false)
    /// Default: `false`
    pub enforce_transaction_ownership: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./attendance.db"),
            upload_dir: PathBuf::from(format!("./{UPLOAD_DIR}")),
            max_photo_size: MAX_PHOTO_SIZE,
            bootstrap_admin_username: BOOTSTRAP_ADMIN_USERNAME.to_string(),
            bootstrap_admin_password: BOOTSTRAP_ADMIN_PASSWORD.to_string(),
            enforce_transaction_ownership: false,
        }
    }
}

// Hand-written so the bootstrap password never reaches the logs.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("upload_dir", &self.upload_dir)
            .field("max_photo_size", &self.max_photo_size)
            .field("bootstrap_admin_username", &self.bootstrap_admin_username)
            .field("bootstrap_admin_password", &"<redacted>")
            .field(
                "enforce_transaction_ownership",
                &self.enforce_transaction_ownership,
            )
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(path);
        }

        if let Some(val) = lookup("MAX_PHOTO_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_photo_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_PHOTO_SIZE, using default"),
            }
        }

        if let Some(name) = lookup("BOOTSTRAP_ADMIN_USERNAME") {
            if !name.trim().is_empty() {
                config.bootstrap_admin_username = name;
            }
        }

        if let Some(password) = lookup("BOOTSTRAP_ADMIN_PASSWORD") {
            if !password.is_empty() {
                config.bootstrap_admin_password = password;
            }
        }

        if let Some(val) = lookup("ENFORCE_TRANSACTION_OWNERSHIP") {
            config.enforce_transaction_ownership = parse_flag(&val);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(vars: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8000).into());
        assert_eq!(config.bootstrap_admin_username, "admin");
        assert_eq!(config.bootstrap_admin_password, "admin123");
        assert!(!config.enforce_transaction_ownership);
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/a.db"),
            ("MAX_PHOTO_SIZE", "1024"),
            ("ENFORCE_TRANSACTION_OWNERSHIP", "TRUE"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, PathBuf::from("/tmp/a.db"));
        assert_eq!(config.max_photo_size, 1024);
        assert!(config.enforce_transaction_ownership);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_map(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("MAX_PHOTO_SIZE", "-5"),
            ("BOOTSTRAP_ADMIN_USERNAME", "   "),
        ]);
        let defaults = ServerConfig::default();
        assert_eq!(config.http_addr, defaults.http_addr);
        assert_eq!(config.max_photo_size, defaults.max_photo_size);
        assert_eq!(config.bootstrap_admin_username, "admin");
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", ServerConfig::default());
        assert!(!rendered.contains("admin123"));
        assert!(rendered.contains("<redacted>"));
    }
}
