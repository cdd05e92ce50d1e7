//! # attendance-server
//!
//! HTTP service recording employee attendance.
//!
//! This binary provides:
//! - **User accounts** with Argon2 password hashes and an admin flag
//! - **Global settings**: the workplace location, radius and in/out times
//! - **Transactions**: append-only check-in / check-out stamps, filterable
//!   by user, type and date range
//! - **Photo intake**: optional photo per stamp, kept in a filesystem blob
//!   store and served back under `/uploads`
//!
//! Every endpoint except the probes requires HTTP Basic authentication.

mod api;
mod auth;
mod blob_store;
mod config;
mod error;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use attendance_shared::AccessPolicy;
use attendance_store::Database;

use crate::api::AppState;
use crate::blob_store::PhotoStore;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,attendance_server=debug")),
        )
        .init();

    info!("Starting attendance server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database and seed it
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)?;
    let report = db.bootstrap(
        &config.bootstrap_admin_username,
        &config.bootstrap_admin_password,
    )?;
    info!(?report, path = ?db.path(), "Database ready");

    // -----------------------------------------------------------------------
    // 4. Initialize the photo store
    // -----------------------------------------------------------------------
    let photos = Arc::new(PhotoStore::new(config.upload_dir.clone(), config.max_photo_size).await?);

    let http_addr = config.http_addr;
    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        photos,
        policy: AccessPolicy::new(config.enforce_transaction_ownership),
    };

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
