use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use attendance_shared::AccessPolicy;
use attendance_store::Database;

use crate::blob_store::PhotoStore;

mod extract;
mod settings;
mod transactions;
mod users;

#[cfg(test)]
pub(crate) mod test_support;

/// Headroom on top of the photo limit for the other multipart fields.
const FORM_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub photos: Arc<PhotoStore>,
    pub policy: AccessPolicy,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let body_limit = state.photos.max_size() + FORM_OVERHEAD;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/users/", post(users::create_user).get(users::list_users))
        .route("/users/login", post(users::login))
        .route(
            "/users/:user_id",
            put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/settings/",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route("/settings/timezones", get(settings::list_timezones))
        .route(
            "/transactions/",
            post(transactions::create_transaction).get(transactions::list_transactions),
        )
        .route("/transactions/:transaction_id", get(transactions::get_transaction))
        .route("/uploads/:file_name", get(transactions::get_photo))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Attendance API is running",
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
