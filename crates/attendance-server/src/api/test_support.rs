//! Router harness shared by the handler tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;

use attendance_shared::{password, AccessPolicy};
use attendance_store::{Database, NewUser};

use super::{build_router, AppState};
use crate::blob_store::PhotoStore;

pub const ADMIN: (&str, &str) = ("admin", "admin123");
const BOUNDARY: &str = "attendance-test-boundary";

pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    _uploads: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_policy(AccessPolicy::default()).await
    }

    pub async fn with_policy(policy: AccessPolicy) -> Self {
        let uploads = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        db.bootstrap(ADMIN.0, ADMIN.1).unwrap();

        let photos = PhotoStore::new(uploads.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();

        let state = AppState {
            db: Arc::new(Mutex::new(db)),
            photos: Arc::new(photos),
            policy,
        };

        Self {
            app: build_router(state.clone()),
            state,
            _uploads: uploads,
        }
    }

    /// Insert a non-admin user directly, bypassing the API.
    pub async fn add_worker(&self, username: &str, plaintext: &str) -> i64 {
        let db = self.state.db.lock().await;
        db.create_user(&NewUser {
            username: username.to_string(),
            password_hash: password::hash(plaintext).unwrap(),
            device_id: None,
            is_admin: false,
        })
        .unwrap()
        .id
    }

    pub async fn send_raw(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(req).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

fn builder(method: Method, uri: &str, creds: Option<(&str, &str)>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, pass)) = creds {
        let encoded = STANDARD.encode(format!("{user}:{pass}"));
        builder = builder.header(header::AUTHORIZATION, format!("Basic {encoded}"));
    }
    builder
}

pub fn get(uri: &str, creds: Option<(&str, &str)>) -> Request<Body> {
    builder(Method::GET, uri, creds).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, creds: Option<(&str, &str)>) -> Request<Body> {
    builder(Method::DELETE, uri, creds).body(Body::empty()).unwrap()
}

pub fn json(method: Method, uri: &str, creds: Option<(&str, &str)>, body: Value) -> Request<Body> {
    builder(method, uri, creds)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart(uri: &str, creds: Option<(&str, &str)>, parts: &[Part<'_>]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                filename,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; \
                         filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    builder(Method::POST, uri, creds)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
