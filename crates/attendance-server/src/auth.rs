//! HTTP Basic authentication.
//!
//! Every protected handler takes an [`AuthUser`]; extracting it decodes the
//! `Authorization: Basic` header, looks the username up and verifies the
//! password. Nothing is cached between requests.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use attendance_shared::{password, Principal};

use crate::api::AppState;
use crate::error::ServerError;

/// The principal resolved for the current request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

/// Rejection of [`AuthUser`]. Unlike a plain [`ServerError`], its 401 carries
/// the `WWW-Authenticate: Basic` challenge.
#[derive(Debug)]
pub struct AuthRejection(pub ServerError);

impl From<ServerError> for AuthRejection {
    fn from(err: ServerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let mut resp = self.0.into_response();
        if resp.status() == StatusCode::UNAUTHORIZED {
            resp.headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
        }
        resp
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (username, password) =
            basic_credentials(&parts.headers).ok_or(ServerError::Unauthorized)?;
        Ok(AuthUser(authenticate(state, &username, &password).await?))
    }
}

/// Decode `Authorization: Basic base64(user:pass)`. The password may itself
/// contain `:`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Resolve a username / password pair to a principal.
///
/// Unknown users and wrong passwords both yield [`ServerError::Unauthorized`],
/// and both pay for one Argon2 verification.
pub async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Principal, ServerError> {
    let user = {
        let db = state.db.lock().await;
        db.find_user_by_username(username)?
    };

    let stored_hash = user
        .as_ref()
        .map_or(password::DUMMY_HASH, |u| u.password_hash.as_str());
    let verified = verify_password(password, stored_hash).await?;

    match user {
        Some(user) if verified => Ok(Principal {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        }),
        Some(_) => {
            debug!(username, "authentication failed: wrong password");
            Err(ServerError::Unauthorized)
        }
        None => {
            debug!(username, "authentication failed: unknown user");
            Err(ServerError::Unauthorized)
        }
    }
}

/// Argon2 is deliberately slow; keep it off the async workers.
pub async fn hash_password(plaintext: &str) -> Result<String, ServerError> {
    let plaintext = plaintext.to_string();
    tokio::task::spawn_blocking(move || password::hash(&plaintext))
        .await
        .map_err(|e| ServerError::Internal(format!("hashing task failed: {e}")))?
        .map_err(ServerError::from)
}

pub async fn verify_password(plaintext: &str, stored_hash: &str) -> Result<bool, ServerError> {
    let plaintext = plaintext.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || password::verify(&plaintext, &stored_hash))
        .await
        .map_err(|e| ServerError::Internal(format!("verification task failed: {e}")))?
        .map_err(ServerError::from)
}
