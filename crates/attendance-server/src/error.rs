use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use attendance_shared::{PasswordError, PolicyDenied};
use attendance_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or wrong credentials. Deliberately says nothing about which.
    #[error("Invalid username or password")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Photo too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The request body overran the router's limit before it was read.
    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Convert a store error, naming the missing record on `NotFound`.
    pub fn from_store(err: StoreError, what: &str) -> Self {
        match err {
            StoreError::NotFound => ServerError::NotFound(format!("{what} not found")),
            other => other.into(),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServerError::NotFound("Record not found".to_string()),
            StoreError::Duplicate(what) => {
                ServerError::BadRequest(format!("{what} already exists"))
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<PolicyDenied> for ServerError {
    fn from(denied: PolicyDenied) -> Self {
        ServerError::Forbidden(denied.to_string())
    }
}

impl From<PasswordError> for ServerError {
    fn from(err: PasswordError) -> Self {
        ServerError::Internal(err.to_string())
    }
}

// Malformed bodies, paths and query strings are all plain bad requests.
impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ServerError {
    fn from(rejection: MultipartRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::PayloadTooLarge { .. } | ServerError::BodyTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::BlobStorage(_) => {
                tracing::error!(error = %self, "blob storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Blob storage error".to_string())
            }
            ServerError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = axum::Json(serde_json::json!({
            "detail": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServerError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ServerError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (ServerError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ServerError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (
                ServerError::PayloadTooLarge { size: 2, max: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (ServerError::BodyTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (
                ServerError::Internal("db down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_plain_unauthorized_has_no_challenge() {
        let resp = ServerError::Unauthorized.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_store_errors() {
        assert!(matches!(
            ServerError::from(StoreError::Duplicate("Username")),
            ServerError::BadRequest(ref m) if m == "Username already exists"
        ));
        assert!(matches!(
            ServerError::from_store(StoreError::NotFound, "User"),
            ServerError::NotFound(ref m) if m == "User not found"
        ));
        assert!(matches!(
            ServerError::from(StoreError::Migration("boom".into())),
            ServerError::Internal(_)
        ));
    }

    #[test]
    fn test_policy_denial_is_forbidden() {
        let err = ServerError::from(PolicyDenied::AdminUndeletable);
        assert!(matches!(err, ServerError::Forbidden(ref m) if m == "Cannot delete admin users"));
    }
}
