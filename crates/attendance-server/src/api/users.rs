//! `/users` endpoints: account management and login.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use attendance_shared::Operation;
use attendance_store::{NewUser, User, UserChanges};

use super::extract::{ApiJson, ApiPath};
use super::AppState;
use crate::auth::{authenticate, hash_password, AuthUser};
use crate::error::ServerError;

#[derive(Deserialize)]
pub(crate) struct CreateUserRequest {
    #[serde(rename = "userName")]
    user_name: String,
    password: String,
    #[serde(rename = "deviceID", default)]
    device_id: Option<String>,
    #[serde(rename = "isAdmin", default)]
    is_admin: Option<bool>,
}

#[derive(Deserialize)]
pub(crate) struct UpdateUserRequest {
    #[serde(rename = "userName", default)]
    user_name: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(rename = "deviceID", default)]
    device_id: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(rename = "userName")]
    user_name: String,
    password: String,
}

#[derive(Serialize)]
pub(crate) struct UserResponse {
    #[serde(rename = "userID")]
    user_id: i64,
    #[serde(rename = "userName")]
    user_name: String,
    #[serde(rename = "deviceID")]
    device_id: Option<String>,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            user_name: user.username,
            device_id: user.device_id,
            is_admin: user.is_admin,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct LoginResponse {
    #[serde(rename = "userID")]
    user_id: i64,
    #[serde(rename = "userName")]
    user_name: String,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
}

fn validate_username(name: &str) -> Result<(), ServerError> {
    if name.trim().is_empty() {
        return Err(ServerError::BadRequest("userName must not be empty".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ServerError> {
    if password.is_empty() {
        return Err(ServerError::BadRequest("password must not be empty".into()));
    }
    Ok(())
}

/// POST /users/ -- admin only.
pub(crate) async fn create_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ServerError> {
    state.policy.authorize(&principal, Operation::CreateUser)?;
    validate_username(&req.user_name)?;
    validate_password(&req.password)?;

    let password_hash = hash_password(&req.password).await?;
    let user = {
        let db = state.db.lock().await;
        db.create_user(&NewUser {
            username: req.user_name,
            password_hash,
            device_id: req.device_id,
            is_admin: req.is_admin.unwrap_or(false),
        })?
    };

    info!(
        id = user.id,
        username = %user.username,
        is_admin = user.is_admin,
        by = %principal.username,
        "User created"
    );
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /users/login -- credentials in the JSON body.
pub(crate) async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ServerError> {
    let principal = authenticate(&state, &req.user_name, &req.password).await?;

    info!(id = principal.id, username = %principal.username, "Login");
    Ok(Json(LoginResponse {
        user_id: principal.id,
        user_name: principal.username,
        is_admin: principal.is_admin,
    }))
}

/// GET /users/
pub(crate) async fn list_users(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<UserResponse>>, ServerError> {
    state.policy.authorize(&principal, Operation::ListUsers)?;

    let users = state.db.lock().await.list_users()?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// PUT /users/{id} -- the user themself or an admin. The admin flag is not
/// updatable here.
pub(crate) async fn update_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ServerError> {
    state
        .policy
        .authorize(&principal, Operation::UpdateUser { target_id: user_id })?;

    if let Some(name) = &req.user_name {
        validate_username(name)?;
    }
    let password_hash = match &req.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password).await?)
        }
        None => None,
    };

    let changes = UserChanges {
        username: req.user_name,
        password_hash,
        device_id: req.device_id,
    };
    let user = {
        let db = state.db.lock().await;
        db.update_user(user_id, &changes)
            .map_err(|e| ServerError::from_store(e, "User"))?
    };

    info!(id = user.id, by = %principal.username, "User updated");
    Ok(Json(user.into()))
}

/// DELETE /users/{id} -- admin only; admin accounts cannot be deleted.
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<StatusCode, ServerError> {
    // Non-admins are refused before learning whether the id exists.
    state.policy.authorize(
        &principal,
        Operation::DeleteUser {
            target_is_admin: false,
        },
    )?;

    let db = state.db.lock().await;
    let target = db
        .get_user(user_id)
        .map_err(|e| ServerError::from_store(e, "User"))?;

    state.policy.authorize(
        &principal,
        Operation::DeleteUser {
            target_is_admin: target.is_admin,
        },
    )?;

    if !db.delete_user(user_id)? {
        return Err(ServerError::NotFound("User not found".into()));
    }

    info!(id = user_id, username = %target.username, by = %principal.username, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::super::test_support::*;

    #[tokio::test]
    async fn test_admin_creates_user() {
        let ctx = TestContext::new().await;
        let (status, body) = ctx
            .send(json(
                Method::POST,
                "/users/",
                Some(ADMIN),
                json!({"userName": "testuser", "password": "test123", "deviceID": "device001"}),
            ))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["userName"], "testuser");
        assert_eq!(body["deviceID"], "device001");
        assert_eq!(body["isAdmin"], false);
        assert!(body["userID"].as_i64().unwrap() > 1);
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_400() {
        let ctx = TestContext::new().await;
        let (status, body) = ctx
            .send(json(
                Method::POST,
                "/users/",
                Some(ADMIN),
                json!({"userName": "admin", "password": "x"}),
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Username already exists");
    }

    #[tokio::test]
    async fn test_non_admin_cannot_create_user() {
        let ctx = TestContext::new().await;
        ctx.add_worker("worker", "pw").await;

        let (status, body) = ctx
            .send(json(
                Method::POST,
                "/users/",
                Some(("worker", "pw")),
                json!({"userName": "other", "password": "x"}),
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Admin privileges required");
    }

    #[tokio::test]
    async fn test_empty_username_rejected() {
        let ctx = TestContext::new().await;
        let (status, _) = ctx
            .send(json(
                Method::POST,
                "/users/",
                Some(ADMIN),
                json!({"userName": "  ", "password": "x"}),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login() {
        let ctx = TestContext::new().await;

        let (status, body) = ctx
            .send(json(
                Method::POST,
                "/users/login",
                None,
                json!({"userName": "admin", "password": "admin123"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userName"], "admin");
        assert_eq!(body["isAdmin"], true);

        let (status, body) = ctx
            .send(json(
                Method::POST,
                "/users/login",
                None,
                json!({"userName": "admin", "password": "wrong"}),
            ))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid username or password");
    }

    #[tokio::test]
    async fn test_any_user_lists_users() {
        let ctx = TestContext::new().await;
        ctx.add_worker("worker", "pw").await;

        let (status, body) = ctx.send(get("/users/", Some(("worker", "pw")))).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["userName"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["admin", "worker"]);
    }

    #[tokio::test]
    async fn test_self_update_and_new_password_works() {
        let ctx = TestContext::new().await;
        let id = ctx.add_worker("worker", "old").await;

        let (status, body) = ctx
            .send(json(
                Method::PUT,
                &format!("/users/{id}"),
                Some(("worker", "old")),
                json!({"password": "new", "deviceID": "phone-2"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deviceID"], "phone-2");

        let (status, _) = ctx.send(get("/users/", Some(("worker", "old")))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = ctx.send(get("/users/", Some(("worker", "new")))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_cannot_grant_admin() {
        let ctx = TestContext::new().await;
        let id = ctx.add_worker("worker", "pw").await;

        let (status, body) = ctx
            .send(json(
                Method::PUT,
                &format!("/users/{id}"),
                Some(("worker", "pw")),
                json!({"isAdmin": true}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isAdmin"], false);
    }

    #[tokio::test]
    async fn test_update_other_user_forbidden_unless_admin() {
        let ctx = TestContext::new().await;
        let alice = ctx.add_worker("alice", "pw").await;
        ctx.add_worker("bob", "pw").await;

        let (status, _) = ctx
            .send(json(
                Method::PUT,
                &format!("/users/{alice}"),
                Some(("bob", "pw")),
                json!({"deviceID": "stolen"}),
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = ctx
            .send(json(
                Method::PUT,
                &format!("/users/{alice}"),
                Some(ADMIN),
                json!({"userName": "alice2"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userName"], "alice2");
    }

    #[tokio::test]
    async fn test_update_missing_user_is_404() {
        let ctx = TestContext::new().await;
        let (status, body) = ctx
            .send(json(Method::PUT, "/users/999", Some(ADMIN), json!({})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "User not found");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let ctx = TestContext::new().await;
        let id = ctx.add_worker("worker", "pw").await;

        let (status, body) = ctx.send(delete(&format!("/users/{id}"), Some(ADMIN))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());

        let (status, _) = ctx.send(delete(&format!("/users/{id}"), Some(ADMIN))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_accounts_cannot_be_deleted() {
        let ctx = TestContext::new().await;
        let (status, body) = ctx.send(delete("/users/1", Some(ADMIN))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Cannot delete admin users");

        ctx.add_worker("worker", "pw").await;
        let (status, _) = ctx.send(delete("/users/1", Some(("worker", "pw")))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = ctx.send(get("/users/", Some(ADMIN))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_non_admin_delete_is_forbidden() {
        let ctx = TestContext::new().await;
        ctx.add_worker("worker", "pw").await;
        let victim = ctx.add_worker("victim", "pw").await;

        let (status, _) = ctx
            .send(delete(&format!("/users/{victim}"), Some(("worker", "pw"))))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = ctx.send(delete("/users/999", Some(("worker", "pw")))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
