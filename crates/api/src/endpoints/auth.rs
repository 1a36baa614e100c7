//! Authentication endpoints.

use axum::{extract::State, routing::post, Json, Router};
use civiq_common::AppResult;
use civiq_core::RegisterUserInput;
use civiq_db::entities::user::{self, AccountStatus, Role};
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Registration request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Account response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_id: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: role_to_string(&user.role),
            status: status_to_string(&user.status),
            district_id: user.district_id,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

pub(crate) fn role_to_string(role: &Role) -> String {
    match role {
        Role::User => "USER".to_string(),
        Role::Agent => "AGENT".to_string(),
        Role::Admin => "ADMIN".to_string(),
    }
}

pub(crate) fn status_to_string(status: &AccountStatus) -> String {
    match status {
        AccountStatus::Active => "ACTIVE".to_string(),
        AccountStatus::Blocked => "BLOCKED".to_string(),
    }
}

/// Register a new citizen account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .account_service
        .register_user(RegisterUserInput {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Verify a username/password pair.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .account_service
        .authenticate(&req.username, &req.password)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
