//! User self-service endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use civiq_common::AppResult;
use civiq_core::UpdateProfileInput;
use serde::Deserialize;

use crate::{
    endpoints::auth::UserResponse, extractors::CallerIdentity, middleware::AppState,
    response::ApiResponse,
};

/// Profile update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Update the caller's own email and/or password.
async fn update_profile(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .account_service
        .update_profile(
            &identity,
            UpdateProfileInput {
                email: req.email,
                password: req.password,
            },
        )
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Get an account by ID.
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.account_service.get_user(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", put(update_profile))
        .route("/{id}", get(get_user))
}
