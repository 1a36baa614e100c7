//! Administration endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use civiq_common::AppResult;
use civiq_core::{CreateDistrictInput, RegisterAgentInput};
use civiq_db::entities::district::{self, DistrictStatus};
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::auth::UserResponse, extractors::CallerIdentity, middleware::AppState,
    response::ApiResponse,
};

/// Agent registration request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAgentRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub district_id: String,
}

/// Status update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// District creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDistrictRequest {
    pub name: String,
    pub country: String,
    pub region: String,
    pub status: String,
    pub geo: String,
    pub area: f64,
    pub centroid: serde_json::Value,
}

/// District response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictResponse {
    pub id: String,
    pub name: String,
    pub country: String,
    pub region: String,
    pub status: String,
    pub geo: String,
    pub area: f64,
    pub centroid: serde_json::Value,
    pub created_at: String,
}

impl From<district::Model> for DistrictResponse {
    fn from(district: district::Model) -> Self {
        Self {
            id: district.id,
            name: district.name,
            country: district.country,
            region: district.region,
            status: match district.status {
                DistrictStatus::Active => "ACTIVE".to_string(),
                DistrictStatus::Inactive => "INACTIVE".to_string(),
            },
            geo: district.geo,
            area: district.area,
            centroid: district.centroid,
            created_at: district.created_at.to_rfc3339(),
        }
    }
}

/// Register a district agent.
async fn register_agent(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Json(req): Json<RegisterAgentRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let agent = state
        .account_service
        .register_agent(
            &identity,
            RegisterAgentInput {
                username: req.username,
                email: req.email,
                password: req.password,
                district_id: req.district_id,
            },
        )
        .await?;
    Ok(ApiResponse::ok(agent.into()))
}

/// List all USER and AGENT accounts.
async fn list_users(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state
        .account_service
        .list_reportable_accounts(&identity)
        .await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// Set an account's status.
async fn update_user_status(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .account_service
        .set_account_status(&identity, &username, &req.status)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Create a district.
async fn create_district(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Json(req): Json<CreateDistrictRequest>,
) -> AppResult<ApiResponse<DistrictResponse>> {
    let district = state
        .district_service
        .create(
            &identity,
            CreateDistrictInput {
                name: req.name,
                country: req.country,
                region: req.region,
                status: req.status,
                geo: req.geo,
                area: req.area,
                centroid: req.centroid,
            },
        )
        .await?;
    Ok(ApiResponse::ok(district.into()))
}

/// List all districts, oldest first.
async fn list_districts(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<DistrictResponse>>> {
    let districts = state.district_service.list_all().await?;
    Ok(ApiResponse::ok(
        districts.into_iter().map(Into::into).collect(),
    ))
}

/// Set a district's status.
async fn update_district_status(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> AppResult<ApiResponse<DistrictResponse>> {
    let district = state
        .district_service
        .set_status(&identity, &id, &req.status)
        .await?;
    Ok(ApiResponse::ok(district.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register_agent))
        .route("/users", get(list_users))
        .route("/users/{username}/status", put(update_user_status))
        .route("/districts", post(create_district).get(list_districts))
        .route("/districts/{id}/status", put(update_district_status))
}
