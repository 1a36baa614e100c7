//! District lookup endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use civiq_common::AppResult;

use crate::{endpoints::admin::DistrictResponse, middleware::AppState, response::ApiResponse};

/// List all districts, oldest first.
async fn list_districts(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<DistrictResponse>>> {
    let districts = state.district_service.list_all().await?;
    Ok(ApiResponse::ok(
        districts.into_iter().map(Into::into).collect(),
    ))
}

/// Get a district by ID.
async fn get_district(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DistrictResponse>> {
    let district = state.district_service.get_by_id(&id).await?;
    Ok(ApiResponse::ok(district.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_districts))
        .route("/{id}", get(get_district))
}
