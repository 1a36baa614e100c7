//! Report endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use civiq_common::AppResult;
use civiq_core::{CreateReportInput, ReportView};
use serde::Deserialize;

use crate::{extractors::CallerIdentity, middleware::AppState, response::ApiResponse};

/// Report creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub district_id: String,
    pub title: String,
    pub description: String,
    pub image_base64: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub reception_status: String,
}

/// Triage status update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitementStatusRequest {
    pub traitement_status: String,
}

/// File a new report.
async fn create_report(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Json(req): Json<CreateReportRequest>,
) -> AppResult<ApiResponse<ReportView>> {
    let view = state
        .report_service
        .create(
            &identity,
            CreateReportInput {
                district_id: req.district_id,
                title: req.title,
                description: req.description,
                image_base64: req.image_base64,
                latitude: req.latitude,
                longitude: req.longitude,
                reception_status: req.reception_status,
            },
        )
        .await?;
    Ok(ApiResponse::ok(view))
}

/// List the reports visible to the caller.
async fn list_reports(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ReportView>>> {
    let views = state.report_service.list_visible(&identity).await?;
    Ok(ApiResponse::ok(views))
}

/// List a target user's reports.
async fn list_reports_by_user(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<Vec<ReportView>>> {
    let views = state
        .report_service
        .list_for_user(&identity, &username)
        .await?;
    Ok(ApiResponse::ok(views))
}

/// List the reports filed in a district.
async fn list_reports_by_district(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<ReportView>>> {
    let views = state
        .report_service
        .list_for_district(&identity, &id)
        .await?;
    Ok(ApiResponse::ok(views))
}

/// Move a report through its triage state.
async fn update_traitement_status(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TraitementStatusRequest>,
) -> AppResult<ApiResponse<ReportView>> {
    let view = state
        .report_service
        .update_processing_status(&identity, &id, &req.traitement_status)
        .await?;
    Ok(ApiResponse::ok(view))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_report).get(list_reports))
        .route("/user/{username}", get(list_reports_by_user))
        .route("/district/{id}", get(list_reports_by_district))
        .route("/{id}/traitement-status", put(update_traitement_status))
}
