//! Notification endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Router,
};
use civiq_common::AppResult;
use civiq_db::entities::notification;
use serde::Serialize;

use crate::{extractors::CallerIdentity, middleware::AppState, response::ApiResponse};

/// Notification response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            user_id: n.user_id,
            report_id: n.report_id,
            message: n.message,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Get the caller's notifications.
async fn list_notifications(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let notifications = state.notification_service.list_for_user(&identity).await?;
    Ok(ApiResponse::ok(
        notifications.into_iter().map(Into::into).collect(),
    ))
}

/// Mark a notification as read.
async fn mark_as_read(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    let notification = state
        .notification_service
        .mark_as_read(&identity, &id)
        .await?;
    Ok(ApiResponse::ok(notification.into()))
}

/// Delete a notification.
async fn delete_notification(
    CallerIdentity(identity): CallerIdentity,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.notification_service.delete(&identity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/{id}/status", put(mark_as_read))
        .route("/{id}", delete(delete_notification))
}
