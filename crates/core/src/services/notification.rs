//! Notification sink service.
//!
//! Append-only per-user message log. Other services write into it when they
//! mutate state; only the owning user reads, acknowledges, or deletes
//! entries.

use civiq_common::{AppError, AppResult, IdGenerator};
use civiq_db::{
    entities::notification,
    repositories::{NotificationRepository, UserRepository},
};
use sea_orm::Set;

use crate::services::gate::Identity;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository, user_repo: UserRepository) -> Self {
        Self {
            notification_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a notification referencing a report.
    pub async fn notify_report(
        &self,
        user_id: &str,
        report_id: &str,
        message: &str,
    ) -> AppResult<notification::Model> {
        self.create_internal(user_id, Some(report_id), message).await
    }

    /// Create an account-level notification (no source report).
    pub async fn notify_account(
        &self,
        user_id: &str,
        message: &str,
    ) -> AppResult<notification::Model> {
        self.create_internal(user_id, None, message).await
    }

    /// Internal helper to create notifications.
    async fn create_internal(
        &self,
        user_id: &str,
        report_id: Option<&str>,
        message: &str,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            report_id: Set(report_id.map(std::string::ToString::to_string)),
            message: Set(message.to_string()),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.notification_repo.create(model).await
    }

    /// Get the caller's notifications.
    pub async fn list_for_user(&self, identity: &Identity) -> AppResult<Vec<notification::Model>> {
        let user = self.user_repo.get_by_username(&identity.username).await?;
        self.notification_repo.find_by_user(&user.id).await
    }

    /// Mark one of the caller's notifications as read.
    pub async fn mark_as_read(
        &self,
        identity: &Identity,
        notification_id: &str,
    ) -> AppResult<notification::Model> {
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Notification not found: {notification_id}"))
            })?;

        let user = self.user_repo.get_by_username(&identity.username).await?;
        if notification.user_id != user.id {
            tracing::warn!(
                username = %identity.username,
                notification_id = notification_id,
                "Attempt to read another user's notification"
            );
            return Err(AppError::Forbidden(
                "Notification belongs to another user".to_string(),
            ));
        }

        self.notification_repo
            .mark_as_read(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification not found: {notification_id}")))
    }

    /// Delete one of the caller's notifications.
    pub async fn delete(&self, identity: &Identity, notification_id: &str) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Notification not found: {notification_id}"))
            })?;

        let user = self.user_repo.get_by_username(&identity.username).await?;
        if notification.user_id != user.id {
            tracing::warn!(
                username = %identity.username,
                notification_id = notification_id,
                "Attempt to delete another user's notification"
            );
            return Err(AppError::Forbidden(
                "Notification belongs to another user".to_string(),
            ));
        }

        self.notification_repo.delete(notification_id).await
    }
}
