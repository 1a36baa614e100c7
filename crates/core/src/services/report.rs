//! Report lifecycle service.
//!
//! Owns report records, validates creation and status transitions against
//! the actor's role and district scope, and notifies the owning citizen on
//! every state change.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use civiq_common::{AppError, AppResult, IdGenerator};
use civiq_db::{
    entities::report::{self, ReceptionStatus, TraitementStatus},
    entities::user,
    repositories::{DistrictRepository, ReportRepository, UserRepository},
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ActiveEnum, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::gate::{AuthorizationGate, Identity, Role};
use crate::services::notification::NotificationService;

/// Optional data-URI header in front of a base64 image payload.
static DATA_URI_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/[^;]+;base64,").expect("valid regex"));

/// Input for filing a report.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportInput {
    pub district_id: String,

    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(min = 1))]
    pub description: String,

    /// Base64-encoded image, optionally prefixed with a data-URI header
    pub image_base64: Option<String>,

    pub latitude: f64,

    pub longitude: f64,

    /// Intake classification, `Reçu` or `Rejeté`
    pub reception_status: String,
}

/// Outgoing report representation.
///
/// The owner's username is attached only for AGENT viewers; the district
/// display name is always attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub district_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub reception_status: String,
    pub traitement_status: String,
    pub created_at: String,
}

/// Report lifecycle service.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    user_repo: UserRepository,
    district_repo: DistrictRepository,
    notification_service: NotificationService,
    gate: AuthorizationGate,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        user_repo: UserRepository,
        district_repo: DistrictRepository,
        notification_service: NotificationService,
        gate: AuthorizationGate,
    ) -> Self {
        Self {
            report_repo,
            user_repo,
            district_repo,
            notification_service,
            gate,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a new report. Only USER accounts can file.
    pub async fn create(
        &self,
        identity: &Identity,
        input: CreateReportInput,
    ) -> AppResult<ReportView> {
        let actor = self.gate.authorize(identity, &[Role::User]).await?;
        input.validate()?;

        if self
            .district_repo
            .find_by_id(&input.district_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "District not found: {}",
                input.district_id
            )));
        }

        let reception = ReceptionStatus::try_from_value(&input.reception_status).map_err(|_| {
            AppError::InvalidInput("Reception status must be one of: Reçu, Rejeté".to_string())
        })?;

        let image_base64 = normalize_image(input.image_base64.as_deref())?;

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(actor.id.clone()),
            district_id: Set(input.district_id),
            title: Set(input.title),
            description: Set(input.description),
            image_base64: Set(image_base64),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            reception_status: Set(reception),
            traitement_status: Set(TraitementStatus::EnAttente),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = self.report_repo.create(model).await?;

        self.notification_service
            .notify_report(
                &actor.id,
                &created.id,
                &format!("Signalement créé: {}", created.title),
            )
            .await?;

        tracing::info!(report_id = %created.id, username = %actor.username, "Report created");
        self.to_view(created, &actor, &actor).await
    }

    /// List the reports visible to the caller.
    ///
    /// Agents see their own district; citizens see every report. Admins are
    /// rejected outright: reports are not an admin concern.
    pub async fn list_visible(&self, identity: &Identity) -> AppResult<Vec<ReportView>> {
        let actor = self
            .gate
            .authorize(identity, &[Role::User, Role::Agent])
            .await?;

        let reports = if actor.role == Role::Agent {
            let district_id = actor.district_id.as_deref().ok_or_else(|| {
                AppError::InvalidState(
                    "Agent must be associated with a district".to_string(),
                )
            })?;
            self.report_repo.find_by_district(district_id).await?
        } else {
            self.report_repo.find_all().await?
        };

        self.to_views(reports, &actor).await
    }

    /// List a target user's reports.
    ///
    /// Citizens may only target themselves; agents see the target's reports
    /// within their own district.
    pub async fn list_for_user(
        &self,
        identity: &Identity,
        target_username: &str,
    ) -> AppResult<Vec<ReportView>> {
        let actor = self
            .gate
            .authorize(identity, &[Role::User, Role::Agent])
            .await?;

        let target = self.user_repo.get_by_username(target_username).await?;

        if actor.role == Role::User && actor.username != target_username {
            tracing::warn!(
                username = %actor.username,
                target = target_username,
                "User attempted to list another user's reports"
            );
            return Err(AppError::Forbidden(
                "Users can only view their own reports".to_string(),
            ));
        }

        let reports = if actor.role == Role::Agent {
            let district_id = actor.district_id.as_deref().ok_or_else(|| {
                AppError::InvalidState(
                    "Agent must be associated with a district".to_string(),
                )
            })?;
            self.report_repo
                .find_by_user_and_district(&target.id, district_id)
                .await?
        } else {
            self.report_repo.find_by_user(&target.id).await?
        };

        let mut views = Vec::with_capacity(reports.len());
        for report in reports {
            views.push(self.to_view(report, &target, &actor).await?);
        }
        Ok(views)
    }

    /// List the reports filed in a district.
    ///
    /// Agents may only target their own district.
    pub async fn list_for_district(
        &self,
        identity: &Identity,
        district_id: &str,
    ) -> AppResult<Vec<ReportView>> {
        let actor = self
            .gate
            .authorize_scoped(identity, &[Role::User, Role::Agent], |account| {
                account.role != Role::Agent
                    || account.district_id.as_deref() == Some(district_id)
            })
            .await?;

        if self.district_repo.find_by_id(district_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "District not found: {district_id}"
            )));
        }

        let reports = self.report_repo.find_by_district(district_id).await?;
        self.to_views(reports, &actor).await
    }

    /// Move a report through its triage state. AGENT only, own district only.
    pub async fn update_processing_status(
        &self,
        identity: &Identity,
        report_id: &str,
        status: &str,
    ) -> AppResult<ReportView> {
        let actor = self.gate.authorize(identity, &[Role::Agent]).await?;

        let new_status = TraitementStatus::try_from_value(&status.to_string()).map_err(|_| {
            AppError::InvalidInput(
                "Traitement status must be one of: En attente, Traité".to_string(),
            )
        })?;

        let report = self.report_repo.get_by_id(report_id).await?;

        if actor.district_id.as_deref() != Some(report.district_id.as_str()) {
            tracing::warn!(
                username = %actor.username,
                report_id = report_id,
                "Agent attempted to update a report outside their district"
            );
            return Err(AppError::Forbidden(
                "Agent can only update reports in their district".to_string(),
            ));
        }

        let mut active: report::ActiveModel = report.into();
        active.traitement_status = Set(new_status.clone());
        let updated = self.report_repo.update(active).await?;

        let owner = self.user_repo.get_by_id(&updated.user_id).await?;
        self.notification_service
            .notify_report(
                &owner.id,
                &updated.id,
                &format!("Signalement status updated to: {}", new_status.to_value()),
            )
            .await?;

        tracing::info!(
            report_id = %updated.id,
            status = %new_status.to_value(),
            username = %actor.username,
            "Report status updated"
        );
        self.to_view(updated, &owner, &actor).await
    }

    /// Build the outgoing representation of a report.
    async fn to_view(
        &self,
        report: report::Model,
        owner: &user::Model,
        viewer: &user::Model,
    ) -> AppResult<ReportView> {
        let district_name = self
            .district_repo
            .find_by_id(&report.district_id)
            .await?
            .map(|d| d.name);

        let username = (viewer.role == Role::Agent).then(|| owner.username.clone());

        Ok(ReportView {
            id: report.id,
            district_id: report.district_id,
            district_name,
            username,
            title: report.title,
            description: report.description,
            image_base64: report.image_base64,
            latitude: report.latitude,
            longitude: report.longitude,
            reception_status: report.reception_status.to_value(),
            traitement_status: report.traitement_status.to_value(),
            created_at: report.created_at.to_rfc3339(),
        })
    }

    /// Build views for a batch of reports, resolving each owner.
    async fn to_views(
        &self,
        reports: Vec<report::Model>,
        viewer: &user::Model,
    ) -> AppResult<Vec<ReportView>> {
        let mut views = Vec::with_capacity(reports.len());
        for report in reports {
            let owner = self.user_repo.get_by_id(&report.user_id).await?;
            views.push(self.to_view(report, &owner, viewer).await?);
        }
        Ok(views)
    }
}

/// Validate an optional base64 image payload and normalize empty to `None`.
///
/// A leading `data:image/...;base64,` header is stripped before decode
/// validation, but the returned value is the caller's original string.
fn normalize_image(image: Option<&str>) -> AppResult<Option<String>> {
    match image {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => {
            let cleaned = DATA_URI_PREFIX.replace(s, "");
            BASE64
                .decode(cleaned.as_bytes())
                .map_err(|e| AppError::InvalidInput(format!("Invalid base64 image format: {e}")))?;
            Ok(Some(s.to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use civiq_db::entities::district::{self, DistrictStatus};
    use civiq_db::entities::user::AccountStatus;
    use civiq_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn test_account(id: &str, username: &str, role: Role) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            role,
            status: AccountStatus::Active,
            district_id: None,
            created_at: Utc::now().into(),
        }
    }

    fn test_agent(id: &str, username: &str, district_id: &str) -> user::Model {
        let mut agent = test_account(id, username, Role::Agent);
        agent.district_id = Some(district_id.to_string());
        agent
    }

    fn test_district(id: &str) -> district::Model {
        district::Model {
            id: id.to_string(),
            name: "Plateau".to_string(),
            country: "Côte d'Ivoire".to_string(),
            region: "Abidjan".to_string(),
            status: DistrictStatus::Active,
            geo: r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[0.0,1.0],[1.0,1.0],[1.0,0.0],[0.0,0.0]]]}"#.to_string(),
            area: 1.0,
            centroid: json!([0.5, 0.5]),
            created_at: Utc::now().into(),
        }
    }

    fn test_report(id: &str, user_id: &str, district_id: &str) -> report::Model {
        report::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            district_id: district_id.to_string(),
            title: "Lampadaire cassé".to_string(),
            description: "Le lampadaire ne fonctionne plus".to_string(),
            image_base64: None,
            latitude: 5.32,
            longitude: -4.02,
            reception_status: ReceptionStatus::Recu,
            traitement_status: TraitementStatus::EnAttente,
            created_at: Utc::now().into(),
        }
    }

    fn test_notification(id: &str, user_id: &str, report_id: &str) -> civiq_db::entities::notification::Model {
        civiq_db::entities::notification::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            report_id: Some(report_id.to_string()),
            message: "message".to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    fn service_on(db: Arc<sea_orm::DatabaseConnection>) -> ReportService {
        ReportService::new(
            ReportRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            DistrictRepository::new(db.clone()),
            NotificationService::new(
                NotificationRepository::new(db.clone()),
                UserRepository::new(db.clone()),
            ),
            AuthorizationGate::new(UserRepository::new(db)),
        )
    }

    fn create_input(district_id: &str, reception_status: &str) -> CreateReportInput {
        CreateReportInput {
            district_id: district_id.to_string(),
            title: "Lampadaire cassé".to_string(),
            description: "Le lampadaire ne fonctionne plus".to_string(),
            image_base64: None,
            latitude: 5.32,
            longitude: -4.02,
            reception_status: reception_status.to_string(),
        }
    }

    #[test]
    fn test_normalize_image_absent_and_empty() {
        assert_eq!(normalize_image(None).unwrap(), None);
        assert_eq!(normalize_image(Some("")).unwrap(), None);
    }

    #[test]
    fn test_normalize_image_plain_base64() {
        let value = normalize_image(Some("aGVsbG8=")).unwrap();
        assert_eq!(value.as_deref(), Some("aGVsbG8="));
    }

    #[test]
    fn test_normalize_image_keeps_data_uri_prefix() {
        let input = "data:image/png;base64,aGVsbG8=";
        let value = normalize_image(Some(input)).unwrap();
        // Stored value keeps the caller's prefix.
        assert_eq!(value.as_deref(), Some(input));
    }

    #[test]
    fn test_normalize_image_invalid_base64() {
        assert!(matches!(
            normalize_image(Some("not base64!!")),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            normalize_image(Some("data:image/png;base64,not base64!!")),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_create_requires_user_role() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_agent("g1", "bob", "d1")]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .create(&Identity::new("bob", Role::Agent), create_input("d1", "Reçu"))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_missing_district_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("u1", "alice", Role::User)]])
                .append_query_results([Vec::<district::Model>::new()])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .create(&Identity::new("alice", Role::User), create_input("missing", "Reçu"))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_invalid_reception_status() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("u1", "alice", Role::User)]])
                .append_query_results([vec![test_district("d1")]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .create(&Identity::new("alice", Role::User), create_input("d1", "Accepté"))
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_starts_pending_and_notifies_creator() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // authorize: alice lookup
                .append_query_results([vec![test_account("u1", "alice", Role::User)]])
                // district existence check
                .append_query_results([vec![test_district("d1")]])
                // INSERT..RETURNING report
                .append_query_results([vec![test_report("r1", "u1", "d1")]])
                // INSERT..RETURNING notification
                .append_query_results([vec![test_notification("n1", "u1", "r1")]])
                // to_view district name lookup
                .append_query_results([vec![test_district("d1")]])
                .into_connection(),
        );
        let service = service_on(db);

        let view = service
            .create(&Identity::new("alice", Role::User), create_input("d1", "Reçu"))
            .await
            .unwrap();

        assert_eq!(view.traitement_status, "En attente");
        assert_eq!(view.reception_status, "Reçu");
        assert_eq!(view.district_name.as_deref(), Some("Plateau"));
        // The creator is a USER viewer: no reporter identity attached.
        assert!(view.username.is_none());
    }

    #[tokio::test]
    async fn test_list_visible_rejects_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("a1", "root", Role::Admin)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service.list_visible(&Identity::new("root", Role::Admin)).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_visible_agent_without_district_is_invalid_state() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("g1", "bob", Role::Agent)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service.list_visible(&Identity::new("bob", Role::Agent)).await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_list_visible_agent_sees_reporter_identity() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // authorize: agent lookup
                .append_query_results([vec![test_agent("g1", "bob", "d1")]])
                // district-scoped report query
                .append_query_results([vec![test_report("r1", "u1", "d1")]])
                // owner lookup
                .append_query_results([vec![test_account("u1", "alice", Role::User)]])
                // district name lookup
                .append_query_results([vec![test_district("d1")]])
                .into_connection(),
        );
        let service = service_on(db);

        let views = service
            .list_visible(&Identity::new("bob", Role::Agent))
            .await
            .unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_list_for_user_rejects_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("a1", "root", Role::Admin)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .list_for_user(&Identity::new("root", Role::Admin), "alice")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_for_district_rejects_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("a1", "root", Role::Admin)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .list_for_district(&Identity::new("root", Role::Admin), "d1")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_for_user_rejects_other_target_for_users() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![test_account("u1", "alice", Role::User)],
                    vec![test_account("u2", "dave", Role::User)],
                ])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .list_for_user(&Identity::new("alice", Role::User), "dave")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_for_user_unknown_target_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![test_account("u1", "alice", Role::User)],
                    Vec::<user::Model>::new(),
                ])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .list_for_user(&Identity::new("alice", Role::User), "ghost")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_for_district_rejects_agent_outside_district() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_agent("g1", "carol", "d2")]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .list_for_district(&Identity::new("carol", Role::Agent), "d1")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_status_rejects_user_role() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("u1", "alice", Role::User)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .update_processing_status(&Identity::new("alice", Role::User), "r1", "Traité")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_status_rejects_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("a1", "root", Role::Admin)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .update_processing_status(&Identity::new("root", Role::Admin), "r1", "Traité")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_status_rejects_unknown_value() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_agent("g1", "bob", "d1")]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .update_processing_status(&Identity::new("bob", Role::Agent), "r1", "Résolu")
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_update_status_rejects_agent_from_other_district() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_agent("g2", "carol", "d2")]])
                .append_query_results([vec![test_report("r1", "u1", "d1")]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .update_processing_status(&Identity::new("carol", Role::Agent), "r1", "Traité")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_status_notifies_owner() {
        let mut updated = test_report("r1", "u1", "d1");
        updated.traitement_status = TraitementStatus::Traite;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // authorize: agent lookup
                .append_query_results([vec![test_agent("g1", "bob", "d1")]])
                // report fetch + UPDATE..RETURNING
                .append_query_results([vec![test_report("r1", "u1", "d1")], vec![updated]])
                // owner lookup
                .append_query_results([vec![test_account("u1", "alice", Role::User)]])
                // INSERT..RETURNING notification
                .append_query_results([vec![test_notification("n1", "u1", "r1")]])
                // district name lookup
                .append_query_results([vec![test_district("d1")]])
                .into_connection(),
        );
        let service = service_on(db);

        let view = service
            .update_processing_status(&Identity::new("bob", Role::Agent), "r1", "Traité")
            .await
            .unwrap();

        assert_eq!(view.traitement_status, "Traité");
        // An AGENT viewer sees the reporter's identity.
        assert_eq!(view.username.as_deref(), Some("alice"));
    }
}
