//! Account directory service.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use civiq_common::{AppError, AppResult, IdGenerator};
use civiq_db::{
    entities::district::DistrictStatus,
    entities::user::{self, AccountStatus, Role},
    repositories::{DistrictRepository, UserRepository},
};
use sea_orm::{ActiveEnum, Set};
use serde::Deserialize;
use validator::Validate;

use crate::services::gate::{AuthorizationGate, Identity};
use crate::services::notification::NotificationService;

/// Input for citizen self-registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email, length(max = 256))]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Input for admin-driven agent registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAgentInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email, length(max = 256))]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,

    pub district_id: String,
}

/// Input for profile self-service updates.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(email, length(max = 256))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub password: Option<String>,
}

/// Account directory service.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    district_repo: DistrictRepository,
    notification_service: NotificationService,
    gate: AuthorizationGate,
    id_gen: IdGenerator,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        district_repo: DistrictRepository,
        notification_service: NotificationService,
        gate: AuthorizationGate,
    ) -> Self {
        Self {
            user_repo,
            district_repo,
            notification_service,
            gate,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new citizen account. Role is always USER.
    pub async fn register_user(&self, input: RegisterUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
            || self.user_repo.find_by_email(&input.email).await?.is_some()
        {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(password_hash),
            role: Set(Role::User),
            status: Set(AccountStatus::Active),
            district_id: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;

        self.notification_service
            .notify_account(&user.id, "Vous vous êtes inscrit avec succès")
            .await?;

        tracing::info!(username = %user.username, "User registered");
        Ok(user)
    }

    /// Register a district agent. ADMIN only; the district must exist.
    pub async fn register_agent(
        &self,
        identity: &Identity,
        input: RegisterAgentInput,
    ) -> AppResult<user::Model> {
        self.gate.authorize(identity, &[Role::Admin]).await?;
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
            || self.user_repo.find_by_email(&input.email).await?.is_some()
        {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        if self
            .district_repo
            .find_by_id(&input.district_id)
            .await?
            .is_none()
        {
            return Err(AppError::InvalidInput(format!(
                "Agent registration requires an existing district: {}",
                input.district_id
            )));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(hash_password(&input.password)?),
            role: Set(Role::Agent),
            status: Set(AccountStatus::Active),
            district_id: Set(Some(input.district_id)),
            created_at: Set(chrono::Utc::now().into()),
        };

        let agent = self.user_repo.create(model).await?;

        tracing::info!(
            username = %agent.username,
            district_id = ?agent.district_id,
            "Agent registered"
        );
        Ok(agent)
    }

    /// Update the caller's own email and/or password.
    pub async fn update_profile(
        &self,
        identity: &Identity,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        let account = self.gate.authorize(identity, &[]).await?;
        input.validate()?;

        if let Some(ref email) = input.email {
            if let Some(existing) = self.user_repo.find_by_email(email).await? {
                if existing.id != account.id {
                    return Err(AppError::Conflict("Email already in use".to_string()));
                }
            }
        }

        if input.email.is_none() && input.password.is_none() {
            return Ok(account);
        }

        let role = account.role.clone();
        let user_id = account.id.clone();
        let mut active: user::ActiveModel = account.into();
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(password) = input.password {
            active.password_hash = Set(hash_password(&password)?);
        }

        let updated = self.user_repo.update(active).await?;

        if role == Role::User {
            self.notification_service
                .notify_account(&user_id, "Votre profil a été mis à jour")
                .await?;
        }

        tracing::info!(username = %updated.username, "Profile updated");
        Ok(updated)
    }

    /// Set an account's status. ADMIN only.
    ///
    /// An AGENT can only be reactivated while its district is ACTIVE.
    pub async fn set_account_status(
        &self,
        identity: &Identity,
        username: &str,
        status: &str,
    ) -> AppResult<user::Model> {
        self.gate.authorize(identity, &[Role::Admin]).await?;

        let target = self.user_repo.get_by_username(username).await?;

        let new_status = AccountStatus::try_from_value(&status.to_string())
            .map_err(|_| AppError::InvalidInput(format!("Invalid status: {status}")))?;

        if new_status == AccountStatus::Active && target.role == Role::Agent {
            let district = match target.district_id.as_deref() {
                Some(district_id) => self.district_repo.find_by_id(district_id).await?,
                None => None,
            };
            let district_active =
                district.is_some_and(|d| d.status == DistrictStatus::Active);
            if !district_active {
                return Err(AppError::InvalidState(
                    "Cannot activate agent: associated district is INACTIVE or does not exist"
                        .to_string(),
                ));
            }
        }

        let role = target.role.clone();
        let user_id = target.id.clone();
        let mut active: user::ActiveModel = target.into();
        active.status = Set(new_status.clone());
        let updated = self.user_repo.update(active).await?;

        if role == Role::User {
            self.notification_service
                .notify_account(
                    &user_id,
                    &format!("Votre statut a été mis à jour à : {}", new_status.to_value()),
                )
                .await?;
        }

        tracing::info!(username = username, status = %new_status.to_value(), "Account status updated");
        Ok(updated)
    }

    /// Block every agent assigned to a district.
    ///
    /// Invoked by the district registry when a district goes INACTIVE.
    /// Idempotent: already-blocked agents are left untouched and no
    /// notifications are emitted on this path.
    pub async fn cascade_block_agents_for_district(&self, district_id: &str) -> AppResult<()> {
        let agents = self.user_repo.find_agents_by_district(district_id).await?;

        for agent in agents {
            if agent.status == AccountStatus::Blocked {
                continue;
            }
            let username = agent.username.clone();
            let mut active: user::ActiveModel = agent.into();
            active.status = Set(AccountStatus::Blocked);
            self.user_repo.update(active).await?;
            tracing::info!(
                username = %username,
                district_id = district_id,
                "Agent blocked by district deactivation"
            );
        }

        Ok(())
    }

    /// List all USER and AGENT accounts. ADMIN only.
    pub async fn list_reportable_accounts(
        &self,
        identity: &Identity,
    ) -> AppResult<Vec<user::Model>> {
        self.gate.authorize(identity, &[Role::Admin]).await?;
        self.user_repo
            .find_by_roles(vec![Role::User, Role::Agent])
            .await
    }

    /// Verify a username/password pair, returning the account on success.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Get an account by ID.
    pub async fn get_user(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }
}

/// Hash a password with argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use civiq_db::entities::district;
    use civiq_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
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

    fn test_district(id: &str, status: DistrictStatus) -> district::Model {
        district::Model {
            id: id.to_string(),
            name: "Plateau".to_string(),
            country: "Côte d'Ivoire".to_string(),
            region: "Abidjan".to_string(),
            status,
            geo: r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[0.0,1.0],[1.0,1.0],[1.0,0.0],[0.0,0.0]]]}"#.to_string(),
            area: 1.0,
            centroid: serde_json::json!([0.5, 0.5]),
            created_at: Utc::now().into(),
        }
    }

    fn service_on(db: Arc<sea_orm::DatabaseConnection>) -> AccountService {
        AccountService::new(
            UserRepository::new(db.clone()),
            DistrictRepository::new(db.clone()),
            NotificationService::new(
                NotificationRepository::new(db.clone()),
                UserRepository::new(db.clone()),
            ),
            AuthorizationGate::new(UserRepository::new(db)),
        )
    }

    #[tokio::test]
    async fn test_register_user_succeeds_and_notifies() {
        let welcome = civiq_db::entities::notification::Model {
            id: "n1".to_string(),
            user_id: "u1".to_string(),
            report_id: None,
            message: "Vous vous êtes inscrit avec succès".to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // username free, email free
                .append_query_results([Vec::<user::Model>::new(), Vec::<user::Model>::new()])
                // INSERT..RETURNING user
                .append_query_results([vec![test_account("u1", "alice", Role::User)]])
                // INSERT..RETURNING notification
                .append_query_results([vec![welcome]])
                .into_connection(),
        );
        let service = service_on(db);

        let user = service
            .register_user(RegisterUserInput {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.status, AccountStatus::Active);
        assert!(user.district_id.is_none());
    }

    #[tokio::test]
    async fn test_register_user_duplicate_username_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("u1", "alice", Role::User)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .register_user(RegisterUserInput {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_user_duplicate_email_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([vec![test_account("u1", "someone", Role::User)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .register_user(RegisterUserInput {
                username: "alice".to_string(),
                email: "someone@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_agent_requires_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("u1", "alice", Role::User)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .register_agent(
                &Identity::new("alice", Role::User),
                RegisterAgentInput {
                    username: "bob".to_string(),
                    email: "bob@example.com".to_string(),
                    password: "pw".to_string(),
                    district_id: "d1".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_register_agent_unknown_district_is_invalid() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![test_account("a1", "root", Role::Admin)],
                    Vec::<user::Model>::new(),
                    Vec::<user::Model>::new(),
                ])
                .append_query_results([Vec::<district::Model>::new()])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .register_agent(
                &Identity::new("root", Role::Admin),
                RegisterAgentInput {
                    username: "bob".to_string(),
                    email: "bob@example.com".to_string(),
                    password: "pw".to_string(),
                    district_id: "missing".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_set_account_status_rejects_unknown_value() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    vec![test_account("a1", "root", Role::Admin)],
                    vec![test_account("u1", "alice", Role::User)],
                ])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .set_account_status(&Identity::new("root", Role::Admin), "alice", "SUSPENDED")
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_activate_agent_under_inactive_district_is_invalid_state() {
        let mut agent = test_account("g1", "bob", Role::Agent);
        agent.district_id = Some("d1".to_string());
        agent.status = AccountStatus::Blocked;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_account("a1", "root", Role::Admin)], vec![agent]])
                .append_query_results([vec![test_district("d1", DistrictStatus::Inactive)]])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service
            .set_account_status(&Identity::new("root", Role::Admin), "bob", "ACTIVE")
            .await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_cascade_block_skips_already_blocked_agents() {
        let mut blocked = test_account("g1", "bob", Role::Agent);
        blocked.district_id = Some("d1".to_string());
        blocked.status = AccountStatus::Blocked;

        let mut active = test_account("g2", "carol", Role::Agent);
        active.district_id = Some("d1".to_string());

        let mut after = active.clone();
        after.status = AccountStatus::Blocked;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // One SELECT for the agents, one UPDATE..RETURNING for carol only.
                .append_query_results([vec![blocked, active], vec![after]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = service_on(db);

        service.cascade_block_agents_for_district("d1").await.unwrap();
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user_is_unauthorized() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = service_on(db);

        let result = service.authenticate("ghost", "pw").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("secret").unwrap();

        assert!(verify_password("secret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
