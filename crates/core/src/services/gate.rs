//! Authorization gate.
//!
//! Every role- and scope-check in the system goes through this single
//! abstraction so the access rules stay auditable in one place. The gate
//! resolves the caller's identity against the account directory and checks
//! the account's *current* role, not whatever role the transport claimed.

use civiq_common::{AppError, AppResult};
use civiq_db::{entities::user, repositories::UserRepository};
use serde::{Deserialize, Serialize};

pub use civiq_db::entities::user::Role;

/// Resolved caller identity, as handed over by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// External identity key.
    pub username: String,
    /// Role the transport resolved for the caller.
    pub role: Role,
}

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Authorization gate evaluating role and scope requirements.
#[derive(Clone)]
pub struct AuthorizationGate {
    user_repo: UserRepository,
}

impl AuthorizationGate {
    /// Create a new authorization gate.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Resolve the identity to its current account and check its role.
    ///
    /// Fails with `Unauthorized` when the identity does not resolve to an
    /// account, and with `Forbidden` when `required_roles` is non-empty and
    /// the account's current role is not in it. An empty `required_roles`
    /// accepts any role.
    pub async fn authorize(
        &self,
        identity: &Identity,
        required_roles: &[Role],
    ) -> AppResult<user::Model> {
        let account = self
            .user_repo
            .find_by_username(&identity.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !required_roles.is_empty() && !required_roles.contains(&account.role) {
            tracing::warn!(
                username = %identity.username,
                role = ?account.role,
                "Role not permitted for this operation"
            );
            return Err(AppError::Forbidden(
                "Role not permitted for this operation".to_string(),
            ));
        }

        Ok(account)
    }

    /// As [`Self::authorize`], then evaluate a scope predicate on the account.
    ///
    /// Fails with `Forbidden` when the predicate rejects the account.
    pub async fn authorize_scoped<F>(
        &self,
        identity: &Identity,
        required_roles: &[Role],
        scope_check: F,
    ) -> AppResult<user::Model>
    where
        F: FnOnce(&user::Model) -> bool,
    {
        let account = self.authorize(identity, required_roles).await?;

        if !scope_check(&account) {
            tracing::warn!(username = %identity.username, "Scope check rejected the operation");
            return Err(AppError::Forbidden(
                "Operation outside the caller's scope".to_string(),
            ));
        }

        Ok(account)
    }
}
