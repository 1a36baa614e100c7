//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use civiq_core::Identity;
use civiq_db::entities::user::Role;

/// Caller identity extractor.
///
/// The transport hands the resolved identity over in the `X-Username` and
/// `X-Role` headers. The claimed role is advisory: the authorization gate
/// re-resolves the account's current role before every check.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Identity);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get("x-username")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))?;

        let role = parts
            .headers
            .get("x-role")
            .and_then(|value| value.to_str().ok())
            .map_or(Role::User, |value| match value {
                "ADMIN" => Role::Admin,
                "AGENT" => Role::Agent,
                _ => Role::User,
            });

        Ok(Self(Identity::new(username, role)))
    }
}
