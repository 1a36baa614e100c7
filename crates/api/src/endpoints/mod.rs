//! API endpoints.

mod admin;
mod auth;
mod districts;
mod notifications;
mod reports;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/admin", admin::router())
        .nest("/reports", reports::router())
        .nest("/districts", districts::router())
        .nest("/notifications", notifications::router())
}
