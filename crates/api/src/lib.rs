//! HTTP API layer for civiq.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: registration, profile, admin, report, and notification routes
//! - **Extractors**: caller identity resolution
//! - **Middleware**: application state shared across routers
//!
//! Built on Axum 0.8 with Tower middleware stack. The HTTP layer stays thin:
//! it deserializes requests, threads the caller's [`civiq_core::Identity`]
//! into the core services, and maps typed failures to transport statuses.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
