//! Civiq server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use civiq_api::{middleware::AppState, router as api_router};
use civiq_common::Config;
use civiq_core::{
    AccountService, AuthorizationGate, DistrictService, NotificationService, ReportService,
};
use civiq_db::repositories::{
    DistrictRepository, NotificationRepository, ReportRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civiq=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting civiq server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(civiq_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    civiq_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let district_repo = DistrictRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Services
    let gate = AuthorizationGate::new(user_repo.clone());
    let notification_service = NotificationService::new(notification_repo, user_repo.clone());
    let account_service = AccountService::new(
        user_repo.clone(),
        district_repo.clone(),
        notification_service.clone(),
        gate.clone(),
    );
    let district_service = DistrictService::new(
        district_repo.clone(),
        account_service.clone(),
        gate.clone(),
    );
    let report_service = ReportService::new(
        report_repo,
        user_repo,
        district_repo,
        notification_service.clone(),
        gate,
    );

    let state = AppState {
        account_service,
        district_service,
        report_service,
        notification_service,
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
