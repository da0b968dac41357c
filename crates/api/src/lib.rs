pub mod config;
pub mod error;
pub mod health;
pub mod reports;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

/// Shared per-process state: the connection pool and the startup
/// configuration. Constructed once in main and injected into handlers.
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/reports/admin", get(reports::admin_report))
        .route("/api/reports/organizer", get(reports::organizer_report))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
