use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use tickethub_api::config::AppConfig;
use tickethub_api::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState { pool, config });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("reporting service listening on {}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}
