//! Basic Impacts Server — social-impact measurement platform backend.
//!
//! Serves the public marketing read models (statistics, trending,
//! leaderboard, solution finder), the organization dashboard CRUD API and
//! the admin JSON import tool. Runs against PostgreSQL when a database URL
//! is configured and against an in-process store otherwise.

mod config;
mod dashboard;
mod error;
mod events;
mod metrics;
mod migration;
mod models;
mod routes;
mod schema;
mod seeder;
mod services;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use crate::models::organization::OrganizationFilter;
use crate::storage::{MemStorage, PgStorage, Storage};

#[derive(Parser)]
#[command(name = "basic-impacts", about = "Basic Impacts Platform Server")]
struct Cli {
    /// Server port
    #[arg(short, long, env = "IMPACT_PORT", default_value = "5000")]
    port: u16,

    /// PostgreSQL connection URL; the in-memory store is used when absent
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    }

    let cli = Cli::parse();
    let config = config::ImpactConfig::from_env();

    tracing::info!("Starting Basic Impacts Server...");

    let storage: Arc<dyn Storage> = match cli.database_url.as_deref().filter(|u| !u.is_empty()) {
        Some(db_url) => {
            let pool = storage::postgres::build_pool(db_url, config.db_pool_size)?;
            {
                let mut conn = pool
                    .get()
                    .await
                    .map_err(|e| anyhow::anyhow!("diesel pool: {e}"))?;
                tracing::info!("Running platform migration...");
                migration::run_migration(&mut conn).await?;
                tracing::info!("Platform migration completed.");
            }
            Arc::new(PgStorage::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set -- using in-memory storage, data is lost on exit");
            Arc::new(MemStorage::new())
        }
    };

    // Initialize metrics
    metrics::init_metrics();

    if config.seed_data {
        seeder::seed_storage(storage.as_ref()).await?;
    }
    let organizations = storage
        .list_organizations(&OrganizationFilter::default())
        .await?;
    metrics::organization_count(organizations.len());

    let app = routes::api_router(routes::AppState {
        storage: storage.clone(),
        config,
    });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!(storage = storage.backend(), "Basic Impacts Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
