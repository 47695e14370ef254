use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod state;

#[cfg(test)]
mod testing;

use config::{Config, StoreBackend};
use repository::{InMemoryJobStore, JobStore, PgJobStore};
use scheduler::{BackgroundSettings, BackgroundTasks};
use state::{AppState, Repositories};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mlpipe_dispatcher=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting mlpipe dispatcher...");

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;

    let store: Arc<dyn JobStore> = match config.store {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(&config.database_url)
                .await
                .context("Failed to create database pool")?;

            tracing::info!("Database connection pool created");

            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            Arc::new(PgJobStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory job store; records are lost on restart");
            Arc::new(InMemoryJobStore::new())
        }
    };

    let repositories =
        Repositories::http(&config, store).context("Failed to build service clients")?;
    let state = AppState::new(&config, repositories);

    // Without a usable network no job can ever launch
    let network = state
        .resolver
        .resolve()
        .await
        .context("Network resolution failed")?;
    tracing::info!(
        "Jobs will run in {} ({} subnet(s), {})",
        network.network_id,
        network.subnet_ids.len(),
        network.source
    );

    let _background = BackgroundTasks::start(&state, BackgroundSettings::from(&config));

    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
