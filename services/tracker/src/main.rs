use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod credentials;
mod error;
mod lifecycle;
mod models;
mod repositories;
mod routes;
mod state;
mod tally;
mod validation;

use common::{
    cache::RedisConfig,
    database::{self, DatabaseConfig},
};

use crate::{
    config::{ServerConfig, StorageBackend},
    credentials::CredentialStore,
    lifecycle::TicketLifecycleService,
    repositories::{PgStore, postgres::MIGRATOR},
    state::AppState,
    tally::TallyCache,
};

/// Redis-backed tally when `REDIS_URL` is set and answers, memory otherwise
async fn init_tally_cache() -> TallyCache {
    match RedisConfig::from_env_if_set() {
        Some(redis_config) => TallyCache::connect(&redis_config).await,
        None => {
            info!("REDIS_URL not set, keeping priority tally in memory");
            TallyCache::in_memory()
        }
    }
}

async fn init_state(server_config: &ServerConfig) -> Result<AppState> {
    if server_config.storage == StorageBackend::Memory {
        info!("Using in-memory storage");
        return Ok(AppState::in_memory());
    }

    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool, &MIGRATOR).await?;

    let store = Arc::new(PgStore::new(pool));
    let tally = init_tally_cache().await;

    Ok(AppState {
        tickets: TicketLifecycleService::new(store.clone(), tally),
        credentials: CredentialStore::new(store),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting ticket tracker service");

    let server_config = ServerConfig::from_env()?;
    let app_state = init_state(&server_config).await?;

    let app = routes::create_router(app_state);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Ticket tracker listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
