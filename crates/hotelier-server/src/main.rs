//! Hotelier Server — Application entry point.

use std::env;

use hotelier_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

fn config_from_env() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: env::var("HOTELIER_DB_URL").unwrap_or(defaults.url),
        namespace: env::var("HOTELIER_DB_NAMESPACE").unwrap_or(defaults.namespace),
        database: env::var("HOTELIER_DB_DATABASE").unwrap_or(defaults.database),
        username: env::var("HOTELIER_DB_USERNAME").unwrap_or(defaults.username),
        password: env::var("HOTELIER_DB_PASSWORD").unwrap_or(defaults.password),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("hotelier=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Hotelier server...");

    let config = config_from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(err) = hotelier_db::run_migrations(manager.client()).await {
        tracing::error!(error = %err, "failed to run migrations");
        std::process::exit(1);
    }

    tracing::info!("Database ready");

    // TODO: mount the REST API (routing, auth, and request validation
    // live in the transport layer, not in the engine crates)

    tracing::info!("Hotelier server stopped.");
}
