use anyhow::Context;
use roon_api::{AppState, app, config::AppConfig, logging, migration::Migrator};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.log).context("Failed to initialize logging")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        system_version = %config.system_version,
        "Starting Roon API"
    );

    let db = Database::connect(config.database_url.as_str())
        .await
        .context("Failed to connect to the database")?;
    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    let state = AppState::new(db, config.search.clone(), config.system_version.clone())
        .context("Invalid search schema")?;

    let listener = tokio::net::TcpListener::bind(config.bind_address.as_str())
        .await
        .with_context(|| format!("Failed to bind TCP listener on {}", config.bind_address))?;
    tracing::info!("Roon API listening on http://{}", config.bind_address);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}
