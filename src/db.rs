use crate::config::AppConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for the shared database connection pool.
pub type DbPool = DatabaseConnection;

/// Establishes the connection pool from application configuration.
pub async fn create_db_pool(config: &AppConfig) -> Result<DbPool, DbErr> {
    info!(
        max_connections = config.db_max_connections,
        "connecting to database"
    );

    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .sqlx_logging(!config.is_production());

    let pool = Database::connect(options).await?;
    debug!("database connection established");
    Ok(pool)
}

/// Runs the embedded migrations to the latest version.
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbErr> {
    info!("running database migrations");
    let start = std::time::Instant::now();

    let result = crate::migrator::Migrator::up(pool, None).await;

    match &result {
        Ok(_) => info!(elapsed = ?start.elapsed(), "migrations completed"),
        Err(e) => error!(elapsed = ?start.elapsed(), error = %e, "migrations failed"),
    }
    result
}

/// Checks that the database connection is alive.
pub async fn check_connection(pool: &DbPool) -> Result<(), DbErr> {
    pool.ping().await
}
