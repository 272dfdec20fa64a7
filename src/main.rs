use anyhow::Context;
use medstock_api::{app, config::AppConfig, db, events, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("medstock_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let pool = db::create_db_pool(&config)
        .await
        .context("failed to connect to database")?;
    if config.auto_migrate {
        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;
    }
    db::check_connection(&pool)
        .await
        .context("database connection check failed")?;

    let (event_sender, _event_task) = events::channel(config.event_buffer_size);
    let state = AppState::new(Arc::new(pool), config.clone(), event_sender);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "medstock-api listening");

    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}
