// Not every test binary uses every helper.
#![allow(dead_code)]

use medstock_api::{
    app,
    config::AppConfig,
    db, events,
    models::{NewStockRecord, PoolTag, StockRecord},
    AppServices, AppState,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Test harness backed by an in-memory SQLite database with the embedded
/// migrations applied.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub services: AppServices,
    event_sender: events::EventSender,
    event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = test_config();
        let pool = db::create_db_pool(&config)
            .await
            .expect("failed to create test db pool");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let (event_sender, event_task) = events::channel(64);
        let db = Arc::new(pool);
        let services = AppServices::new(db.clone(), event_sender.clone());

        TestApp {
            db,
            config,
            services,
            event_sender,
            event_task,
        }
    }

    /// Full HTTP router over this harness's state, for request-level tests.
    pub fn router(&self) -> axum::Router {
        app(AppState {
            db: self.db.clone(),
            config: self.config.clone(),
            event_sender: self.event_sender.clone(),
            services: self.services.clone(),
        })
    }

    /// Inserts merchandise into a pool and returns the created record.
    pub async fn receive(&self, pool: PoolTag, name: &str, quantity: i32) -> StockRecord {
        self.services
            .pools
            .receive_stock(
                pool,
                NewStockRecord {
                    name: name.to_string(),
                    brand: "Mindray".to_string(),
                    model: "uMEC-12".to_string(),
                    serial_number: None,
                    quantity,
                    location: None,
                    notes: None,
                    origin_reference: Some("CARGA-001".to_string()),
                    responsible: "bodega".to_string(),
                },
            )
            .await
            .expect("failed to receive stock")
    }

    /// Current available quantity of a record.
    pub async fn quantity(&self, pool: PoolTag, item_id: i64) -> i32 {
        self.services
            .pools
            .get_record(pool, item_id)
            .await
            .expect("record should exist")
            .quantity_available
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        // A single connection keeps the in-memory database alive for the
        // whole test.
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_acquire_timeout_secs: 5,
        db_idle_timeout_secs: 600,
        auto_migrate: true,
        event_buffer_size: 64,
    }
}
