//! Stock ledger and delivery settlement backend for medical-equipment
//! inventory: two redundant stock pools consolidated behind one view, an
//! append-only movement ledger, and a delivery-document lifecycle that
//! deducts and restores quantities atomically.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod services;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// All service singletons, wired once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub pools: services::stock_pools::StockPoolService,
    pub consolidation: services::consolidation::ConsolidationService,
    pub ledger: services::ledger::MovementLedgerService,
    pub numbering: services::numbering::DocumentNumberService,
    pub settlement: services::settlement::SettlementService,
    pub assignments: services::assignments::ComponentAssignmentService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: events::EventSender) -> Self {
        let pools = services::stock_pools::StockPoolService::new(db.clone(), event_sender.clone());
        let consolidation = services::consolidation::ConsolidationService::new(pools.clone());
        let ledger = services::ledger::MovementLedgerService::new(db.clone());
        let numbering = services::numbering::DocumentNumberService::new(db.clone());
        let settlement = services::settlement::SettlementService::new(
            db.clone(),
            pools.clone(),
            numbering.clone(),
            event_sender.clone(),
        );
        let assignments = services::assignments::ComponentAssignmentService::new(
            db,
            pools.clone(),
            event_sender,
        );
        Self {
            pools,
            consolidation,
            ledger,
            numbering,
            settlement,
            assignments,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let services = AppServices::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Builds the application router with tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    handlers::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
