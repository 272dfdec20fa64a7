use crate::models::PoolTag;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events published by the settlement core. Consumers are
/// best-effort observers; no business decision depends on delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockReceived {
        pool: PoolTag,
        item_id: i64,
        quantity: i32,
    },
    DocumentCreated {
        document_id: Uuid,
        number: String,
    },
    DocumentConfirmed {
        document_id: Uuid,
        number: String,
        lines: usize,
    },
    DocumentStatusChanged {
        document_id: Uuid,
        old_status: String,
        new_status: String,
    },
    DocumentDeleted {
        document_id: Uuid,
        number: String,
        reason: String,
    },
    ComponentAssigned {
        assignment_id: Uuid,
        component_id: i64,
        equipment_id: Uuid,
        quantity: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {}", e))
    }
}

/// Builds an event channel plus a background task that drains and logs it.
pub fn channel(buffer: usize) -> (EventSender, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(buffer);
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            info!(?event, "domain event");
        }
    });
    (EventSender::new(tx), handle)
}
