use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Domain events emitted by the services after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartSynced(Uuid),
    CartCleared(Uuid),

    // Checkout / order events
    CheckoutCompleted {
        customer_id: Uuid,
        cart_snapshot_id: Uuid,
        order_ids: Vec<Uuid>,
    },
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderPaid(Uuid),

    // Catalog events
    ProductCreated(Uuid),
    StoreCreated(Uuid),
    StoreApprovalChanged {
        store_id: Uuid,
        approval_status: String,
    },

    // Coupon events
    CouponCreated(Uuid),
    CouponDeleted(Uuid),

    // Wishlist events
    WishlistItemAdded {
        customer_id: Uuid,
        product_id: Uuid,
    },
    WishlistItemRemoved {
        customer_id: Uuid,
        product_id: Uuid,
    },

    // Messaging events
    MessageSent {
        message_id: Uuid,
        recipient_id: Uuid,
    },

    // Address events
    AddressDeleted(Uuid),

    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating failure. Event
    /// delivery is advisory and must never fail the calling operation.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event dispatch failed: {}", e);
        }
    }
}

/// Drains the event channel, logging each event. Runs as a background task
/// for the lifetime of the process.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::CheckoutCompleted {
                customer_id,
                cart_snapshot_id,
                order_ids,
            } => {
                info!(
                    %customer_id,
                    %cart_snapshot_id,
                    order_count = order_ids.len(),
                    "Checkout completed"
                );
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "Order status changed");
            }
            other => debug!("Event: {:?}", other),
        }
    }

    info!("Event channel closed, stopping event processing loop");
}
