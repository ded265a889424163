/*!
 * Server side of the debounced cart sync
 *
 * The client owns the in-memory cart and pushes the whole map
 * opportunistically. Writes are last-write-wins per customer; there is no
 * cross-request serialization (accepted weak consistency).
 */

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::cart::{CartLine, CartState};
use crate::entities::cart;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Clone)]
pub struct CartSyncService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartSyncService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Returns the persisted cart map, empty if the customer has none.
    #[instrument(skip(self))]
    pub async fn get_cart(
        &self,
        customer_id: Uuid,
    ) -> Result<BTreeMap<String, CartLine>, ServiceError> {
        let row = cart::Entity::find()
            .filter(cart::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?;

        match row {
            Some(row) => serde_json::from_value(row.data).map_err(|e| {
                ServiceError::InternalError(format!("stored cart is unreadable: {e}"))
            }),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Replaces the persisted cart with the client's map. Zero-quantity
    /// lines are dropped during normalization.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn sync_cart(
        &self,
        customer_id: Uuid,
        lines: BTreeMap<String, CartLine>,
    ) -> Result<BTreeMap<String, CartLine>, ServiceError> {
        let mut state = CartState::new();
        state.replace_all(lines);
        let normalized = state.into_lines();

        let data = serde_json::to_value(&normalized)
            .map_err(|e| ServiceError::InternalError(format!("cart serialization failed: {e}")))?;
        let now = Utc::now();

        let existing = cart::Entity::find()
            .filter(cart::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?;

        match existing {
            Some(row) => {
                let mut update: cart::ActiveModel = row.into();
                update.data = Set(data);
                update.updated_at = Set(now);
                update.update(&*self.db).await?;
            }
            None => {
                cart::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    customer_id: Set(customer_id),
                    data: Set(data),
                    updated_at: Set(now),
                }
                .insert(&*self.db)
                .await?;
            }
        }

        self.event_sender
            .send_or_log(Event::CartSynced(customer_id))
            .await;

        Ok(normalized)
    }
}
