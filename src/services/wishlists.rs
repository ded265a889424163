use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::{product, wishlist_item, WishlistItemModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Clone)]
pub struct WishlistService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl WishlistService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds a product to the customer's wishlist. Idempotent: adding an
    /// already-present pair returns the existing entry.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<WishlistItemModel, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {product_id} not found")))?;

        if let Some(existing) = self.find_pair(customer_id, product_id).await? {
            return Ok(existing);
        }

        let created = wishlist_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            product_id: Set(product_id),
            added_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::WishlistItemAdded {
                customer_id,
                product_id,
            })
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, customer_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        let existing = self
            .find_pair(customer_id, product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Wishlist entry not found".to_string()))?;

        wishlist_item::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        self.event_sender
            .send_or_log(Event::WishlistItemRemoved {
                customer_id,
                product_id,
            })
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, customer_id: Uuid) -> Result<Vec<WishlistItemModel>, ServiceError> {
        Ok(wishlist_item::Entity::find()
            .filter(wishlist_item::Column::CustomerId.eq(customer_id))
            .all(&*self.db)
            .await?)
    }

    async fn find_pair(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<WishlistItemModel>, ServiceError> {
        Ok(wishlist_item::Entity::find()
            .filter(wishlist_item::Column::CustomerId.eq(customer_id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?)
    }
}
