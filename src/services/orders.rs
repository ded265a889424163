use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::{
    order::{self, OrderStatus},
    order_item, OrderItemModel, OrderModel,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<OrderModel, ServiceError> {
        order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn get_with_items(
        &self,
        id: Uuid,
    ) -> Result<(OrderModel, Vec<OrderItemModel>), ServiceError> {
        let order = self.get(id).await?;
        let items = order
            .find_related(order_item::Entity)
            .all(&*self.db)
            .await?;
        Ok((order, items))
    }

    #[instrument(skip(self))]
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderModel>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_for_store(&self, store_id: Uuid) -> Result<Vec<OrderModel>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::StoreId.eq(store_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Advances the fulfillment status. The lifecycle is forward-only; any
    /// backward or same-state transition is rejected.
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        let existing = self.get(id).await?;
        let old_status = existing.status;
        if !old_status.can_advance_to(next) {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot move order from {:?} to {:?}",
                old_status, next
            )));
        }

        let mut update: order::ActiveModel = existing.into();
        update.status = Set(next);
        update.updated_at = Set(Utc::now());
        let updated = update.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: id,
                old_status: format!("{:?}", old_status),
                new_status: format!("{:?}", next),
            })
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn mark_paid(&self, id: Uuid) -> Result<OrderModel, ServiceError> {
        let existing = self.get(id).await?;
        if existing.is_paid {
            return Err(ServiceError::Conflict(format!(
                "Order {id} is already paid"
            )));
        }

        let mut update: order::ActiveModel = existing.into();
        update.is_paid = Set(true);
        update.updated_at = Set(Utc::now());
        let updated = update.update(&*self.db).await?;

        self.event_sender.send_or_log(Event::OrderPaid(id)).await;
        Ok(updated)
    }
}
