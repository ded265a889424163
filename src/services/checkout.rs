/*!
 * Checkout: store splitting and the order persistence transaction
 *
 * One checkout submission becomes one order per distinct store. All order
 * writes plus the cart clear happen in a single transaction; receipts go
 * out only after commit.
 */

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::Customizations;
use crate::entities::{
    cart, customer, customer_address,
    order::{self, PaymentMethod},
    order_item, store, CustomerModel, OrderModel,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::notifications::ReceiptNotifier;

/// One line of a checkout submission. `price` is the client's point-in-time
/// snapshot and is trusted as-is at this step (known trust boundary gap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    /// Missing store associations fall into the default bucket.
    #[serde(default)]
    pub store_id: Option<Uuid>,
    pub quantity: u32,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub customizations: Customizations,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub address_id: Uuid,
    #[schema(value_type = String, example = "COD")]
    pub payment_method: PaymentMethod,
    pub items: Vec<CheckoutItem>,
}

/// Grouping key for the splitter. `Default` collects lines without a store
/// association; it sorts after every concrete store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StoreKey {
    Store(Uuid),
    Default,
}

/// One store's share of a checkout submission.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreGroup {
    pub key: StoreKey,
    pub items: Vec<CheckoutItem>,
    /// Sum of request-supplied price x quantity over this group only.
    pub total: Decimal,
}

/// Partitions checkout items by owning store, deterministically ordered.
pub fn split_by_store(items: Vec<CheckoutItem>) -> Vec<StoreGroup> {
    let mut buckets: BTreeMap<StoreKey, Vec<CheckoutItem>> = BTreeMap::new();
    for item in items {
        let key = match item.store_id {
            Some(id) => StoreKey::Store(id),
            None => StoreKey::Default,
        };
        buckets.entry(key).or_default().push(item);
    }

    buckets
        .into_iter()
        .map(|(key, items)| {
            let total = items
                .iter()
                .map(|i| i.price * Decimal::from(i.quantity))
                .sum();
            StoreGroup { key, items, total }
        })
        .collect()
}

/// Order placement service.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    notifier: ReceiptNotifier,
    txn_timeout: Duration,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        notifier: ReceiptNotifier,
        txn_timeout: Duration,
        currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            notifier,
            txn_timeout,
            currency,
        }
    }

    /// Places orders for one checkout submission.
    ///
    /// Exactly one order per distinct store is created, all sharing one
    /// cart snapshot id. The writes and the cart clear are atomic; receipt
    /// emails are dispatched post-commit and never affect the result.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, item_count = request.items.len()))]
    pub async fn place_order(
        &self,
        mut request: CheckoutRequest,
    ) -> Result<Vec<OrderModel>, ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "checkout requires at least one item".to_string(),
            ));
        }
        if request.items.iter().any(|i| i.quantity == 0) {
            return Err(ServiceError::ValidationError(
                "item quantity must be at least 1".to_string(),
            ));
        }

        // Referential checks happen before any write.
        let customer = customer::Entity::find_by_id(request.user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.user_id))
            })?;
        customer_address::Entity::find_by_id(request.address_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Address {} not found", request.address_id))
            })?;

        let groups = split_by_store(std::mem::take(&mut request.items));

        // Lines without a store land on the first store ever created. A
        // degradation policy for malformed payloads, not a correctness
        // guarantee.
        let fallback_store = if groups.iter().any(|g| g.key == StoreKey::Default) {
            let first = store::Entity::find()
                .order_by_asc(store::Column::CreatedAt)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::InvalidInput(
                        "no store available for items without a store association".to_string(),
                    )
                })?;
            warn!(
                fallback_store_id = %first.id,
                "checkout items missing store association, using first store"
            );
            Some(first.id)
        } else {
            None
        };

        let cart_snapshot_id = Uuid::new_v4();
        let orders = tokio::time::timeout(
            self.txn_timeout,
            self.persist_orders(&request, &groups, fallback_store, cart_snapshot_id),
        )
        .await
        .map_err(|_| ServiceError::CheckoutTimeout)??;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        self.event_sender
            .send_or_log(Event::CheckoutCompleted {
                customer_id: customer.id,
                cart_snapshot_id,
                order_ids: order_ids.clone(),
            })
            .await;
        for id in &order_ids {
            self.event_sender.send_or_log(Event::OrderCreated(*id)).await;
        }
        self.event_sender
            .send_or_log(Event::CartCleared(customer.id))
            .await;

        info!(
            order_count = orders.len(),
            %cart_snapshot_id,
            "Checkout committed"
        );

        self.dispatch_receipts(customer, orders.clone());

        Ok(orders)
    }

    /// The all-or-nothing write: one order plus its items per store group,
    /// then the persisted cart reset to an empty map. Dropping the
    /// transaction on any error (or on timeout upstream) rolls it all back.
    async fn persist_orders(
        &self,
        request: &CheckoutRequest,
        groups: &[StoreGroup],
        fallback_store: Option<Uuid>,
        cart_snapshot_id: Uuid,
    ) -> Result<Vec<OrderModel>, ServiceError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();
        let mut orders = Vec::with_capacity(groups.len());

        for group in groups {
            let store_id = match group.key {
                StoreKey::Store(id) => id,
                // Checked before the transaction opened.
                StoreKey::Default => fallback_store.ok_or_else(|| {
                    ServiceError::InternalError("default store fallback unresolved".to_string())
                })?,
            };

            let order_id = Uuid::new_v4();
            let order_row = order::ActiveModel {
                id: Set(order_id),
                order_number: Set(format!(
                    "ORD-{}",
                    order_id.simple().to_string()[..8].to_uppercase()
                )),
                customer_id: Set(request.user_id),
                store_id: Set(store_id),
                address_id: Set(request.address_id),
                cart_snapshot_id: Set(cart_snapshot_id),
                payment_method: Set(request.payment_method),
                status: Set(order::OrderStatus::OrderPlaced),
                total_amount: Set(group.total),
                currency: Set(self.currency.clone()),
                is_paid: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
            };
            let created = order_row.insert(&txn).await?;

            for item in &group.items {
                let item_row = order_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order_id),
                    product_id: Set(item.product_id),
                    quantity: Set(item.quantity as i32),
                    unit_price: Set(item.price),
                    line_total: Set(item.price * Decimal::from(item.quantity)),
                    customizations: Set(serde_json::to_value(&item.customizations)
                        .unwrap_or(serde_json::Value::Null)),
                    created_at: Set(now),
                };
                item_row.insert(&txn).await?;
            }

            orders.push(created);
        }

        // Clearing the cart rides in the same transaction: a rollback must
        // leave the cart exactly as it was.
        if let Some(cart_row) = cart::Entity::find()
            .filter(cart::Column::CustomerId.eq(request.user_id))
            .one(&txn)
            .await?
        {
            let mut cart_update: cart::ActiveModel = cart_row.into();
            cart_update.data = Set(serde_json::json!({}));
            cart_update.updated_at = Set(now);
            cart_update.update(&txn).await?;
        }

        txn.commit().await?;
        Ok(orders)
    }

    /// Fire-and-forget receipt dispatch; the checkout response never waits
    /// on the mailer.
    fn dispatch_receipts(&self, customer: CustomerModel, orders: Vec<OrderModel>) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            notifier.notify_orders(&customer, &orders).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(store: Option<u128>, quantity: u32, price: Decimal) -> CheckoutItem {
        CheckoutItem {
            product_id: Uuid::new_v4(),
            store_id: store.map(Uuid::from_u128),
            quantity,
            price,
            customizations: Customizations::default(),
        }
    }

    #[test]
    fn items_spanning_two_stores_make_two_groups() {
        let groups = split_by_store(vec![
            item(Some(1), 2, dec!(10)),
            item(Some(1), 1, dec!(5)),
            item(Some(2), 3, dec!(2)),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, StoreKey::Store(Uuid::from_u128(1)));
        assert_eq!(groups[0].total, dec!(25));
        assert_eq!(groups[1].key, StoreKey::Store(Uuid::from_u128(2)));
        assert_eq!(groups[1].total, dec!(6));
    }

    #[test]
    fn group_totals_never_combine_across_stores() {
        let groups = split_by_store(vec![item(Some(1), 1, dec!(100)), item(Some(2), 1, dec!(1))]);
        assert!(groups.iter().all(|g| g.total != dec!(101)));
    }

    #[test]
    fn missing_store_goes_to_default_bucket() {
        let groups = split_by_store(vec![
            item(None, 1, dec!(3)),
            item(Some(7), 1, dec!(4)),
            item(None, 2, dec!(1)),
        ]);

        assert_eq!(groups.len(), 2);
        let default = groups.iter().find(|g| g.key == StoreKey::Default).unwrap();
        assert_eq!(default.items.len(), 2);
        assert_eq!(default.total, dec!(5));
    }

    #[test]
    fn default_bucket_sorts_after_concrete_stores() {
        let groups = split_by_store(vec![item(None, 1, dec!(1)), item(Some(1), 1, dec!(1))]);
        assert_eq!(groups.last().unwrap().key, StoreKey::Default);
    }

    #[test]
    fn empty_input_makes_no_groups() {
        assert!(split_by_store(vec![]).is_empty());
    }
}
