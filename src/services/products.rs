use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{product, store, ApprovalStatus, ProductModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProductInput {
    pub store_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub recommended_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists products from orderable stores only (approved and active).
    #[instrument(skip(self))]
    pub async fn list_browsable(
        &self,
        category: Option<String>,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        let orderable_store_ids: Vec<Uuid> = store::Entity::find()
            .filter(store::Column::ApprovalStatus.eq(ApprovalStatus::Approved))
            .filter(store::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let mut query =
            product::Entity::find().filter(product::Column::StoreId.is_in(orderable_store_ids));
        if let Some(category) = category {
            query = query.filter(product::Column::Category.eq(category));
        }

        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn list_by_store(&self, store_id: Uuid) -> Result<Vec<ProductModel>, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::StoreId.eq(store_id))
            .all(&*self.db)
            .await?)
    }

    /// Creates a product in the seller's own store.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        seller_id: Uuid,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let store = store::Entity::find_by_id(input.store_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", input.store_id)))?;
        if store.owner_id != seller_id {
            return Err(ServiceError::Forbidden(
                "only the store owner can add products".to_string(),
            ));
        }
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(input.store_id),
            name: Set(input.name),
            description: Set(input.description),
            category: Set(input.category),
            price: Set(input.price),
            recommended_price: Set(input.recommended_price),
            in_stock: Set(true),
            images: Set(serde_json::json!(input.images)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;

        Ok(created)
    }
}
