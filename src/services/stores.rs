use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{store, ApprovalStatus, StoreModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateStoreInput {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct StoreService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl StoreService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<StoreModel, ServiceError> {
        store::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {id} not found")))
    }

    /// Lists stores shoppers can buy from.
    #[instrument(skip(self))]
    pub async fn list_orderable(&self) -> Result<Vec<StoreModel>, ServiceError> {
        Ok(store::Entity::find()
            .filter(store::Column::ApprovalStatus.eq(ApprovalStatus::Approved))
            .filter(store::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?)
    }

    /// New stores start pending and inactive; an admin must approve and
    /// the seller must activate before products become orderable.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        owner_id: Uuid,
        input: CreateStoreInput,
    ) -> Result<StoreModel, ServiceError> {
        if input.name.trim().is_empty() || input.slug.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "store name and slug are required".to_string(),
            ));
        }

        let now = Utc::now();
        let created = store::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            name: Set(input.name),
            slug: Set(input.slug),
            description: Set(input.description),
            approval_status: Set(ApprovalStatus::Pending),
            is_active: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::StoreCreated(created.id))
            .await;
        Ok(created)
    }

    /// Admin approval decision.
    #[instrument(skip(self))]
    pub async fn set_approval(
        &self,
        id: Uuid,
        status: ApprovalStatus,
    ) -> Result<StoreModel, ServiceError> {
        let existing = self.get(id).await?;
        let mut update: store::ActiveModel = existing.into();
        update.approval_status = Set(status);
        update.updated_at = Set(Utc::now());
        let updated = update.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::StoreApprovalChanged {
                store_id: id,
                approval_status: format!("{:?}", status),
            })
            .await;
        Ok(updated)
    }

    /// Seller-controlled activation toggle, independent of approval.
    #[instrument(skip(self))]
    pub async fn set_active(
        &self,
        id: Uuid,
        owner_id: Uuid,
        active: bool,
    ) -> Result<StoreModel, ServiceError> {
        let existing = self.get(id).await?;
        if existing.owner_id != owner_id {
            return Err(ServiceError::Forbidden(
                "only the store owner can toggle activation".to_string(),
            ));
        }

        let mut update: store::ActiveModel = existing.into();
        update.is_active = Set(active);
        update.updated_at = Set(Utc::now());
        Ok(update.update(&*self.db).await?)
    }
}
