use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{customer_address, CustomerAddressModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAddressInput {
    pub recipient: String,
    pub address_line_1: String,
    #[serde(default)]
    pub address_line_2: Option<String>,
    pub city: String,
    pub province: String,
    pub country_code: String,
    pub postal_code: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        customer_id: Uuid,
        input: CreateAddressInput,
    ) -> Result<CustomerAddressModel, ServiceError> {
        if input.recipient.trim().is_empty() || input.address_line_1.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "recipient and address line 1 are required".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(customer_address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            recipient: Set(input.recipient),
            address_line_1: Set(input.address_line_1),
            address_line_2: Set(input.address_line_2),
            city: Set(input.city),
            province: Set(input.province),
            country_code: Set(input.country_code),
            postal_code: Set(input.postal_code),
            phone: Set(input.phone),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerAddressModel>, ServiceError> {
        Ok(customer_address::Entity::find()
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .all(&*self.db)
            .await?)
    }

    /// Deletes the address outright. Orders referencing it keep their
    /// reference; deletion is deliberately not guarded against them.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, customer_id: Uuid) -> Result<(), ServiceError> {
        let existing = customer_address::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {id} not found")))?;
        if existing.customer_id != customer_id {
            return Err(ServiceError::Forbidden(
                "address belongs to another customer".to_string(),
            ));
        }

        customer_address::Entity::delete_by_id(id)
            .exec(&*self.db)
            .await?;
        self.event_sender
            .send_or_log(Event::AddressDeleted(id))
            .await;
        Ok(())
    }
}
