use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{coupon, CouponModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCouponInput {
    pub code: String,
    pub discount_percent: i32,
    pub expires_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub member_only: bool,
    #[serde(default)]
    pub new_user_only: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a coupon. Codes are normalized to upper-case before storage
    /// so shopper lookups can match case-insensitively.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: CreateCouponInput) -> Result<CouponModel, ServiceError> {
        if !(0..=100).contains(&input.discount_percent) {
            return Err(ServiceError::ValidationError(
                "discount_percent must be between 0 and 100".to_string(),
            ));
        }
        let code = input.code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "coupon code must not be empty".to_string(),
            ));
        }

        let duplicate = coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code.clone()))
            .one(&*self.db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "coupon code {code} already exists"
            )));
        }

        let created = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            discount_percent: Set(input.discount_percent),
            expires_at: Set(input.expires_at),
            is_public: Set(input.is_public),
            member_only: Set(input.member_only),
            new_user_only: Set(input.new_user_only),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::CouponCreated(created.id))
            .await;
        Ok(created)
    }

    /// Deletes by code, case-insensitively.
    #[instrument(skip(self))]
    pub async fn delete_by_code(&self, code: &str) -> Result<(), ServiceError> {
        let code = code.trim().to_uppercase();
        let existing = coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code.clone()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {code} not found")))?;

        let id = existing.id;
        coupon::Entity::delete_by_id(id).exec(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::CouponDeleted(id))
            .await;
        Ok(())
    }

    /// Coupons shoppers are allowed to see: public ones only. Hidden
    /// coupons still apply by code.
    #[instrument(skip(self))]
    pub async fn list_public(&self) -> Result<Vec<CouponModel>, ServiceError> {
        Ok(coupon::Entity::find()
            .filter(coupon::Column::IsPublic.eq(true))
            .all(&*self.db)
            .await?)
    }
}
