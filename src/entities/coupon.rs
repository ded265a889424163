use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Coupon entity
///
/// Codes are stored upper-case and matched case-insensitively. The discount
/// is a fixed percentage applied at display time only; persisted order
/// totals are never discounted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    /// Whole-number percentage in 0..=100.
    pub discount_percent: i32,
    pub expires_at: DateTime<Utc>,
    /// Hidden coupons are distributed out of band (newsletters, support).
    pub is_public: bool,
    pub member_only: bool,
    pub new_user_only: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
