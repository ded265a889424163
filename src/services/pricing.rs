/*!
 * Pricing and coupon resolution
 *
 * Subtotals use live catalog prices. Coupons apply a fixed percentage at
 * display time only; persisted order totals stay undiscounted (an
 * intentional divergence, carried over as-is).
 */

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cart::CartLine;
use crate::entities::{coupon, CouponModel};
use crate::errors::ServiceError;

/// Audience facts about the shopper, checked against coupon flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShopperProfile {
    pub is_member: bool,
    pub is_new_user: bool,
}

/// Why a coupon code did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    NotFound,
    Expired,
    NotEligible,
}

/// A successfully applied coupon with its display-time totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_percent: i32,
    #[schema(value_type = String, example = "20.00")]
    pub discount_amount: Decimal,
    /// What the shopper sees; never written to an order.
    #[schema(value_type = String, example = "80.00")]
    pub display_total: Decimal,
}

/// Sums live catalog price times quantity over the cart. Lines whose
/// product is missing from the catalog are skipped, not an error.
pub fn subtotal(lines: &BTreeMap<String, CartLine>, catalog: &HashMap<Uuid, Decimal>) -> Decimal {
    lines
        .values()
        .filter_map(|line| {
            catalog
                .get(&line.product_id)
                .map(|price| *price * Decimal::from(line.quantity))
        })
        .sum()
}

/// Case-insensitive exact code match against unexpired, eligible coupons.
/// Fails closed: an expired coupon never matches, whatever the code says.
pub fn apply_coupon(
    code: &str,
    subtotal: Decimal,
    coupons: &[CouponModel],
    shopper: ShopperProfile,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, CouponRejection> {
    let wanted = code.trim().to_uppercase();
    let coupon = coupons
        .iter()
        .find(|c| c.code == wanted)
        .ok_or(CouponRejection::NotFound)?;

    if coupon.is_expired(now) {
        return Err(CouponRejection::Expired);
    }
    if coupon.member_only && !shopper.is_member {
        return Err(CouponRejection::NotEligible);
    }
    if coupon.new_user_only && !shopper.is_new_user {
        return Err(CouponRejection::NotEligible);
    }

    let pct = Decimal::from(coupon.discount_percent);
    let discount_amount = subtotal * pct / Decimal::from(100);
    Ok(AppliedCoupon {
        code: coupon.code.clone(),
        discount_percent: coupon.discount_percent,
        discount_amount,
        display_total: subtotal - discount_amount,
    })
}

/// DB-backed facade over the pure resolver, used by the preview endpoint.
#[derive(Clone)]
pub struct PricingService {
    db: Arc<DatabaseConnection>,
}

impl PricingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Computes a cart subtotal from live product prices.
    #[instrument(skip(self, lines))]
    pub async fn cart_subtotal(
        &self,
        lines: &BTreeMap<String, CartLine>,
    ) -> Result<Decimal, ServiceError> {
        let ids: Vec<Uuid> = lines.values().map(|l| l.product_id).collect();
        let catalog: HashMap<Uuid, Decimal> = crate::entities::product::Entity::find()
            .filter(crate::entities::product::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.price))
            .collect();
        Ok(subtotal(lines, &catalog))
    }

    /// Resolves a coupon code against the stored coupons for display.
    #[instrument(skip(self))]
    pub async fn preview_coupon(
        &self,
        code: &str,
        cart_subtotal: Decimal,
        shopper: ShopperProfile,
    ) -> Result<Result<AppliedCoupon, CouponRejection>, ServiceError> {
        let coupons = coupon::Entity::find().all(&*self.db).await?;
        Ok(apply_coupon(
            code,
            cart_subtotal,
            &coupons,
            shopper,
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Customizations;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn line(product: Uuid, quantity: u32) -> CartLine {
        CartLine {
            product_id: product,
            quantity,
            unit_price: dec!(1),
            customizations: Customizations::default(),
        }
    }

    fn coupon(code: &str, pct: i32, expires_in_hours: i64) -> CouponModel {
        CouponModel {
            id: Uuid::new_v4(),
            code: code.to_string(),
            discount_percent: pct,
            expires_at: Utc::now() + Duration::hours(expires_in_hours),
            is_public: true,
            member_only: false,
            new_user_only: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn subtotal_uses_live_catalog_prices() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let mut lines = BTreeMap::new();
        lines.insert("a".into(), line(a, 2));
        lines.insert("b".into(), line(b, 1));

        let mut catalog = HashMap::new();
        catalog.insert(a, dec!(10));
        catalog.insert(b, dec!(5.50));

        assert_eq!(subtotal(&lines, &catalog), dec!(25.50));
    }

    #[test]
    fn unknown_products_are_silently_excluded() {
        let known = Uuid::from_u128(1);
        let gone = Uuid::from_u128(9);
        let mut lines = BTreeMap::new();
        lines.insert("k".into(), line(known, 1));
        lines.insert("g".into(), line(gone, 3));

        let mut catalog = HashMap::new();
        catalog.insert(known, dec!(7));

        assert_eq!(subtotal(&lines, &catalog), dec!(7));
    }

    #[test]
    fn coupon_match_is_case_insensitive() {
        let coupons = vec![coupon("SAVE20", 20, 24)];
        let applied = apply_coupon(
            "save20",
            dec!(100),
            &coupons,
            ShopperProfile::default(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(applied.discount_amount, dec!(20));
        assert_eq!(applied.display_total, dec!(80));
    }

    #[test]
    fn expired_coupon_never_matches() {
        let coupons = vec![coupon("SAVE20", 20, -1)];
        let err = apply_coupon(
            "SAVE20",
            dec!(100),
            &coupons,
            ShopperProfile::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, CouponRejection::Expired);
    }

    #[test]
    fn unknown_code_is_not_found() {
        let coupons = vec![coupon("SAVE20", 20, 24)];
        let err = apply_coupon(
            "NOPE",
            dec!(100),
            &coupons,
            ShopperProfile::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, CouponRejection::NotFound);
    }

    #[test]
    fn member_only_coupon_requires_membership() {
        let mut c = coupon("VIP", 15, 24);
        c.member_only = true;
        let coupons = vec![c];

        let err = apply_coupon(
            "VIP",
            dec!(50),
            &coupons,
            ShopperProfile::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, CouponRejection::NotEligible);

        let ok = apply_coupon(
            "VIP",
            dec!(50),
            &coupons,
            ShopperProfile {
                is_member: true,
                is_new_user: false,
            },
            Utc::now(),
        );
        assert!(ok.is_ok());
    }
}
