use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post},
    Router,
};
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    entities::customer,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    services::coupons::CreateCouponInput,
    services::pricing::{AppliedCoupon, CouponRejection, ShopperProfile},
    AppState,
};

pub fn coupon_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_coupons).post(create_coupon))
        .route("/preview", post(preview_coupon))
        .route("/:code", delete(delete_coupon))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PreviewRequest {
    pub code: String,
    #[schema(value_type = String, example = "100.00")]
    pub subtotal: Decimal,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<AppliedCoupon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<CouponRejection>,
}

/// Resolve a coupon code against the subtotal for display purposes.
///
/// The discounted total is what the shopper sees at render time; order
/// totals stay undiscounted when the checkout is submitted.
#[utoipa::path(
    post,
    path = "/api/v1/coupons/preview",
    request_body = PreviewRequest,
    responses((status = 200, description = "Resolution outcome", body = PreviewResponse)),
    tag = "coupons"
)]
pub async fn preview_coupon(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(payload): Json<PreviewRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    auth.authorize_for(payload.user_id)?;

    let shopper = match customer::Entity::find_by_id(payload.user_id)
        .one(&*state.db)
        .await?
    {
        Some(c) => ShopperProfile {
            is_member: c.is_member,
            // New within the last day counts as a new user.
            is_new_user: (chrono::Utc::now() - c.created_at).num_hours() < 24,
        },
        None => ShopperProfile::default(),
    };

    let outcome = state
        .services
        .pricing
        .preview_coupon(&payload.code, payload.subtotal, shopper)
        .await?;

    let response = match outcome {
        Ok(applied) => PreviewResponse {
            success: true,
            applied: Some(applied),
            rejection: None,
        },
        Err(rejection) => PreviewResponse {
            success: false,
            applied: None,
            rejection: Some(rejection),
        },
    };
    Ok(success_response(response))
}

/// Publicly visible coupons.
#[utoipa::path(
    get,
    path = "/api/v1/coupons",
    responses((status = 200, description = "Public coupons")),
    tag = "coupons"
)]
pub async fn list_coupons(
    State(state): State<Arc<AppState>>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let coupons = state.services.coupons.list_public().await?;
    Ok(success_response(coupons))
}

/// Admin: create a coupon.
async fn create_coupon(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(payload): Json<CreateCouponInput>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    auth.require_admin()?;
    let coupon = state.services.coupons.create(payload).await?;
    Ok(created_response(coupon))
}

/// Admin: delete a coupon by code.
async fn delete_coupon(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(code): Path<String>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    auth.require_admin()?;
    state.services.coupons.delete_by_code(&code).await?;
    Ok(no_content_response())
}
