use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    auth::AuthenticatedUser,
    entities::OrderModel,
    errors::ServiceError,
    handlers::common::created_response,
    services::checkout::CheckoutRequest,
    AppState,
};

pub fn checkout_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(place_order))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub success: bool,
    #[schema(value_type = Vec<Object>)]
    pub orders: Vec<OrderModel>,
}

/// Place orders for the submitted cart items.
///
/// Items spanning K distinct stores produce K orders sharing one cart
/// snapshot id. The caller may only check out as themselves.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Orders created", body = CheckoutResponse),
        (status = 400, description = "Invalid submission", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer or address not found", body = crate::errors::ErrorResponse),
    ),
    tag = "checkout"
)]
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    auth.authorize_for(payload.user_id)?;

    let orders = state.services.checkout.place_order(payload).await?;

    Ok(created_response(CheckoutResponse {
        success: true,
        orders,
    }))
}
