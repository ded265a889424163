use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    entities::{order::OrderStatus, OrderItemModel, OrderModel},
    errors::ServiceError,
    handlers::common::success_response,
    AppState,
};

pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_my_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", post(advance_status))
        .route("/:id/pay", post(mark_paid))
}

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: OrderStatus,
}

/// The caller's own orders, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses((status = 200, description = "Orders for the caller")),
    tag = "orders"
)]
pub async fn list_my_orders(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let orders = state.services.orders.list_for_customer(auth.user_id).await?;
    Ok(success_response(orders))
}

/// One order with its items. Visible to the purchaser, the selling store's
/// owner, and admins.
async fn get_order(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let (order, items) = state.services.orders.get_with_items(id).await?;

    if !auth.is_admin() && order.customer_id != auth.user_id {
        let store = state.services.stores.get(order.store_id).await?;
        if store.owner_id != auth.user_id {
            return Err(ServiceError::Forbidden(
                "not allowed to view this order".to_string(),
            ));
        }
    }

    Ok(success_response(OrderWithItems { order, items }))
}

/// Seller: advance the fulfillment status (forward-only).
async fn advance_status(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let order = state.services.orders.get(id).await?;
    if !auth.is_admin() {
        let store = state.services.stores.get(order.store_id).await?;
        if store.owner_id != auth.user_id {
            return Err(ServiceError::Forbidden(
                "only the selling store's owner can update order status".to_string(),
            ));
        }
    }

    let updated = state
        .services
        .orders
        .advance_status(id, payload.status)
        .await?;
    Ok(success_response(updated))
}

/// Seller or admin: record that the order has been paid.
async fn mark_paid(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let order = state.services.orders.get(id).await?;
    if !auth.is_admin() {
        let store = state.services.stores.get(order.store_id).await?;
        if store.owner_id != auth.user_id {
            return Err(ServiceError::Forbidden(
                "only the selling store's owner can mark an order paid".to_string(),
            ));
        }
    }

    let updated = state.services.orders.mark_paid(id).await?;
    Ok(success_response(updated))
}
