use axum::{
    extract::{Json, Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    cart::CartLine,
    errors::ServiceError,
    handlers::common::success_response,
    AppState,
};

pub fn cart_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_cart).post(sync_cart))
}

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncCartRequest {
    pub user_id: Uuid,
    #[schema(value_type = Object)]
    pub cart: BTreeMap<String, CartLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncCartResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub cart: BTreeMap<String, CartLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GetCartResponse {
    #[schema(value_type = Object)]
    pub cart: BTreeMap<String, CartLine>,
}

/// Fetch the persisted cart for hydration.
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    params(("user_id" = Uuid, Query, description = "Cart owner")),
    responses((status = 200, description = "Persisted cart", body = GetCartResponse)),
    tag = "cart"
)]
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Query(query): Query<CartQuery>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    auth.authorize_for(query.user_id)?;
    let cart = state.services.carts.get_cart(query.user_id).await?;
    Ok(success_response(GetCartResponse { cart }))
}

/// Replace the persisted cart with the client's map (debounced sync).
#[utoipa::path(
    post,
    path = "/api/v1/cart",
    request_body = SyncCartRequest,
    responses((status = 200, description = "Cart persisted", body = SyncCartResponse)),
    tag = "cart"
)]
pub async fn sync_cart(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(payload): Json<SyncCartRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    auth.authorize_for(payload.user_id)?;
    let cart = state
        .services
        .carts
        .sync_cart(payload.user_id, payload.cart)
        .await?;
    Ok(success_response(SyncCartResponse { success: true, cart }))
}
