use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    entities::ApprovalStatus,
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::stores::CreateStoreInput,
    AppState,
};

pub fn store_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_stores).post(create_store))
        .route("/:id", get(get_store))
        .route("/:id/products", get(list_store_products))
        .route("/:id/orders", get(list_store_orders))
        .route("/:id/approval", post(set_approval))
        .route("/:id/activate", post(set_active))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub status: ApprovalStatus,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub active: bool,
}

async fn list_stores(
    State(state): State<Arc<AppState>>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let stores = state.services.stores.list_orderable().await?;
    Ok(success_response(stores))
}

async fn get_store(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let store = state.services.stores.get(id).await?;
    Ok(success_response(store))
}

async fn list_store_products(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let products = state.services.products.list_by_store(id).await?;
    Ok(success_response(products))
}

/// Seller: orders placed against an owned store.
async fn list_store_orders(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let store = state.services.stores.get(id).await?;
    if !auth.is_admin() && store.owner_id != auth.user_id {
        return Err(ServiceError::Forbidden(
            "only the store owner can list its orders".to_string(),
        ));
    }

    let orders = state.services.orders.list_for_store(id).await?;
    Ok(success_response(orders))
}

/// Open a store; it starts pending approval and inactive.
async fn create_store(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(payload): Json<CreateStoreInput>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let store = state.services.stores.create(auth.user_id, payload).await?;
    Ok(created_response(store))
}

/// Admin: approve or reject a store.
async fn set_approval(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApprovalRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    auth.require_admin()?;
    let store = state.services.stores.set_approval(id, payload.status).await?;
    Ok(success_response(store))
}

/// Seller: toggle the activation gate.
async fn set_active(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActivateRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let store = state
        .services
        .stores
        .set_active(id, auth.user_id, payload.active)
        .await?;
    Ok(success_response(store))
}
