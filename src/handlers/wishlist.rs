use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    handlers::common::{no_content_response, success_response},
    AppState,
};

pub fn wishlist_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_wishlist))
        .route("/:product_id", post(add_to_wishlist))
        .route("/:product_id", delete(remove_from_wishlist))
}

async fn list_wishlist(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let items = state.services.wishlists.list(auth.user_id).await?;
    Ok(success_response(items))
}

/// Idempotent add: repeating the same product returns the existing entry.
async fn add_to_wishlist(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let item = state.services.wishlists.add(auth.user_id, product_id).await?;
    Ok(success_response(item))
}

async fn remove_from_wishlist(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    state
        .services
        .wishlists
        .remove(auth.user_id, product_id)
        .await?;
    Ok(no_content_response())
}
