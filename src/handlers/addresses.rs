use axum::{
    extract::{Json, Path, State},
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    services::addresses::CreateAddressInput,
    AppState,
};

pub fn address_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/:id", delete(delete_address))
}

async fn list_addresses(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let addresses = state
        .services
        .addresses
        .list_for_customer(auth.user_id)
        .await?;
    Ok(success_response(addresses))
}

async fn create_address(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(payload): Json<CreateAddressInput>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let address = state
        .services
        .addresses
        .create(auth.user_id, payload)
        .await?;
    Ok(created_response(address))
}

/// Deletes even when orders still reference the address; they keep a
/// dangling reference by design.
async fn delete_address(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    state.services.addresses.delete(id, auth.user_id).await?;
    Ok(no_content_response())
}
