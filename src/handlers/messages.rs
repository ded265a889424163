use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    AppState,
};

pub fn message_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(send_message))
        .route("/conversation/:user_id", get(get_conversation))
        .route("/:id/read", post(mark_read))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    #[serde(default)]
    pub order_id: Option<Uuid>,
    pub body: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let message = state
        .services
        .messages
        .send(
            auth.user_id,
            payload.recipient_id,
            payload.order_id,
            payload.body,
        )
        .await?;
    Ok(created_response(message))
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let messages = state
        .services
        .messages
        .conversation(auth.user_id, user_id)
        .await?;
    Ok(success_response(messages))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let message = state.services.messages.mark_read(id, auth.user_id).await?;
    Ok(success_response(message))
}
