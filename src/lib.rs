/*!
 * Bazaar API
 *
 * A multi-vendor storefront backend: server-side cart persistence,
 * store-aware checkout that splits one submission into per-store orders,
 * display-time coupon resolution, and the surrounding catalog, wishlist,
 * address, and messaging surfaces.
 */

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;

pub mod auth;
pub mod cart;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod notifications;
pub mod openapi;
pub mod services;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

/// The versioned API surface. Mounted under `/api/v1` by the binary and
/// the test harness alike.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/cart", handlers::carts::cart_routes())
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest("/coupons", handlers::coupons::coupon_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/wishlist", handlers::wishlist::wishlist_routes())
        .nest("/addresses", handlers::addresses::address_routes())
        .nest("/stores", handlers::stores::store_routes())
        .nest("/messages", handlers::messages::message_routes())
        .route("/status", get(api_status))
        .route("/health", get(health_check))
}

/// Lightweight liveness endpoint with build metadata.
async fn api_status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Readiness endpoint: pings the database.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "up" })),
        ),
        Err(err) => {
            tracing::error!("health check failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "database": "down" })),
            )
        }
    }
}

/// Full application router with middleware, ready to serve.
pub fn app_router(state: Arc<AppState>) -> Router {
    use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

    let cors = match &state.config.cors_allowed_origins {
        Some(raw) => {
            let origins: Vec<axum::http::HeaderValue> = raw
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
        }
        None => CorsLayer::permissive(),
    };

    Router::new()
        .route("/", get(|| async { "bazaar-api up" }))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
