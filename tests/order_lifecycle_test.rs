//! Order lifecycle tests: forward-only status transitions, payment
//! recording, and per-party visibility.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

struct PlacedOrder {
    buyer_id: Uuid,
    seller_id: Uuid,
    store_id: Uuid,
    order_id: Uuid,
}

async fn place_one_order(app: &TestApp) -> PlacedOrder {
    let buyer = app.seed_customer("order-buyer@example.com", false).await;
    let address = app.seed_address(buyer.id).await;
    let seller = app.seed_customer("order-seller@example.com", false).await;
    let store = app.seed_store(seller.id, "lifecycle").await;
    let product = app.seed_product(store.id, "Clock", dec!(30.00)).await;

    let checkout = json!({
        "user_id": buyer.id,
        "address_id": address.id,
        "payment_method": "COD",
        "items": [
            { "product_id": product.id, "store_id": store.id, "quantity": 1, "price": "30.00" }
        ]
    });
    let response = app
        .request_as(buyer.id, Method::POST, "/api/v1/checkout", Some(checkout))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let order_id: Uuid = body["orders"][0]["id"].as_str().unwrap().parse().unwrap();

    PlacedOrder {
        buyer_id: buyer.id,
        seller_id: seller.id,
        store_id: store.id,
        order_id,
    }
}

#[tokio::test]
async fn seller_advances_status_forward_only() {
    let app = TestApp::new().await;
    let placed = place_one_order(&app).await;
    let uri = format!("/api/v1/orders/{}/status", placed.order_id);

    // Skipping Processing is fine; any forward move is allowed.
    let response = app
        .request_as(
            placed.seller_id,
            Method::POST,
            &uri,
            Some(json!({ "status": "Shipped" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "Shipped");

    // Backwards is rejected.
    let response = app
        .request_as(
            placed.seller_id,
            Method::POST,
            &uri,
            Some(json!({ "status": "Processing" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Repeating the current status is not a forward move either.
    let response = app
        .request_as(
            placed.seller_id,
            Method::POST,
            &uri,
            Some(json!({ "status": "Shipped" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_the_selling_store_owner_can_advance_status() {
    let app = TestApp::new().await;
    let placed = place_one_order(&app).await;
    let stranger = app.seed_customer("stranger@example.com", false).await;
    let uri = format!("/api/v1/orders/{}/status", placed.order_id);

    let response = app
        .request_as(
            stranger.id,
            Method::POST,
            &uri,
            Some(json!({ "status": "Processing" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The buyer cannot advance their own order either.
    let response = app
        .request_as(
            placed.buyer_id,
            Method::POST,
            &uri,
            Some(json!({ "status": "Processing" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn marking_paid_twice_conflicts() {
    let app = TestApp::new().await;
    let placed = place_one_order(&app).await;
    let uri = format!("/api/v1/orders/{}/pay", placed.order_id);

    let response = app
        .request_as(placed.seller_id, Method::POST, &uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["is_paid"], true);

    let response = app
        .request_as(placed.seller_id, Method::POST, &uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn order_visibility_covers_buyer_seller_and_admin_only() {
    let app = TestApp::new().await;
    let placed = place_one_order(&app).await;
    let stranger = app.seed_customer("viewer@example.com", false).await;
    let admin = app.seed_customer("ops@example.com", false).await;
    let uri = format!("/api/v1/orders/{}", placed.order_id);

    let response = app
        .request_as(placed.buyer_id, Method::GET, &uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["store_id"].as_str().unwrap(), placed.store_id.to_string());
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let response = app
        .request_as(placed.seller_id, Method::GET, &uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request_as(stranger.id, Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.request_as_admin(admin.id, Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_listing_returns_only_the_callers_orders() {
    let app = TestApp::new().await;
    let placed = place_one_order(&app).await;
    let other = app.seed_customer("empty-history@example.com", false).await;

    let response = app
        .request_as(placed.buyer_id, Method::GET, "/api/v1/orders", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .request_as(other.id, Method::GET, "/api/v1/orders", None)
        .await;
    let body = response_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}
