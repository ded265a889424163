//! Checkout flow integration tests: store splitting, per-order totals,
//! atomicity of the order write plus cart clear, and input validation.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use serde_json::{json, Value};
use uuid::Uuid;

use bazaar_api::entities;

/// Decimal fields may come back as JSON strings or numbers depending on
/// the backing column type; accept both.
fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal value: {other}"),
    }
}

#[tokio::test]
async fn items_from_two_stores_become_two_orders_with_per_store_totals() {
    let app = TestApp::new().await;
    let buyer = app.seed_customer("buyer@example.com", false).await;
    let address = app.seed_address(buyer.id).await;
    let seller_a = app.seed_customer("seller-a@example.com", false).await;
    let seller_b = app.seed_customer("seller-b@example.com", false).await;
    let store_a = app.seed_store(seller_a.id, "alpha").await;
    let store_b = app.seed_store(seller_b.id, "beta").await;
    let mug = app.seed_product(store_a.id, "Mug", dec!(10.00)).await;
    let cap = app.seed_product(store_a.id, "Cap", dec!(5.00)).await;
    let pen = app.seed_product(store_b.id, "Pen", dec!(3.00)).await;

    let payload = json!({
        "user_id": buyer.id,
        "address_id": address.id,
        "payment_method": "COD",
        "items": [
            { "product_id": mug.id, "store_id": store_a.id, "quantity": 2, "price": "10.00" },
            { "product_id": cap.id, "store_id": store_a.id, "quantity": 1, "price": "5.00" },
            { "product_id": pen.id, "store_id": store_b.id, "quantity": 2, "price": "3.00" }
        ]
    });

    let response = app
        .request_as(buyer.id, Method::POST, "/api/v1/checkout", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    let orders = body["orders"].as_array().expect("orders array");
    assert_eq!(orders.len(), 2, "one order per distinct store");

    // Totals never combine across stores.
    let mut totals: Vec<(String, Decimal)> = orders
        .iter()
        .map(|o| {
            (
                o["store_id"].as_str().unwrap().to_string(),
                decimal_field(&o["total_amount"]),
            )
        })
        .collect();
    totals.sort();
    let mut expected = vec![
        (store_a.id.to_string(), dec!(25.00)),
        (store_b.id.to_string(), dec!(6.00)),
    ];
    expected.sort();
    assert_eq!(totals, expected);

    // Sibling orders share one cart snapshot id.
    let snapshot_ids: Vec<&str> = orders
        .iter()
        .map(|o| o["cart_snapshot_id"].as_str().unwrap())
        .collect();
    assert_eq!(snapshot_ids[0], snapshot_ids[1]);

    // Each order carries only its own items.
    let persisted = entities::OrderItem::find()
        .all(&*app.state.db)
        .await
        .expect("order items");
    assert_eq!(persisted.len(), 3);
}

#[tokio::test]
async fn successful_checkout_clears_the_persisted_cart() {
    let app = TestApp::new().await;
    let buyer = app.seed_customer("clear@example.com", false).await;
    let address = app.seed_address(buyer.id).await;
    let seller = app.seed_customer("seller@example.com", false).await;
    let store = app.seed_store(seller.id, "gamma").await;
    let product = app.seed_product(store.id, "Lamp", dec!(40.00)).await;

    let cart_payload = json!({
        "user_id": buyer.id,
        "cart": {
            (product.id.to_string()): {
                "product_id": product.id,
                "quantity": 1,
                "unit_price": "40.00"
            }
        }
    });
    let sync = app
        .request_as(buyer.id, Method::POST, "/api/v1/cart", Some(cart_payload))
        .await;
    assert_eq!(sync.status(), StatusCode::OK);

    let checkout = json!({
        "user_id": buyer.id,
        "address_id": address.id,
        "payment_method": "STRIPE",
        "items": [
            { "product_id": product.id, "store_id": store.id, "quantity": 1, "price": "40.00" }
        ]
    });
    let response = app
        .request_as(buyer.id, Method::POST, "/api/v1/checkout", Some(checkout))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let get = app
        .request_as(
            buyer.id,
            Method::GET,
            &format!("/api/v1/cart?user_id={}", buyer.id),
            None,
        )
        .await;
    let body = response_json(get).await;
    assert_eq!(body["cart"], json!({}), "cart resets after checkout");
}

#[tokio::test]
async fn failed_order_write_rolls_back_everything_including_the_cart() {
    let app = TestApp::new().await;
    let buyer = app.seed_customer("rollback@example.com", false).await;
    let address = app.seed_address(buyer.id).await;
    let seller = app.seed_customer("seller-r@example.com", false).await;
    let store = app.seed_store(seller.id, "delta").await;
    let product = app.seed_product(store.id, "Vase", dec!(15.00)).await;

    let key = product.id.to_string();
    let cart_payload = json!({
        "user_id": buyer.id,
        "cart": {
            (key.clone()): {
                "product_id": product.id,
                "quantity": 2,
                "unit_price": "15.00"
            }
        }
    });
    app.request_as(buyer.id, Method::POST, "/api/v1/cart", Some(cart_payload))
        .await;

    // Sabotage the item write so the transaction fails after the order
    // insert succeeded.
    app.execute_sql("DROP TABLE order_items;").await;

    let checkout = json!({
        "user_id": buyer.id,
        "address_id": address.id,
        "payment_method": "COD",
        "items": [
            { "product_id": product.id, "store_id": store.id, "quantity": 2, "price": "15.00" }
        ]
    });
    let response = app
        .request_as(buyer.id, Method::POST, "/api/v1/checkout", Some(checkout))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let orders = entities::Order::find()
        .all(&*app.state.db)
        .await
        .expect("orders query");
    assert!(orders.is_empty(), "no partial orders survive a rollback");

    let get = app
        .request_as(
            buyer.id,
            Method::GET,
            &format!("/api/v1/cart?user_id={}", buyer.id),
            None,
        )
        .await;
    let body = response_json(get).await;
    assert_eq!(
        body["cart"][&key]["quantity"], 2,
        "cart is untouched when the checkout fails"
    );
}

#[tokio::test]
async fn items_without_a_store_fall_back_to_the_first_store() {
    let app = TestApp::new().await;
    let buyer = app.seed_customer("fallback@example.com", false).await;
    let address = app.seed_address(buyer.id).await;
    let seller = app.seed_customer("seller-f@example.com", false).await;
    let first_store = app.seed_store(seller.id, "first").await;
    let _second_store = app.seed_store(seller.id, "second").await;
    let product = app.seed_product(first_store.id, "Bowl", dec!(8.00)).await;

    let checkout = json!({
        "user_id": buyer.id,
        "address_id": address.id,
        "payment_method": "COD",
        "items": [
            { "product_id": product.id, "quantity": 1, "price": "8.00" }
        ]
    });
    let response = app
        .request_as(buyer.id, Method::POST, "/api/v1/checkout", Some(checkout))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(
        orders[0]["store_id"].as_str().unwrap(),
        first_store.id.to_string()
    );
}

#[tokio::test]
async fn storeless_items_fail_when_no_store_exists() {
    let app = TestApp::new().await;
    let buyer = app.seed_customer("nostore@example.com", false).await;
    let address = app.seed_address(buyer.id).await;

    let checkout = json!({
        "user_id": buyer.id,
        "address_id": address.id,
        "payment_method": "COD",
        "items": [
            { "product_id": Uuid::new_v4(), "quantity": 1, "price": "8.00" }
        ]
    });
    let response = app
        .request_as(buyer.id, Method::POST, "/api/v1/checkout", Some(checkout))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_and_zero_quantity_submissions_are_rejected() {
    let app = TestApp::new().await;
    let buyer = app.seed_customer("invalid@example.com", false).await;
    let address = app.seed_address(buyer.id).await;

    let empty = json!({
        "user_id": buyer.id,
        "address_id": address.id,
        "payment_method": "COD",
        "items": []
    });
    let response = app
        .request_as(buyer.id, Method::POST, "/api/v1/checkout", Some(empty))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let zero_qty = json!({
        "user_id": buyer.id,
        "address_id": address.id,
        "payment_method": "COD",
        "items": [
            { "product_id": Uuid::new_v4(), "quantity": 0, "price": "8.00" }
        ]
    });
    let response = app
        .request_as(buyer.id, Method::POST, "/api/v1/checkout", Some(zero_qty))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_address_is_a_not_found() {
    let app = TestApp::new().await;
    let buyer = app.seed_customer("noaddr@example.com", false).await;
    let seller = app.seed_customer("seller-n@example.com", false).await;
    let store = app.seed_store(seller.id, "epsilon").await;
    let product = app.seed_product(store.id, "Desk", dec!(99.00)).await;

    let checkout = json!({
        "user_id": buyer.id,
        "address_id": Uuid::new_v4(),
        "payment_method": "COD",
        "items": [
            { "product_id": product.id, "store_id": store.id, "quantity": 1, "price": "99.00" }
        ]
    });
    let response = app
        .request_as(buyer.id, Method::POST, "/api/v1/checkout", Some(checkout))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checking_out_as_someone_else_is_forbidden() {
    let app = TestApp::new().await;
    let buyer = app.seed_customer("victim@example.com", false).await;
    let other = app.seed_customer("other@example.com", false).await;
    let address = app.seed_address(buyer.id).await;

    let checkout = json!({
        "user_id": buyer.id,
        "address_id": address.id,
        "payment_method": "COD",
        "items": [
            { "product_id": Uuid::new_v4(), "store_id": Uuid::new_v4(), "quantity": 1, "price": "1.00" }
        ]
    });
    let response = app
        .request_as(other.id, Method::POST, "/api/v1/checkout", Some(checkout))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn checkout_without_identity_headers_is_unauthorized() {
    let app = TestApp::new().await;

    let checkout = json!({
        "user_id": Uuid::new_v4(),
        "address_id": Uuid::new_v4(),
        "payment_method": "COD",
        "items": []
    });
    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(checkout), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
