use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bazaar API",
        version = env!("CARGO_PKG_VERSION"),
        description = r#"
Multi-vendor storefront API: carts, checkout, coupons, products, orders,
wishlists, addresses, stores, and buyer-seller messages.

## Identity

Requests are expected to arrive through a trusted proxy that injects
`X-User-Id` (UUID) and `X-User-Role` (`USER` or `ADMIN`) headers.

## Errors

Failures use a consistent envelope:

```json
{
  "error": "Not Found",
  "message": "product 5b1f... not found",
  "timestamp": "2026-08-01T00:00:00Z"
}
```
        "#,
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "checkout", description = "Order placement"),
        (name = "cart", description = "Server-side cart persistence"),
        (name = "coupons", description = "Coupon preview and management"),
        (name = "products", description = "Catalog browsing"),
        (name = "orders", description = "Order history and fulfillment"),
    ),
    paths(
        crate::handlers::checkout::place_order,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::sync_cart,
        crate::handlers::coupons::preview_coupon,
        crate::handlers::coupons::list_coupons,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::orders::list_my_orders,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::services::checkout::CheckoutRequest,
            crate::services::checkout::CheckoutItem,
            crate::services::coupons::CreateCouponInput,
            crate::services::products::CreateProductInput,
            crate::services::stores::CreateStoreInput,
            crate::services::addresses::CreateAddressInput,
            crate::services::pricing::AppliedCoupon,
            crate::services::pricing::CouponRejection,
            crate::handlers::checkout::CheckoutResponse,
            crate::handlers::carts::SyncCartRequest,
            crate::handlers::carts::SyncCartResponse,
            crate::handlers::carts::GetCartResponse,
            crate::handlers::coupons::PreviewRequest,
            crate::handlers::coupons::PreviewResponse,
            crate::handlers::messages::SendMessageRequest,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/checkout"));
        assert!(doc.paths.paths.contains_key("/api/v1/cart"));
        assert!(doc.paths.paths.contains_key("/api/v1/coupons/preview"));
    }

    #[test]
    fn spec_serializes_to_json() {
        let json = ApiDoc::openapi().to_json().unwrap();
        assert!(json.contains("Bazaar API"));
    }
}
