pub mod addresses;
pub mod carts;
pub mod checkout;
pub mod common;
pub mod coupons;
pub mod messages;
pub mod orders;
pub mod products;
pub mod stores;
pub mod wishlist;

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::notifications::{HttpApiMailer, LogMailer, Mailer, ReceiptNotifier};
use crate::services::{
    addresses::AddressService, carts::CartSyncService, checkout::CheckoutService,
    coupons::CouponService, messages::MessageService, orders::OrderService,
    pricing::PricingService, products::ProductService, stores::StoreService,
    wishlists::WishlistService,
};

/// All services, wired once at startup and shared through [`crate::AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub carts: CartSyncService,
    pub checkout: CheckoutService,
    pub pricing: PricingService,
    pub orders: OrderService,
    pub products: ProductService,
    pub coupons: CouponService,
    pub wishlists: WishlistService,
    pub stores: StoreService,
    pub messages: MessageService,
    pub addresses: AddressService,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        let mailer: Arc<dyn Mailer> = match &config.mailer_endpoint {
            Some(endpoint) => Arc::new(HttpApiMailer::new(
                endpoint.clone(),
                config.mailer_api_key.clone(),
                config.mail_from.clone(),
            )),
            None => Arc::new(LogMailer),
        };
        let notifier = ReceiptNotifier::new(db.clone(), mailer, config.admin_email.clone());

        Self {
            carts: CartSyncService::new(db.clone(), event_sender.clone()),
            checkout: CheckoutService::new(
                db.clone(),
                event_sender.clone(),
                notifier,
                Duration::from_secs(config.checkout_txn_timeout_secs),
                config.default_currency.clone(),
            ),
            pricing: PricingService::new(db.clone()),
            orders: OrderService::new(db.clone(), event_sender.clone()),
            products: ProductService::new(db.clone(), event_sender.clone()),
            coupons: CouponService::new(db.clone(), event_sender.clone()),
            wishlists: WishlistService::new(db.clone(), event_sender.clone()),
            stores: StoreService::new(db.clone(), event_sender.clone()),
            messages: MessageService::new(db.clone(), event_sender.clone()),
            addresses: AddressService::new(db, event_sender),
        }
    }
}
