pub mod addresses;
pub mod carts;
pub mod checkout;
pub mod coupons;
pub mod messages;
pub mod orders;
pub mod pricing;
pub mod products;
pub mod stores;
pub mod wishlists;
