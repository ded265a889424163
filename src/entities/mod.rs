/// Storefront entities module
pub mod cart;
pub mod coupon;
pub mod customer;
pub mod customer_address;
pub mod message;
pub mod order;
pub mod order_item;
pub mod product;
pub mod store;
pub mod wishlist_item;

// Re-export entities
pub use cart::{Entity as Cart, Model as CartModel};
pub use coupon::{Entity as Coupon, Model as CouponModel};
pub use customer::{Entity as Customer, Model as CustomerModel};
pub use customer_address::{Entity as CustomerAddress, Model as CustomerAddressModel};
pub use message::{Entity as Message, Model as MessageModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus, PaymentMethod};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use store::{ApprovalStatus, Entity as Store, Model as StoreModel};
pub use wishlist_item::{Entity as WishlistItem, Model as WishlistItemModel};
