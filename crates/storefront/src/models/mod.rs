//! Domain models for the storefront.
//!
//! These are the in-memory shapes handlers and repositories trade in. Wire
//! request/response types live next to their handlers in `routes`.

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod order;
pub mod user;

pub use cart::{CartDocument, CartItem, WishlistDocument, WishlistItem};
pub use catalog::ProductDoc;
pub use coupon::Coupon;
pub use order::{Customer, Order, OrderEvent, OrderEventKind, OrderItem};
pub use user::{CurrentUser, User, session_keys};
