//! Business logic services.

pub mod auth;
pub mod catalog;
pub mod coupons;
pub mod email;
pub mod phonepe;
pub mod razorpay;

pub use auth::{AuthError, AuthService};
pub use catalog::{CatalogClient, CatalogError};
pub use coupons::{CouponQuote, CouponRejection, PricedItem};
pub use email::{EmailError, EmailService};
pub use phonepe::{PhonepeClient, PhonepeError};
pub use razorpay::{RazorpayClient, RazorpayError};
