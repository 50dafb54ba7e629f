//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (probes the database)
//!
//! # Auth
//! POST /api/auth/register          - Create an account and sign in
//! POST /api/auth/login             - Sign in
//! POST /api/auth/logout            - Sign out
//! GET  /api/auth/me                - Current user
//!
//! # Cart & wishlist
//! GET  /api/cart                   - Fetch the caller's cart
//! POST /api/cart                   - Replace the caller's cart
//! GET  /api/wishlist               - Fetch the caller's wishlist
//! POST /api/wishlist               - Replace the caller's wishlist
//! PUT  /api/wishlist               - Toggle one product in the wishlist
//!
//! # Coupons
//! POST /api/coupons/validate       - Validate a coupon against the cart
//!
//! # Orders
//! GET  /api/orders                 - The caller's orders, newest first
//! POST /api/orders/create          - Create a pending (gateway) order
//! POST /api/orders/cod             - Create a cash-on-delivery order
//! POST /api/orders/phonepe         - Record a PhonePe-paid order
//! POST /api/orders/update/{id}     - Apply a state change to an order
//!
//! # Payments
//! POST /api/payments/razorpay      - Create a Razorpay gateway order
//! POST /api/verifyOrder            - Verify a Razorpay payment signature
//! POST /api/payments/callback      - PhonePe server-to-server callback
//!
//! # Webhooks
//! POST /api/webhooks/content       - Catalog change notification
//! ```

pub mod auth;
pub mod cart;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod webhooks;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/create", post(orders::create))
        .route("/cod", post(orders::create_cod))
        .route("/phonepe", post(orders::create_phonepe))
        .route("/update/{order_id}", post(orders::update))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .route("/api/cart", get(cart::show).post(cart::replace))
        .route(
            "/api/wishlist",
            get(wishlist::show)
                .post(wishlist::replace)
                .put(wishlist::toggle),
        )
        .route("/api/coupons/validate", post(coupons::validate))
        .nest("/api/orders", order_routes())
        .route("/api/payments/razorpay", post(payments::create_razorpay_order))
        .route("/api/verifyOrder", post(payments::verify_razorpay))
        .route("/api/payments/callback", post(payments::phonepe_callback))
        .route("/api/webhooks/content", post(webhooks::content))
}
