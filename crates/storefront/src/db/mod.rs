//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `marigold_storefront`
//!
//! The catalog lives in the hosted content API; this database stores only
//! what the storefront owns:
//!
//! ## Tables
//!
//! - `user` - Site authentication
//! - `sessions` - Tower-sessions storage
//! - `order` / `order_item` - Orders with denormalized product snapshots
//! - `order_event` - Append-only per-order event log
//! - `coupon` - Discount rules
//! - `cart` / `wishlist` - Singleton-per-user documents
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p marigold-cli -- migrate
//! ```

pub mod carts;
pub mod coupons;
pub mod orders;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::{CartRepository, WishlistRepository};
pub use coupons::CouponRepository;
pub use orders::{NewOrder, OrderRepository, PaymentUpdate, SettleOutcome};
pub use users::UserRepository;

use marigold_core::OrderState;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The order state machine forbids the requested transition.
    #[error("illegal order transition: {from} -> {to}")]
    IllegalTransition { from: OrderState, to: OrderState },
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
