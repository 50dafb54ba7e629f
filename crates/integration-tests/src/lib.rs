//! Integration tests for Marigold Lane.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! cargo run -p marigold-cli -- migrate
//! cargo run -p marigold-cli -- seed coupons
//!
//! # Start the storefront
//! cargo run -p marigold-storefront
//!
//! # Run integration tests
//! cargo test -p marigold-integration-tests -- --ignored
//! ```
//!
//! Tests are `#[ignore]`d by default because they need a live server.

use reqwest::Client;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client with a cookie store, so the session survives across requests.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A throwaway email address for registration tests.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", uuid::Uuid::new_v4().simple())
}
