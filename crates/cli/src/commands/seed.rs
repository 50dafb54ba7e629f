//! Seed the database with the demo coupon set.
//!
//! Coupons are normally managed by the shop team directly in the database;
//! this command exists so a fresh environment has something to test with.
//!
//! # Usage
//!
//! ```bash
//! ml-cli seed coupons
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for storefront

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use marigold_core::{CouponId, DiscountType};
use marigold_storefront::db::{CouponRepository, RepositoryError, create_pool};
use marigold_storefront::models::Coupon;

/// Errors that can occur during seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Upsert the demo coupon set.
///
/// # Errors
///
/// Returns `SeedError` if the env var is missing or a database operation
/// fails.
pub async fn coupons() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| SeedError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    let pool = create_pool(&database_url).await?;
    let repo = CouponRepository::new(&pool);

    let demo = demo_coupons();
    for coupon in &demo {
        repo.upsert(coupon).await?;
        tracing::info!(code = %coupon.code, "Seeded coupon");
    }

    tracing::info!("Seeded {} coupons", demo.len());
    Ok(())
}

/// The demo coupon set, valid for a year from the moment of seeding.
fn demo_coupons() -> Vec<Coupon> {
    let now = Utc::now();
    let next_year = now + Duration::days(365);

    vec![
        Coupon {
            id: CouponId::new(0),
            code: "WELCOME10".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::from(10),
            minimum_amount: Decimal::from(500),
            maximum_discount: Decimal::from(200),
            valid_from: now,
            valid_until: next_year,
            applicable_categories: Vec::new(),
            is_active: true,
        },
        Coupon {
            id: CouponId::new(0),
            code: "FLAT100".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: Decimal::from(100),
            minimum_amount: Decimal::from(999),
            maximum_discount: Decimal::from(100),
            valid_from: now,
            valid_until: next_year,
            applicable_categories: Vec::new(),
            is_active: true,
        },
        Coupon {
            id: CouponId::new(0),
            code: "SAREE15".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: Decimal::from(15),
            minimum_amount: Decimal::from(1500),
            maximum_discount: Decimal::from(750),
            valid_from: now,
            valid_until: next_year,
            applicable_categories: vec!["sarees".to_string()],
            is_active: true,
        },
    ]
}
