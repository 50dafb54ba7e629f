//! Coupon repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use marigold_core::{CouponId, DiscountType};

use super::RepositoryError;
use crate::models::Coupon;

/// Internal row type for `PostgreSQL` coupon queries.
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i32,
    code: String,
    discount_type: DiscountType,
    discount_value: Decimal,
    minimum_amount: Decimal,
    maximum_discount: Decimal,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    applicable_categories: Vec<String>,
    is_active: bool,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Self {
            id: CouponId::new(row.id),
            code: row.code,
            discount_type: row.discount_type,
            discount_value: row.discount_value,
            minimum_amount: row.minimum_amount,
            maximum_discount: row.maximum_discount,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            applicable_categories: row.applicable_categories,
            is_active: row.is_active,
        }
    }
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an active coupon by code. Codes are matched case-insensitively.
    ///
    /// Inactive coupons are treated as absent, matching how the shop team
    /// retires codes without deleting them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT id, code, discount_type, discount_value, minimum_amount,
                   maximum_discount, valid_from, valid_until,
                   applicable_categories, is_active
            FROM storefront.coupon
            WHERE upper(code) = upper($1) AND is_active
            ",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a coupon, replacing any existing coupon with the same code.
    ///
    /// Used by the seeding CLI; the shop team normally manages coupons
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, coupon: &Coupon) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.coupon
                (code, discount_type, discount_value, minimum_amount,
                 maximum_discount, valid_from, valid_until,
                 applicable_categories, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (code) DO UPDATE SET
                discount_type = EXCLUDED.discount_type,
                discount_value = EXCLUDED.discount_value,
                minimum_amount = EXCLUDED.minimum_amount,
                maximum_discount = EXCLUDED.maximum_discount,
                valid_from = EXCLUDED.valid_from,
                valid_until = EXCLUDED.valid_until,
                applicable_categories = EXCLUDED.applicable_categories,
                is_active = EXCLUDED.is_active
            ",
        )
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.minimum_amount)
        .bind(coupon.maximum_discount)
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(&coupon.applicable_categories)
        .bind(coupon.is_active)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
