//! Coupon model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use marigold_core::{CouponId, DiscountType};

/// A discount rule managed by the shop team.
#[derive(Debug, Clone)]
pub struct Coupon {
    pub id: CouponId,
    /// Customer-facing code, stored uppercase.
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage (0-100) or flat rupee amount, per `discount_type`.
    pub discount_value: Decimal,
    /// Minimum cart amount for the coupon to apply.
    pub minimum_amount: Decimal,
    /// Hard cap on the computed discount.
    pub maximum_discount: Decimal,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    /// When non-empty, only items in these categories count toward the
    /// discountable subtotal.
    pub applicable_categories: Vec<String>,
    pub is_active: bool,
}
