//! Coupon evaluation.
//!
//! Pure logic over an already-loaded [`Coupon`] and the priced cart lines.
//! Category-restricted coupons discount only the subtotal of matching lines;
//! the cap in `maximum_discount` is applied after that recompute, so a capped
//! percentage coupon can never exceed its cap regardless of which lines match.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use marigold_core::DiscountType;

use crate::models::Coupon;

/// A cart line with everything coupon evaluation needs.
#[derive(Debug, Clone)]
pub struct PricedItem {
    pub price: Decimal,
    pub quantity: u32,
    pub categories: Vec<String>,
}

impl PricedItem {
    fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    fn matches_any(&self, categories: &[String]) -> bool {
        self.categories
            .iter()
            .any(|c| categories.iter().any(|r| r.eq_ignore_ascii_case(c)))
    }
}

/// Why a coupon cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    /// No active coupon with this code.
    #[error("Invalid coupon code")]
    NotFound,

    /// The coupon's validity window hasn't opened yet.
    #[error("This coupon is not active yet")]
    NotYetActive,

    /// The coupon's validity window has closed.
    #[error("This coupon has expired")]
    Expired,

    /// Order subtotal is below the coupon's minimum.
    #[error("Minimum order amount of \u{20b9}{required} not met")]
    BelowMinimum { required: Decimal },

    /// Category-restricted coupon with no matching items in the cart.
    #[error("This coupon does not apply to any items in your cart")]
    NotApplicable,
}

/// A successfully evaluated coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponQuote {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// Final discount, capped and never more than the applicable subtotal.
    pub discount: Decimal,
    /// Subtotal of the lines the coupon applied to.
    pub applicable_subtotal: Decimal,
}

/// Evaluate a coupon against the cart at `now`.
///
/// The caller resolves the code to a [`Coupon`] first; an absent or inactive
/// code maps to [`CouponRejection::NotFound`] before this function runs.
///
/// # Errors
///
/// Returns a [`CouponRejection`] describing why the coupon cannot apply.
pub fn evaluate(
    coupon: &Coupon,
    items: &[PricedItem],
    now: DateTime<Utc>,
) -> Result<CouponQuote, CouponRejection> {
    if now < coupon.valid_from {
        return Err(CouponRejection::NotYetActive);
    }
    if now > coupon.valid_until {
        return Err(CouponRejection::Expired);
    }

    let order_subtotal: Decimal = items.iter().map(PricedItem::line_total).sum();
    if order_subtotal < coupon.minimum_amount {
        return Err(CouponRejection::BelowMinimum {
            required: coupon.minimum_amount,
        });
    }

    // Restricted coupons discount only the matching lines.
    let applicable_subtotal = if coupon.applicable_categories.is_empty() {
        order_subtotal
    } else {
        let matching: Decimal = items
            .iter()
            .filter(|item| item.matches_any(&coupon.applicable_categories))
            .map(PricedItem::line_total)
            .sum();

        if matching.is_zero() {
            return Err(CouponRejection::NotApplicable);
        }
        matching
    };

    let raw = match coupon.discount_type {
        DiscountType::Percentage => {
            applicable_subtotal * coupon.discount_value / Decimal::ONE_HUNDRED
        }
        DiscountType::Fixed => coupon.discount_value,
    };

    // Cap after the restricted-subtotal recompute, then never discount more
    // than what the coupon applies to.
    let discount = raw.min(coupon.maximum_discount).min(applicable_subtotal);

    Ok(CouponQuote {
        code: coupon.code.clone(),
        discount_type: coupon.discount_type,
        discount_value: coupon.discount_value,
        discount,
        applicable_subtotal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use marigold_core::CouponId;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("valid decimal")
    }

    fn coupon(discount_type: DiscountType, value: &str) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: CouponId::new(1),
            code: "SAVE10".to_string(),
            discount_type,
            discount_value: dec(value),
            minimum_amount: Decimal::ZERO,
            maximum_discount: dec("1000000"),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(1),
            applicable_categories: Vec::new(),
            is_active: true,
        }
    }

    fn item(price: &str, quantity: u32, categories: &[&str]) -> PricedItem {
        PricedItem {
            price: dec(price),
            quantity,
            categories: categories.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_percentage_discount() {
        let c = coupon(DiscountType::Percentage, "10");
        let quote = evaluate(&c, &[item("500", 2, &[])], Utc::now()).expect("applies");
        assert_eq!(quote.discount, dec("100"));
        assert_eq!(quote.applicable_subtotal, dec("1000"));
    }

    #[test]
    fn test_fixed_discount() {
        let c = coupon(DiscountType::Fixed, "150");
        let quote = evaluate(&c, &[item("1000", 1, &[])], Utc::now()).expect("applies");
        assert_eq!(quote.discount, dec("150"));
    }

    #[test]
    fn test_maximum_discount_caps_percentage() {
        let mut c = coupon(DiscountType::Percentage, "10");
        c.maximum_discount = dec("50");
        let quote = evaluate(&c, &[item("1000", 1, &[])], Utc::now()).expect("applies");
        assert_eq!(quote.discount, dec("50"));
    }

    #[test]
    fn test_cap_applies_after_category_recompute() {
        // 20% of the matching 400 line is 80, still above the 50 cap.
        let mut c = coupon(DiscountType::Percentage, "20");
        c.maximum_discount = dec("50");
        c.applicable_categories = vec!["shirts".to_string()];
        let items = [item("400", 1, &["shirts"]), item("600", 1, &["shoes"])];
        let quote = evaluate(&c, &items, Utc::now()).expect("applies");
        assert_eq!(quote.applicable_subtotal, dec("400"));
        assert_eq!(quote.discount, dec("50"));
    }

    #[test]
    fn test_restricted_coupon_uses_matching_subtotal() {
        let mut c = coupon(DiscountType::Percentage, "10");
        c.applicable_categories = vec!["shirts".to_string()];
        let items = [item("400", 1, &["shirts"]), item("600", 1, &["shoes"])];
        let quote = evaluate(&c, &items, Utc::now()).expect("applies");
        assert_eq!(quote.discount, dec("40"));
    }

    #[test]
    fn test_restricted_coupon_with_no_matches_rejected() {
        let mut c = coupon(DiscountType::Percentage, "10");
        c.applicable_categories = vec!["shirts".to_string()];
        let items = [item("600", 1, &["shoes"])];
        assert_eq!(
            evaluate(&c, &items, Utc::now()),
            Err(CouponRejection::NotApplicable)
        );
    }

    #[test]
    fn test_category_match_is_case_insensitive() {
        let mut c = coupon(DiscountType::Percentage, "10");
        c.applicable_categories = vec!["Shirts".to_string()];
        let items = [item("400", 1, &["shirts"])];
        assert!(evaluate(&c, &items, Utc::now()).is_ok());
    }

    #[test]
    fn test_minimum_amount_enforced() {
        let mut c = coupon(DiscountType::Fixed, "50");
        c.minimum_amount = dec("500");
        assert_eq!(
            evaluate(&c, &[item("499", 1, &[])], Utc::now()),
            Err(CouponRejection::BelowMinimum {
                required: dec("500")
            })
        );
        assert!(evaluate(&c, &[item("500", 1, &[])], Utc::now()).is_ok());
    }

    #[test]
    fn test_validity_window() {
        let mut c = coupon(DiscountType::Fixed, "50");
        let now = Utc::now();

        c.valid_from = now + Duration::days(1);
        c.valid_until = now + Duration::days(2);
        assert_eq!(
            evaluate(&c, &[item("100", 1, &[])], now),
            Err(CouponRejection::NotYetActive)
        );

        c.valid_from = now - Duration::days(2);
        c.valid_until = now - Duration::days(1);
        assert_eq!(
            evaluate(&c, &[item("100", 1, &[])], now),
            Err(CouponRejection::Expired)
        );
    }

    #[test]
    fn test_discount_never_exceeds_applicable_subtotal() {
        let c = coupon(DiscountType::Fixed, "500");
        let quote = evaluate(&c, &[item("300", 1, &[])], Utc::now()).expect("applies");
        assert_eq!(quote.discount, dec("300"));
    }
}
