//! Monetary helpers.
//!
//! All amounts in the system are `rust_decimal::Decimal` rupee values.
//! Razorpay's API wants integer paise, so the conversion lives here where it
//! can be unit tested away from any HTTP code.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;

/// Convert a rupee amount to integer paise, rounding half-up like the
/// gateway's own dashboard does.
///
/// Returns `None` when the amount is negative or does not fit in an `i64`
/// (the gateway rejects such values anyway).
#[must_use]
pub fn to_paise(amount: Decimal) -> Option<i64> {
    if amount.is_sign_negative() {
        return None;
    }
    // Decimal::round is banker's rounding; the gateway rounds midpoints up.
    let paise = (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    paise.to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    #[test]
    fn whole_rupees_convert_exactly() {
        assert_eq!(to_paise(dec("499")), Some(49_900));
        assert_eq!(to_paise(dec("0")), Some(0));
    }

    #[test]
    fn fractional_paise_round_half_up() {
        assert_eq!(to_paise(dec("10.005")), Some(1001));
        assert_eq!(to_paise(dec("10.004")), Some(1000));
    }

    #[test]
    fn negative_amounts_are_refused() {
        assert_eq!(to_paise(dec("-1")), None);
    }
}
