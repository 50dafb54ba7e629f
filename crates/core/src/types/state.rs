//! Order lifecycle state machine and payment enums.
//!
//! An order carries exactly one [`OrderState`]. Every mutation goes through
//! [`OrderState::can_transition`], and the storefront appends an event row per
//! transition, so the full history of an order is reconstructable from its
//! event log.
//!
//! Older clients still speak the split `paymentStatus`/`orderStatus` pair,
//! which is derived from `(state, payment_method)` in
//! [`OrderState::payment_status`] and [`OrderState::order_status`].

use serde::{Deserialize, Serialize};

/// Error parsing a status enum from its wire/database representation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct StatusParseError {
    /// Which enum failed to parse.
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

/// The single tagged state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_state", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Created at checkout; payment not yet settled. COD orders stay here
    /// until delivery.
    #[default]
    Pending,
    /// Gateway confirmed the charge.
    Paid,
    /// Gateway reported the charge as declined or errored.
    Failed,
    /// Cancelled before payment settled.
    Cancelled,
    /// Paid and later refunded.
    Refunded,
}

impl OrderState {
    /// Whether a transition from `self` to `next` is legal.
    ///
    /// Failed, Cancelled, and Refunded are terminal. Self-transitions are
    /// not legal here; idempotent re-delivery is handled one level up by the
    /// gateway-transaction-id check, not by the state machine.
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid | Self::Failed | Self::Cancelled)
                | (Self::Paid, Self::Refunded)
        )
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Refunded)
    }

    /// Legacy `paymentStatus` view of this state.
    #[must_use]
    pub const fn payment_status(self, method: PaymentMethod) -> &'static str {
        match self {
            Self::Pending | Self::Cancelled => match method {
                PaymentMethod::Cod => "cod",
                PaymentMethod::Razorpay | PaymentMethod::Phonepe => "pending",
            },
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Legacy `orderStatus` view of this state.
    #[must_use]
    pub const fn order_status(self, method: PaymentMethod) -> &'static str {
        match self {
            Self::Pending => match method {
                // COD orders are confirmed at placement; there is nothing to
                // settle before fulfilment.
                PaymentMethod::Cod => "confirmed",
                PaymentMethod::Razorpay | PaymentMethod::Phonepe => "pending",
            },
            Self::Paid => "confirmed",
            Self::Failed | Self::Cancelled | Self::Refunded => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for OrderState {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            _ => Err(StatusParseError {
                kind: "order state",
                value: s.to_owned(),
            }),
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// Razorpay checkout with HMAC-signed confirmation.
    Razorpay,
    /// PhonePe checkout with checksum-verified status callback.
    Phonepe,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cod => "cod",
            Self::Razorpay => "razorpay",
            Self::Phonepe => "phonepe",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "razorpay" => Ok(Self::Razorpay),
            "phonepe" => Ok(Self::Phonepe),
            _ => Err(StatusParseError {
                kind: "payment method",
                value: s.to_owned(),
            }),
        }
    }
}

/// How a coupon's discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.discount_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the applicable subtotal.
    Percentage,
    /// `discount_value` is a flat rupee amount.
    Fixed,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_settle_or_die() {
        assert!(OrderState::Pending.can_transition(OrderState::Paid));
        assert!(OrderState::Pending.can_transition(OrderState::Failed));
        assert!(OrderState::Pending.can_transition(OrderState::Cancelled));
        assert!(!OrderState::Pending.can_transition(OrderState::Refunded));
    }

    #[test]
    fn paid_only_refunds() {
        assert!(OrderState::Paid.can_transition(OrderState::Refunded));
        assert!(!OrderState::Paid.can_transition(OrderState::Pending));
        assert!(!OrderState::Paid.can_transition(OrderState::Failed));
        assert!(!OrderState::Paid.can_transition(OrderState::Cancelled));
    }

    #[test]
    fn terminal_states_stay_terminal() {
        for terminal in [
            OrderState::Failed,
            OrderState::Cancelled,
            OrderState::Refunded,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                OrderState::Pending,
                OrderState::Paid,
                OrderState::Failed,
                OrderState::Cancelled,
                OrderState::Refunded,
            ] {
                assert!(!terminal.can_transition(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn legacy_view_for_cod() {
        let s = OrderState::Pending;
        assert_eq!(s.payment_status(PaymentMethod::Cod), "cod");
        assert_eq!(s.order_status(PaymentMethod::Cod), "confirmed");
    }

    #[test]
    fn legacy_view_for_cancelled_orders() {
        // Cancelling rewrites orderStatus only: a COD order keeps its "cod"
        // payment marker, a gateway order stays "pending".
        let s = OrderState::Cancelled;
        assert_eq!(s.payment_status(PaymentMethod::Cod), "cod");
        assert_eq!(s.order_status(PaymentMethod::Cod), "cancelled");
        assert_eq!(s.payment_status(PaymentMethod::Razorpay), "pending");
        assert_eq!(s.order_status(PaymentMethod::Razorpay), "cancelled");
    }

    #[test]
    fn legacy_view_for_settled_gateway_order() {
        let s = OrderState::Paid;
        assert_eq!(s.payment_status(PaymentMethod::Razorpay), "paid");
        assert_eq!(s.order_status(PaymentMethod::Razorpay), "confirmed");
    }

    #[test]
    fn states_round_trip_through_str() {
        for s in [
            OrderState::Pending,
            OrderState::Paid,
            OrderState::Failed,
            OrderState::Cancelled,
            OrderState::Refunded,
        ] {
            let parsed: OrderState = s.to_string().parse().expect("round trip");
            assert_eq!(s, parsed);
        }
        assert!("shipped".parse::<OrderState>().is_err());
    }
}
