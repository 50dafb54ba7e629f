//! Order, order item, and order event models.
//!
//! Line items are denormalized snapshots: the fields a customer saw at
//! checkout are copied onto the item so the order survives any later catalog
//! mutation (including product deletion). The charged `price` is the one
//! field the snapshot-refresh webhook must never touch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marigold_core::{OrderId, OrderState, PaymentMethod, ProductId, StatusParseError, UserId};

use super::catalog::ProductDoc;

/// Customer details captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub email: String,
    /// Local account id of the buyer, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// A denormalized order line item.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Option<String>,
    /// Price charged at order time. Immutable for the life of the order.
    pub price: Decimal,
    // Snapshot display fields, refreshed by the catalog webhook.
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub images: Vec<serde_json::Value>,
    pub discount: Option<Decimal>,
    pub product_link: Option<String>,
    pub status: Option<String>,
}

impl OrderItem {
    /// Build a line item by snapshotting a catalog document.
    #[must_use]
    pub fn snapshot(product: &ProductDoc, quantity: u32, size: Option<String>) -> Self {
        Self {
            product_id: product.id.clone(),
            quantity,
            size,
            price: product.price,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            images: product.images.clone(),
            discount: product.discount,
            product_link: product.product_link.clone(),
            status: product.status.clone(),
        }
    }
}

/// A customer order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing order number, e.g. `ORD-1714041600000-a3f29c`.
    pub order_number: String,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub coupon_code: Option<String>,
    pub state: OrderState,
    pub payment_method: PaymentMethod,
    /// Gateway's own order id (Razorpay `order_xxx`).
    pub gateway_order_id: Option<String>,
    /// Gateway's payment/transaction id once settled.
    pub gateway_payment_id: Option<String>,
    /// PhonePe merchant transaction id, used for callback lookup.
    pub merchant_transaction_id: Option<String>,
    /// Instrument details reported by the gateway (card network, UPI id, ...).
    pub payment_instrument: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Legacy split-status view, still exposed on the wire.
    #[must_use]
    pub const fn payment_status(&self) -> &'static str {
        self.state.payment_status(self.payment_method)
    }

    /// Legacy split-status view, still exposed on the wire.
    #[must_use]
    pub const fn order_status(&self) -> &'static str {
        self.state.order_status(self.payment_method)
    }
}

/// What happened to an order.
///
/// Stored append-only; payment-settling kinds carry the gateway transaction
/// id that makes reconciliation idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    OrderPlaced,
    PaymentConfirmed,
    PaymentFailed,
    OrderCancelled,
    OrderRefunded,
}

impl OrderEventKind {
    /// The order state this event lands the order in.
    #[must_use]
    pub const fn target_state(self) -> OrderState {
        match self {
            Self::OrderPlaced => OrderState::Pending,
            Self::PaymentConfirmed => OrderState::Paid,
            Self::PaymentFailed => OrderState::Failed,
            Self::OrderCancelled => OrderState::Cancelled,
            Self::OrderRefunded => OrderState::Refunded,
        }
    }

    /// The event that records a transition into `state`.
    #[must_use]
    pub const fn for_state(state: OrderState) -> Self {
        match state {
            OrderState::Pending => Self::OrderPlaced,
            OrderState::Paid => Self::PaymentConfirmed,
            OrderState::Failed => Self::PaymentFailed,
            OrderState::Cancelled => Self::OrderCancelled,
            OrderState::Refunded => Self::OrderRefunded,
        }
    }
}

impl std::fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OrderPlaced => "order_placed",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::PaymentFailed => "payment_failed",
            Self::OrderCancelled => "order_cancelled",
            Self::OrderRefunded => "order_refunded",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for OrderEventKind {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order_placed" => Ok(Self::OrderPlaced),
            "payment_confirmed" => Ok(Self::PaymentConfirmed),
            "payment_failed" => Ok(Self::PaymentFailed),
            "order_cancelled" => Ok(Self::OrderCancelled),
            "order_refunded" => Ok(Self::OrderRefunded),
            _ => Err(StatusParseError {
                kind: "order event",
                value: s.to_owned(),
            }),
        }
    }
}

/// One row of an order's append-only event log.
#[derive(Debug, Clone)]
pub struct OrderEvent {
    pub id: i64,
    pub order_id: OrderId,
    pub kind: OrderEventKind,
    /// Gateway transaction id for payment events; unique across the log.
    pub gateway_txn_id: Option<String>,
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    fn product() -> ProductDoc {
        serde_json::from_value(serde_json::json!({
            "_id": "prod_7b2e",
            "name": "Kolhapuri sandals",
            "slug": "kolhapuri-sandals",
            "price": "1299.00",
            "status": "in_stock",
        }))
        .expect("product doc")
    }

    #[test]
    fn snapshot_copies_price_at_order_time() {
        let item = OrderItem::snapshot(&product(), 2, Some("42".into()));
        assert_eq!(item.price, dec("1299.00"));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.name, "Kolhapuri sandals");
    }

    #[test]
    fn event_kinds_match_their_target_states() {
        for kind in [
            OrderEventKind::OrderPlaced,
            OrderEventKind::PaymentConfirmed,
            OrderEventKind::PaymentFailed,
            OrderEventKind::OrderCancelled,
            OrderEventKind::OrderRefunded,
        ] {
            assert_eq!(OrderEventKind::for_state(kind.target_state()), kind);
            let parsed: OrderEventKind = kind.to_string().parse().expect("round trip");
            assert_eq!(parsed, kind);
        }
    }
}
