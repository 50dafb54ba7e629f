//! Order creation, update, and listing routes.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use marigold_core::{OrderId, OrderState, PaymentMethod};

use crate::db::{NewOrder, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{Customer, Order, OrderItem, ProductDoc};
use crate::state::AppState;

// ============================================================================
// Wire Types
// ============================================================================

/// One checkout line: the full catalog document plus quantity/size.
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub product: ProductDoc,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Request to create a pending order before gateway payment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    pub customer: Option<Customer>,
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

/// Request to create a cash-on-delivery order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodOrderRequest {
    #[serde(default)]
    pub order_number: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Request to record an order PhonePe already collected payment for.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonepeOrderRequest {
    pub payment_details: PhonepePaymentDetails,
    pub order_details: PhonepeOrderDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonepePaymentDetails {
    pub merchant_transaction_id: String,
    pub transaction_id: String,
    #[serde(default)]
    pub payment_instrument: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonepeOrderDetails {
    pub amount: Decimal,
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
}

/// Legacy split-status update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub order_status: Option<String>,
}

/// A line item as returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub images: Vec<Value>,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.as_str().to_string(),
            name: item.name.clone(),
            quantity: item.quantity,
            size: item.size.clone(),
            price: item.price,
            slug: item.slug.clone(),
            product_link: item.product_link.clone(),
            status: item.status.clone(),
            images: item.images.clone(),
        }
    }
}

/// An order as returned to the client, legacy split-status view included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer: Customer,
    pub items: Vec<OrderItemResponse>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub payment_status: &'static str,
    pub order_status: &'static str,
    pub payment_method: PaymentMethod,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer: order.customer.clone(),
            items: order.items.iter().map(Into::into).collect(),
            total_amount: order.total_amount,
            discount_amount: order.discount_amount,
            coupon_code: order.coupon_code.clone(),
            payment_status: order.payment_status(),
            order_status: order.order_status(),
            payment_method: order.payment_method,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a pending order ahead of gateway payment.
///
/// POST /api/orders/create
///
/// Repeated calls create distinct orders; there is no duplicate-submission
/// protection at this layer.
///
/// # Errors
///
/// Returns 400 when items are empty or customer/totalAmount are missing.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<Value>> {
    if body.items.is_empty() {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }
    let mut customer = body
        .customer
        .ok_or_else(|| AppError::BadRequest("Missing required fields".to_string()))?;
    let total_amount = body
        .total_amount
        .ok_or_else(|| AppError::BadRequest("Missing required fields".to_string()))?;

    customer.user_id = Some(user.id);

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .create(NewOrder {
            order_number: generate_order_number(),
            customer,
            items: snapshot_items(&body.items),
            total_amount,
            discount_amount: body.discount_amount.unwrap_or_default(),
            coupon_code: body.coupon_code,
            state: OrderState::Pending,
            payment_method: body.payment_method.unwrap_or(PaymentMethod::Razorpay),
            gateway_order_id: None,
            gateway_payment_id: None,
            merchant_transaction_id: None,
            payment_instrument: None,
            settlement_txn_id: None,
        })
        .await?;

    Ok(Json(json!({ "success": true, "orderId": order.id })))
}

/// Create a cash-on-delivery order.
///
/// POST /api/orders/cod
///
/// # Errors
///
/// Returns 400 when items are empty.
pub async fn create_cod(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CodOrderRequest>,
) -> Result<Json<Value>> {
    if body.items.is_empty() {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }

    let customer = Customer {
        name: body.customer_name,
        email: body.customer_email,
        user_id: Some(user.id),
    };

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .create(NewOrder {
            order_number: body.order_number.unwrap_or_else(generate_order_number),
            customer,
            items: snapshot_items(&body.items),
            total_amount: body.total_amount,
            discount_amount: body.discount_amount.unwrap_or_default(),
            coupon_code: body.coupon_code,
            state: OrderState::Pending,
            payment_method: PaymentMethod::Cod,
            gateway_order_id: None,
            gateway_payment_id: None,
            merchant_transaction_id: None,
            payment_instrument: None,
            settlement_txn_id: None,
        })
        .await?;

    Ok(Json(json!({ "success": true, "orderId": order.id })))
}

/// Record an order PhonePe already collected payment for.
///
/// POST /api/orders/phonepe
///
/// The order is created directly in `Paid` with the gateway transaction id
/// recorded, so a later callback for the same transaction is a no-op.
///
/// # Errors
///
/// Returns 400 when items are empty.
pub async fn create_phonepe(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<PhonepeOrderRequest>,
) -> Result<Json<Value>> {
    let details = body.order_details;
    if details.items.is_empty() {
        return Err(AppError::BadRequest("Invalid request data".to_string()));
    }
    let payment = body.payment_details;

    let customer = Customer {
        name: user.name.clone(),
        email: user.email.to_string(),
        user_id: Some(user.id),
    };

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .create(NewOrder {
            order_number: generate_order_number(),
            customer,
            items: snapshot_items(&details.items),
            total_amount: details.amount,
            discount_amount: details.discount_amount.unwrap_or_default(),
            coupon_code: details.coupon_code,
            state: OrderState::Paid,
            payment_method: PaymentMethod::Phonepe,
            gateway_order_id: None,
            gateway_payment_id: Some(payment.transaction_id.clone()),
            merchant_transaction_id: Some(payment.merchant_transaction_id),
            payment_instrument: payment.payment_instrument,
            settlement_txn_id: Some(payment.transaction_id),
        })
        .await?;

    Ok(Json(json!({ "success": true, "orderId": order.id })))
}

/// Apply a legacy split-status update to an order.
///
/// POST /api/orders/update/{order_id}
///
/// When the update lands the order in `Paid`, the confirmation email goes out
/// best-effort and the response carries `emailStatus`.
///
/// # Errors
///
/// Returns 404 for an unknown order, 400 for an unmapped status pair or an
/// illegal transition.
pub async fn update(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Path(order_id): Path<String>,
    Json(body): Json<UpdateOrderRequest>,
) -> Result<Json<Value>> {
    let order_id: OrderId = order_id
        .parse()
        .map_err(|_| AppError::BadRequest("Order ID is required".to_string()))?;

    let target = map_legacy_update(body.payment_status.as_deref(), body.order_status.as_deref())
        .ok_or_else(|| AppError::BadRequest("Unsupported status update".to_string()))?;

    let orders = OrderRepository::new(state.pool());
    let order = orders.update_state(order_id, target).await?;

    let email_status = if order.state == OrderState::Paid {
        Some(send_confirmation(&state, &order).await)
    } else {
        None
    };

    Ok(Json(json!({
        "success": true,
        "order": OrderResponse::from(&order),
        "emailStatus": email_status,
    })))
}

/// The caller's orders, newest first.
///
/// GET /api/orders
///
/// # Errors
///
/// Returns 500 if the database read fails.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());
    let orders = orders.list_for_user(user.id).await?;

    let orders: Vec<OrderResponse> = orders.iter().map(Into::into).collect();
    Ok(Json(json!({ "orders": orders })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Snapshot checkout lines into immutable order items.
fn snapshot_items(items: &[CheckoutItem]) -> Vec<OrderItem> {
    items
        .iter()
        .map(|item| OrderItem::snapshot(&item.product, item.quantity, item.size.clone()))
        .collect()
}

/// Generate a human-facing order number: `ORD-<millis>-<6 hex>`.
pub(crate) fn generate_order_number() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    format!("ORD-{}-{suffix}", Utc::now().timestamp_millis())
}

/// Map the legacy `paymentStatus`/`orderStatus` pair to a target state.
///
/// `paymentStatus` wins when both are present, matching how existing clients
/// use the endpoint. "success" is accepted as an alias for "paid".
fn map_legacy_update(payment_status: Option<&str>, order_status: Option<&str>) -> Option<OrderState> {
    match payment_status {
        Some("paid" | "success") => return Some(OrderState::Paid),
        Some("failed") => return Some(OrderState::Failed),
        Some("refunded") => return Some(OrderState::Refunded),
        _ => {}
    }

    match order_status {
        Some("cancelled") => Some(OrderState::Cancelled),
        Some("confirmed") => Some(OrderState::Paid),
        _ => None,
    }
}

/// Send the confirmation email, reporting a soft status string.
pub(crate) async fn send_confirmation(state: &AppState, order: &Order) -> &'static str {
    match state.email().send_order_confirmation(order).await {
        Ok(()) => "success",
        Err(e) => {
            tracing::warn!(
                order_number = %order.order_number,
                error = %e,
                "Confirmation email failed"
            );
            "failed"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_legacy_update_mapping() {
        assert_eq!(
            map_legacy_update(Some("paid"), None),
            Some(OrderState::Paid)
        );
        assert_eq!(
            map_legacy_update(Some("success"), None),
            Some(OrderState::Paid)
        );
        assert_eq!(
            map_legacy_update(Some("failed"), Some("cancelled")),
            Some(OrderState::Failed)
        );
        assert_eq!(
            map_legacy_update(None, Some("cancelled")),
            Some(OrderState::Cancelled)
        );
        assert_eq!(
            map_legacy_update(Some("refunded"), None),
            Some(OrderState::Refunded)
        );
        assert_eq!(map_legacy_update(None, None), None);
        assert_eq!(map_legacy_update(Some("pending"), Some("pending")), None);
    }
}
