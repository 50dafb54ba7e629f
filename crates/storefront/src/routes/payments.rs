//! Payment gateway routes: Razorpay order creation and verification, and the
//! PhonePe server-to-server callback.
//!
//! Both verification paths settle through
//! [`OrderRepository::settle_payment`], which is keyed on the gateway
//! transaction id: a re-delivered verification or callback for a transaction
//! already in the event log is acknowledged without changing anything.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use marigold_core::OrderId;

use crate::db::{OrderRepository, PaymentUpdate, RepositoryError, SettleOutcome};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::OrderEventKind;
use crate::routes::orders::send_confirmation;
use crate::services::phonepe;
use crate::state::AppState;

// ============================================================================
// Razorpay
// ============================================================================

/// Request to create a Razorpay gateway order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayOrderRequest {
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Create a gateway order for the browser checkout widget.
///
/// POST /api/payments/razorpay
///
/// # Errors
///
/// Returns 400 when the amount is missing, 502 when the gateway rejects.
pub async fn create_razorpay_order(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Json(body): Json<RazorpayOrderRequest>,
) -> Result<Json<serde_json::Value>> {
    let amount = body
        .amount
        .ok_or_else(|| AppError::BadRequest("Amount is required".to_string()))?;

    let receipt = match &body.order_id {
        Some(order_id) => format!("receipt_{order_id}"),
        None => format!("receipt_{}", Utc::now().timestamp_millis()),
    };

    let order = state.razorpay().create_order(amount, &receipt).await?;

    Ok(Json(json!({
        "orderId": order.id,
        "amount": order.amount,
        "currency": order.currency,
        "receipt": order.receipt,
    })))
}

/// Razorpay checkout verification request.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(default, rename = "orderId")]
    pub order_id: Option<OrderId>,
}

/// Verify a Razorpay payment signature and settle the order.
///
/// POST /api/verifyOrder
///
/// Unauthenticated: the signature itself is the credential. After a valid
/// signature, failure to update the order does not fail the verification
/// (the shopper's payment did go through).
///
/// # Errors
///
/// Returns 400 `{success: false}` on signature mismatch.
pub async fn verify_razorpay(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Response {
    if body.razorpay_order_id.is_empty()
        || body.razorpay_payment_id.is_empty()
        || body.razorpay_signature.is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Missing required parameters" })),
        )
            .into_response();
    }

    let valid = state.razorpay().verify_payment_signature(
        &body.razorpay_order_id,
        &body.razorpay_payment_id,
        &body.razorpay_signature,
    );

    if !valid {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Invalid signature" })),
        )
            .into_response();
    }

    if let Some(order_id) = body.order_id {
        settle_razorpay(&state, order_id, &body).await;
    }

    Json(json!({ "success": true, "message": "Payment verified successfully" })).into_response()
}

/// Settle a verified Razorpay payment. Failures are logged, never surfaced.
async fn settle_razorpay(state: &AppState, order_id: OrderId, body: &VerifyRequest) {
    let orders = OrderRepository::new(state.pool());

    let outcome = orders
        .settle_payment(
            order_id,
            OrderEventKind::PaymentConfirmed,
            &body.razorpay_payment_id,
            PaymentUpdate {
                gateway_order_id: Some(body.razorpay_order_id.clone()),
                gateway_payment_id: Some(body.razorpay_payment_id.clone()),
                payment_instrument: None,
            },
        )
        .await;

    match outcome {
        Ok(SettleOutcome::Applied) => {
            if let Ok(Some(order)) = orders.get(order_id).await {
                let _ = send_confirmation(state, &order).await;
            }
        }
        Ok(SettleOutcome::AlreadyRecorded) => {
            tracing::debug!(order_id = %order_id, "Payment already recorded");
        }
        Err(e) => {
            tracing::error!(order_id = %order_id, error = %e, "Order update after verification failed");
            sentry::capture_error(&e);
        }
    }
}

// ============================================================================
// PhonePe
// ============================================================================

/// PhonePe server-to-server callback body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    /// Base64 JSON payload.
    pub response: String,
    pub merchant_id: String,
    pub transaction_id: String,
    /// Checksum, when not sent as the `X-VERIFY` header.
    #[serde(default)]
    pub checksum: Option<String>,
}

/// Handle the PhonePe payment callback.
///
/// POST /api/payments/callback
///
/// # Errors
///
/// Returns 401 on checksum mismatch, 404 for an unknown merchant transaction
/// id, 400 for an undecodable payload.
pub async fn phonepe_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CallbackRequest>,
) -> Result<Json<serde_json::Value>> {
    let phonepe = state.phonepe();

    if body.merchant_id != phonepe.merchant_id() {
        return Err(AppError::Unauthorized("Unknown merchant".to_string()));
    }

    let provided = headers
        .get("X-VERIFY")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .or(body.checksum)
        .ok_or_else(|| AppError::Unauthorized("Missing checksum".to_string()))?;

    if !phonepe.verify_callback(&body.response, &body.transaction_id, &provided) {
        return Err(AppError::Unauthorized("Checksum mismatch".to_string()));
    }

    let payload = phonepe::decode_response(&body.response)
        .map_err(|e| AppError::BadRequest(format!("Invalid callback payload: {e}")))?;

    let orders = OrderRepository::new(state.pool());
    let order_id = orders
        .find_by_merchant_txn(&body.transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let kind = if payload.is_success() {
        OrderEventKind::PaymentConfirmed
    } else if payload.is_failure() {
        OrderEventKind::PaymentFailed
    } else {
        // Intermediate codes (PAYMENT_PENDING etc) are acknowledged untouched.
        return Ok(Json(json!({ "success": true })));
    };

    let outcome = orders
        .settle_payment(
            order_id,
            kind,
            &payload.data.transaction_id,
            PaymentUpdate {
                gateway_order_id: None,
                gateway_payment_id: Some(payload.data.transaction_id.clone()),
                payment_instrument: payload.data.payment_instrument.clone(),
            },
        )
        .await;

    match outcome {
        Ok(_) => Ok(Json(json!({ "success": true }))),
        // A conflicting transition for a known transaction is still settled
        // from the gateway's point of view.
        Err(RepositoryError::IllegalTransition { from, to }) => {
            tracing::warn!(
                order_id = %order_id,
                %from,
                %to,
                "Callback arrived for an order that already moved on"
            );
            Ok(Json(json!({ "success": true })))
        }
        Err(e) => Err(e.into()),
    }
}
