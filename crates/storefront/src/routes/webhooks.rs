//! Content webhook: keeps order snapshots in sync with the catalog.
//!
//! When a product document changes, every order line item referencing it gets
//! its display fields rewritten from the fresh document. The charged price is
//! never touched; what the customer paid is historical fact.

use axum::{Json, extract::State};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

use marigold_core::ProductId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::services::phonepe::constant_time_eq;
use crate::state::AppState;

/// Catalog change notification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentWebhookRequest {
    #[serde(rename = "type")]
    pub document_type: String,
    pub operation: String,
    #[serde(default)]
    pub document_id: Option<ProductId>,
    /// Shared secret, when configured.
    #[serde(default)]
    pub secret: Option<String>,
}

/// Handle a catalog change notification.
///
/// POST /api/webhooks/content
///
/// Only `product`/`update` events with a document id do work; everything else
/// is acknowledged as processed.
///
/// # Errors
///
/// Returns 401 on a secret mismatch when a secret is configured, 502 when the
/// catalog re-fetch fails.
pub async fn content(
    State(state): State<AppState>,
    Json(body): Json<ContentWebhookRequest>,
) -> Result<Json<Value>> {
    if let Some(expected) = &state.config().webhook_secret {
        if !secret_matches(expected, body.secret.as_deref()) {
            return Err(AppError::Unauthorized("Unauthorized".to_string()));
        }
    }

    if body.document_type != "product" || body.operation != "update" {
        return Ok(Json(json!({ "success": true, "message": "Webhook processed" })));
    }

    let Some(product_id) = body.document_id else {
        return Ok(Json(json!({ "success": true, "message": "Webhook processed" })));
    };

    // The webhook is the notification, not the data: re-fetch the document so
    // snapshots are written from the catalog's current truth.
    let product = state
        .catalog()
        .product_uncached(&product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {product_id}")))?;

    let orders = OrderRepository::new(state.pool());
    let updated = orders.refresh_product_snapshots(&product).await?;

    tracing::info!(
        product_id = %product_id,
        updated,
        "Order snapshots refreshed"
    );

    Ok(Json(json!({
        "success": true,
        "message": format!("Order snapshots updated for product {product_id}"),
    })))
}

/// Constant-time comparison of the configured secret against the one in the
/// request. The secret is a credential like any gateway signature.
fn secret_matches(expected: &SecretString, provided: Option<&str>) -> bool {
    let provided = provided.unwrap_or_default();
    constant_time_eq(expected.expose_secret().as_bytes(), provided.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_check_accepts_exact_match() {
        let expected = SecretString::from("hook-secret");
        assert!(secret_matches(&expected, Some("hook-secret")));
    }

    #[test]
    fn secret_check_rejects_mismatch_and_absence() {
        let expected = SecretString::from("hook-secret");
        assert!(!secret_matches(&expected, Some("hook-secre")));
        assert!(!secret_matches(&expected, Some("hook-secrex")));
        assert!(!secret_matches(&expected, Some("")));
        assert!(!secret_matches(&expected, None));
    }
}
