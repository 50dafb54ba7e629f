//! Coupon validation route.

use axum::{Json, extract::State};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marigold_core::{DiscountType, ProductId};

use crate::db::CouponRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::services::coupons::{self, PricedItem};
use crate::state::AppState;

/// One cart line in a validation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateItem {
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub price: Decimal,
    pub quantity: u32,
}

/// Request to validate a coupon against the cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub code: String,
    pub cart_amount: Option<Decimal>,
    #[serde(default)]
    pub items: Vec<ValidateItem>,
}

/// A successful validation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    pub discount: Decimal,
    pub code: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: Decimal,
}

/// Validate a coupon code against the caller's cart.
///
/// POST /api/coupons/validate
///
/// # Errors
///
/// Returns 400 with the rejection reason when the coupon cannot apply.
pub async fn validate(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>> {
    let coupons = CouponRepository::new(state.pool());

    // Absent and inactive codes are indistinguishable to the client.
    let coupon = coupons
        .get_active_by_code(&body.code)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid coupon code".to_string()))?;

    // Clients send the displayed cart total alongside the line items; honor
    // the minimum-spend check against it even when the lines disagree.
    if let Some(cart_amount) = body.cart_amount {
        if cart_amount < coupon.minimum_amount {
            return Err(AppError::BadRequest(format!(
                "Minimum order amount of \u{20b9}{} not met",
                coupon.minimum_amount
            )));
        }
    }

    let items: Vec<PricedItem> = body
        .items
        .iter()
        .map(|item| PricedItem {
            price: item.price,
            quantity: item.quantity,
            categories: item.categories.clone(),
        })
        .collect();

    let quote = coupons::evaluate(&coupon, &items, Utc::now())
        .map_err(|rejection| AppError::BadRequest(rejection.to_string()))?;

    Ok(Json(ValidateResponse {
        valid: true,
        discount: quote.discount,
        code: quote.code,
        discount_type: quote.discount_type,
        value: quote.discount_value,
    }))
}
