//! Cart routes.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::db::CartRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::CartItem;
use crate::state::AppState;

/// Cart document as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    #[serde(rename = "itemCount")]
    pub item_count: usize,
}

/// Request to replace the cart.
#[derive(Debug, Deserialize)]
pub struct ReplaceCartRequest {
    pub items: Vec<CartItem>,
}

/// Fetch the caller's cart. A user without a cart row gets empty items.
///
/// GET /api/cart
///
/// # Errors
///
/// Returns 500 if the database read fails.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CartResponse>> {
    let carts = CartRepository::new(state.pool());
    let items = carts
        .get(user.id)
        .await?
        .map(|doc| doc.items)
        .unwrap_or_default();

    Ok(Json(CartResponse {
        item_count: items.len(),
        items,
    }))
}

/// Replace the caller's cart wholesale.
///
/// POST /api/cart
///
/// # Errors
///
/// Returns 500 if the database write fails.
pub async fn replace(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<ReplaceCartRequest>,
) -> Result<Json<CartResponse>> {
    let carts = CartRepository::new(state.pool());
    carts.replace(user.id, &body.items).await?;

    Ok(Json(CartResponse {
        item_count: body.items.len(),
        items: body.items,
    }))
}
