//! Wishlist routes.
//!
//! The toggle endpoint is read-modify-replace over the whole document; two
//! concurrent toggles can lose one update. Accepted, see DESIGN.md.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use marigold_core::ProductId;

use crate::db::WishlistRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::WishlistItem;
use crate::state::AppState;

/// Wishlist document as returned to the client.
#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub items: Vec<WishlistItem>,
    #[serde(rename = "itemCount")]
    pub item_count: usize,
}

/// Request to replace the wishlist.
#[derive(Debug, Deserialize)]
pub struct ReplaceWishlistRequest {
    pub items: Vec<WishlistItem>,
}

/// Request to toggle one product.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub product_id: ProductId,
    pub product_name: String,
}

/// Response to a toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub is_in_wishlist: bool,
    pub item_count: usize,
}

/// Fetch the caller's wishlist.
///
/// GET /api/wishlist
///
/// # Errors
///
/// Returns 500 if the database read fails.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<WishlistResponse>> {
    let wishlists = WishlistRepository::new(state.pool());
    let items = wishlists
        .get(user.id)
        .await?
        .map(|doc| doc.items)
        .unwrap_or_default();

    Ok(Json(WishlistResponse {
        item_count: items.len(),
        items,
    }))
}

/// Replace the caller's wishlist wholesale.
///
/// POST /api/wishlist
///
/// # Errors
///
/// Returns 500 if the database write fails.
pub async fn replace(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<ReplaceWishlistRequest>,
) -> Result<Json<WishlistResponse>> {
    let wishlists = WishlistRepository::new(state.pool());
    wishlists.replace(user.id, &body.items).await?;

    Ok(Json(WishlistResponse {
        item_count: body.items.len(),
        items: body.items,
    }))
}

/// Toggle a single product in the wishlist.
///
/// PUT /api/wishlist
///
/// # Errors
///
/// Returns 500 if the database read or write fails.
pub async fn toggle(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>> {
    let wishlists = WishlistRepository::new(state.pool());

    let mut items = wishlists
        .get(user.id)
        .await?
        .map(|doc| doc.items)
        .unwrap_or_default();

    let before = items.len();
    items.retain(|item| item.product_id != body.product_id);
    let is_in_wishlist = items.len() == before;

    if is_in_wishlist {
        items.push(WishlistItem {
            product_id: body.product_id,
            product_name: body.product_name,
            added_at: Utc::now(),
        });
    }

    wishlists.replace(user.id, &items).await?;

    Ok(Json(ToggleResponse {
        is_in_wishlist,
        item_count: items.len(),
    }))
}
