//! Cart and wishlist models.
//!
//! Both are singleton-per-user documents: one row per user, items held as a
//! JSON array, replaced wholesale on write. No history is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marigold_core::{ProductId, UserId};

/// One line in a user's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// A user's cart document.
#[derive(Debug, Clone)]
pub struct CartDocument {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

/// One entry in a user's wishlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub added_at: DateTime<Utc>,
}

/// A user's wishlist document.
#[derive(Debug, Clone)]
pub struct WishlistDocument {
    pub user_id: UserId,
    pub items: Vec<WishlistItem>,
    pub updated_at: DateTime<Utc>,
}
