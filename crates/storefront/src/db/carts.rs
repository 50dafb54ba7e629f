//! Cart and wishlist repositories.
//!
//! Both tables hold one row per user with the items as a JSON array, written
//! with `INSERT ... ON CONFLICT DO UPDATE` so a user can never accumulate
//! more than one document. Reads and writes are whole-document; there is no
//! per-item SQL.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marigold_core::UserId;

use super::RepositoryError;
use crate::models::{CartDocument, CartItem, WishlistDocument, WishlistItem};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    user_id: i32,
    items: serde_json::Value,
    updated_at: DateTime<Utc>,
}

fn decode_items<T: serde::de::DeserializeOwned>(
    items: serde_json::Value,
) -> Result<Vec<T>, RepositoryError> {
    serde_json::from_value(items)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid items document: {e}")))
}

/// Repository for per-user cart documents.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart, if they have one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored JSON is invalid.
    pub async fn get(&self, user_id: UserId) -> Result<Option<CartDocument>, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r"
            SELECT user_id, items, updated_at
            FROM storefront.cart
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| {
            Ok(CartDocument {
                user_id: UserId::new(r.user_id),
                items: decode_items::<CartItem>(r.items)?,
                updated_at: r.updated_at,
            })
        })
        .transpose()
    }

    /// Replace a user's cart wholesale. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn replace(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<(), RepositoryError> {
        let items = serde_json::to_value(items)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable cart: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO storefront.cart (user_id, items, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE SET
                items = EXCLUDED.items,
                updated_at = now()
            ",
        )
        .bind(user_id)
        .bind(items)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

/// Repository for per-user wishlist documents.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's wishlist, if they have one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored JSON is invalid.
    pub async fn get(&self, user_id: UserId) -> Result<Option<WishlistDocument>, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r"
            SELECT user_id, items, updated_at
            FROM storefront.wishlist
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| {
            Ok(WishlistDocument {
                user_id: UserId::new(r.user_id),
                items: decode_items::<WishlistItem>(r.items)?,
                updated_at: r.updated_at,
            })
        })
        .transpose()
    }

    /// Replace a user's wishlist wholesale. Last write wins.
    ///
    /// The toggle endpoint reads the current document, edits it in memory,
    /// and writes it back through here. Two concurrent toggles can lose one
    /// update; see DESIGN.md for why that is accepted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn replace(
        &self,
        user_id: UserId,
        items: &[WishlistItem],
    ) -> Result<(), RepositoryError> {
        let items = serde_json::to_value(items).map_err(|e| {
            RepositoryError::DataCorruption(format!("unserializable wishlist: {e}"))
        })?;

        sqlx::query(
            r"
            INSERT INTO storefront.wishlist (user_id, items, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE SET
                items = EXCLUDED.items,
                updated_at = now()
            ",
        )
        .bind(user_id)
        .bind(items)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
