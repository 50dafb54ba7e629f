//! Product documents as served by the hosted catalog API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marigold_core::ProductId;

/// A product document from the hosted catalog.
///
/// Checkout requests embed the full document per line item, and the webhook
/// handler re-fetches it when a product changes. The catalog is the source of
/// truth; the storefront only ever copies fields out of it into order
/// snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDoc {
    /// Catalog document id.
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Image descriptors, passed through opaquely.
    #[serde(default)]
    pub images: Vec<serde_json::Value>,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub product_link: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Category ids this product belongs to.
    #[serde(default)]
    pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_minimal_catalog_document() {
        let doc: ProductDoc = serde_json::from_value(serde_json::json!({
            "_id": "prod_41ac",
            "name": "Block-print cushion cover",
            "price": "549.00",
        }))
        .expect("minimal product");

        assert_eq!(doc.id.as_str(), "prod_41ac");
        assert!(doc.images.is_empty());
        assert!(doc.categories.is_empty());
    }
}
