//! Catalog boundary.
//!
//! Catalog documents have gone through several schemas; older ones spell the
//! fields `nama`/`harga`/`gambar`/`stok`. [`CatalogDocument`] accepts either
//! spelling and everything past this module only sees [`ProductSnapshot`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Product values captured at cart-add time. Never re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub image: Option<String>,
}

impl ProductSnapshot {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogDocument {
    #[serde(alias = "product_id")]
    pub id: String,
    #[serde(alias = "nama")]
    pub name: String,
    #[serde(alias = "harga")]
    pub price: Decimal,
    #[serde(default, alias = "gambar")]
    pub image: Option<String>,
    #[serde(default, alias = "stok")]
    pub stock: Option<u32>,
    #[serde(default, alias = "kategori")]
    pub category: Option<String>,
}

impl CatalogDocument {
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        let doc: CatalogDocument =
            serde_json::from_str(raw).map_err(|e| StoreError::InvalidCatalogDocument(e.to_string()))?;
        if doc.id.trim().is_empty() {
            return Err(StoreError::InvalidCatalogDocument("missing product id".into()));
        }
        if doc.price.is_sign_negative() {
            return Err(StoreError::InvalidCatalogDocument(format!(
                "negative price for {}",
                doc.id
            )));
        }
        Ok(doc)
    }

    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            product_id: self.id.clone(),
            name: self.name.clone(),
            unit_price: self.price,
            image: self.image.clone(),
        }
    }
}
