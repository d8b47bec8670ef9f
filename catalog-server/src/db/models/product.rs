//! Product Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::{ProductItemCreate, ProductItemFull, ProductItemPatch};

pub type ProductId = RecordId;

/// Product row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub product_name: String,
    pub description: String,
    /// Opaque reference to the category table (out of scope here)
    pub category_id: i64,
    /// Opaque reference to the gender table (out of scope here)
    pub gender_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full product submission: product fields plus the item/size/stock tree,
/// materialized as one atomic unit by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub product_name: String,
    pub description: String,
    pub category_id: i64,
    pub gender_id: i64,
    pub product_items: Vec<ProductItemCreate>,
}

/// Partial update. Absent fields are left untouched, never nulled.
/// Item and size patches address existing children by identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub gender_id: Option<i64>,
    pub product_items: Option<Vec<ProductItemPatch>>,
}

impl ProductUpdate {
    /// True when the patch carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.gender_id.is_none()
            && self
                .product_items
                .as_ref()
                .map(|items| items.is_empty())
                .unwrap_or(true)
    }
}

/// Fully hydrated product: items, sizes and stock with the derived
/// stock level decorated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFull {
    pub product_id: i64,
    pub product_name: String,
    pub description: String,
    pub category_id: i64,
    pub gender_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub product_items: Vec<ProductItemFull>,
}
