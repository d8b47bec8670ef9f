//! Product Item Model
//!
//! A product item is one color variant of a product.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::{SizeCreate, SizeFull, SizePatch};

pub type ProductItemId = RecordId;

/// Product item row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductItemId>,
    /// Record link to the owning product
    pub product: RecordId,
    pub color: String,
    #[serde(default)]
    pub image_url: String,
}

/// One item of a product submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductItemCreate {
    pub color: String,
    pub image_url: Option<String>,
    pub sizes: Vec<SizeCreate>,
}

/// Partial update of an existing item, addressed by identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductItemPatch {
    pub item_id: i64,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub sizes: Option<Vec<SizePatch>>,
}

/// Payload for attaching/replacing an item's image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemImageUpdate {
    pub image_url: String,
}

/// Hydrated item with its sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductItemFull {
    pub item_id: i64,
    pub product_id: i64,
    pub color: String,
    pub image_url: String,
    pub sizes: Vec<SizeFull>,
}
