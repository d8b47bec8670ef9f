//! Size Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::StockFull;

pub type SizeId = RecordId;

/// Size row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Size {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SizeId>,
    /// Record link to the owning product item
    pub item: RecordId,
    /// Size label (e.g. "S", "M", "L")
    pub size: String,
    /// Price in the smallest currency unit
    pub price: i64,
}

/// One size of an item submission. The stock count seeds the size's
/// stock row; it is not stored on the size itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeCreate {
    pub size: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
}

/// Partial update of an existing size, addressed by identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizePatch {
    pub size_id: i64,
    pub size: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
}

/// Hydrated size with its stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeFull {
    pub size_id: i64,
    pub item_id: i64,
    pub size: String,
    pub price: i64,
    pub stock: StockFull,
}
