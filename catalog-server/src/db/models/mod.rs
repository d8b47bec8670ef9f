//! Database Models
//!
//! Row types for the four aggregate tables plus the Create/Update/Full
//! DTOs the repository works with. Children hold a record-link
//! back-reference to their parent; hydrated views own their children.

// Catalog aggregate
pub mod product;
pub mod product_item;
pub mod size;
pub mod stock;

// Re-exports
pub use product::{Product, ProductCreate, ProductFull, ProductId, ProductUpdate};
pub use product_item::{
    ItemImageUpdate, ProductItem, ProductItemCreate, ProductItemFull, ProductItemId,
    ProductItemPatch,
};
pub use size::{Size, SizeCreate, SizeFull, SizeId, SizePatch};
pub use stock::{Stock, StockFull, StockId, StockLevel};
