//! Product Repository
//!
//! Owns the Product → ProductItem → Size → Stock aggregate end to end.
//! All invariant checks live here, at the create/update entry points, and
//! every multi-row write runs inside a single transaction: either the whole
//! aggregate commits or none of it does.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{BaseRepository, RepoError, RepoResult, record_key, thing};
use crate::db::models::{
    Product, ProductCreate, ProductFull, ProductItem, ProductItemFull, ProductUpdate, Size,
    SizeFull, Stock, StockFull, StockLevel,
};
use crate::utils::snowflake_id;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_required_text,
    validate_text,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PRODUCT_TABLE: &str = "product";
const ITEM_TABLE: &str = "product_item";
const SIZE_TABLE: &str = "size";

// =============================================================================
// Product Repository
// =============================================================================

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a full product aggregate from a nested submission.
    ///
    /// Validates the whole submission first, then materializes one product
    /// row, N item rows and one size + stock row per submitted size in a
    /// single transaction. Identities are assigned here, never by the
    /// storage engine.
    pub async fn create(&self, data: ProductCreate) -> RepoResult<ProductFull> {
        validate_submission(&data)?;

        let product_id = snowflake_id();
        let product_rec = thing(PRODUCT_TABLE, product_id);
        let now = Utc::now();
        let product = Product {
            id: None,
            product_name: data.product_name,
            description: data.description,
            category_id: data.category_id,
            gender_id: data.gender_id,
            created_at: Some(now),
            updated_at: Some(now),
        };

        let mut query = self
            .base
            .db()
            .query("BEGIN TRANSACTION")
            .query("CREATE type::thing('product', $p_id) CONTENT $p")
            .bind(("p_id", product_id))
            .bind(("p", product));

        for (ii, item) in data.product_items.into_iter().enumerate() {
            let item_id = snowflake_id();
            let row = ProductItem {
                id: None,
                product: product_rec.clone(),
                color: item.color,
                image_url: item.image_url.unwrap_or_default(),
            };
            query = query
                .query(format!(
                    "CREATE type::thing('product_item', $i{ii}_id) CONTENT $i{ii}"
                ))
                .bind((format!("i{ii}_id"), item_id))
                .bind((format!("i{ii}"), row));

            for (si, size) in item.sizes.into_iter().enumerate() {
                let size_id = snowflake_id();
                let size_row = Size {
                    id: None,
                    item: thing(ITEM_TABLE, item_id),
                    size: size.size,
                    price: size.price,
                };
                let stock_row = Stock {
                    id: None,
                    size: thing(SIZE_TABLE, size_id),
                    stock: size.stock,
                };
                query = query
                    .query(format!(
                        "CREATE type::thing('size', $s{ii}_{si}_id) CONTENT $s{ii}_{si}"
                    ))
                    .bind((format!("s{ii}_{si}_id"), size_id))
                    .bind((format!("s{ii}_{si}"), size_row))
                    .query(format!(
                        "CREATE type::thing('stock', $k{ii}_{si}_id) CONTENT $k{ii}_{si}"
                    ))
                    .bind((format!("k{ii}_{si}_id"), snowflake_id()))
                    .bind((format!("k{ii}_{si}"), stock_row));
            }
        }

        query.query("COMMIT TRANSACTION").await?.check()?;

        let created = self
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| RepoError::Database(format!("Product {product_id} missing after create")))?;
        tracing::info!(product_id, "Product aggregate created");
        Ok(created)
    }

    /// Find a product by id, fully hydrated (items → sizes → stock with
    /// derived stock levels).
    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<ProductFull>> {
        let product: Option<Product> = self.base.db().select(thing(PRODUCT_TABLE, id)).await?;
        match product {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Find all products, hydrated, ordered by identity ascending.
    pub async fn find_all(&self) -> RepoResult<Vec<ProductFull>> {
        let rows: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY id")
            .await?
            .take(0)?;
        self.hydrate_all(rows).await
    }

    /// Find the first `limit` products by identity ascending. The order is
    /// stable across calls, so pagination by repetition is deterministic.
    pub async fn find_limited(&self, limit: i64) -> RepoResult<Vec<ProductFull>> {
        if limit < 0 {
            return Err(RepoError::Validation(
                "limit must not be negative".to_string(),
            ));
        }
        let rows: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY id LIMIT $limit")
            .bind(("limit", limit))
            .await?
            .take(0)?;
        self.hydrate_all(rows).await
    }

    /// Case-insensitive substring search over product names. An empty
    /// result is a normal outcome, not an error.
    pub async fn search(&self, name: &str) -> RepoResult<Vec<ProductFull>> {
        let rows: Vec<Product> = self
            .base
            .db()
            .query(
                "SELECT * FROM product \
                 WHERE string::lowercase(product_name) CONTAINS string::lowercase($name) \
                 ORDER BY id",
            )
            .bind(("name", name.to_string()))
            .await?
            .take(0)?;
        self.hydrate_all(rows).await
    }

    /// Apply a partial update to an existing aggregate: fetch, patch in
    /// memory, re-validate every invariant on the resulting state, then
    /// persist all touched rows in one transaction.
    pub async fn update(&self, id: i64, data: ProductUpdate) -> RepoResult<ProductFull> {
        let mut patched = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?;

        if data.is_empty() {
            return Ok(patched);
        }

        apply_patch(&mut patched, &data)?;
        validate_aggregate(&patched)?;

        let product_merge = ProductMerge {
            product_name: data.product_name.clone(),
            description: data.description.clone(),
            category_id: data.category_id,
            gender_id: data.gender_id,
            updated_at: Utc::now(),
        };

        let mut query = self
            .base
            .db()
            .query("BEGIN TRANSACTION")
            .query("UPDATE type::thing('product', $p_id) MERGE $p")
            .bind(("p_id", id))
            .bind(("p", product_merge));

        for (ii, item_patch) in data.product_items.iter().flatten().enumerate() {
            if item_patch.color.is_some() || item_patch.image_url.is_some() {
                let merge = ItemMerge {
                    color: item_patch.color.clone(),
                    image_url: item_patch.image_url.clone(),
                };
                query = query
                    .query(format!(
                        "UPDATE type::thing('product_item', $i{ii}_id) MERGE $i{ii}"
                    ))
                    .bind((format!("i{ii}_id"), item_patch.item_id))
                    .bind((format!("i{ii}"), merge));
            }

            for (si, size_patch) in item_patch.sizes.iter().flatten().enumerate() {
                if size_patch.size.is_some() || size_patch.price.is_some() {
                    let merge = SizeMerge {
                        size: size_patch.size.clone(),
                        price: size_patch.price,
                    };
                    query = query
                        .query(format!(
                            "UPDATE type::thing('size', $s{ii}_{si}_id) MERGE $s{ii}_{si}"
                        ))
                        .bind((format!("s{ii}_{si}_id"), size_patch.size_id))
                        .bind((format!("s{ii}_{si}"), merge));
                }
                if let Some(stock) = size_patch.stock {
                    // apply_patch already proved the size exists in this aggregate
                    let stock_id = stock_id_for_size(&patched, size_patch.size_id)?;
                    query = query
                        .query(format!(
                            "UPDATE type::thing('stock', $k{ii}_{si}_id) MERGE $k{ii}_{si}"
                        ))
                        .bind((format!("k{ii}_{si}_id"), stock_id))
                        .bind((format!("k{ii}_{si}"), StockMerge { stock }));
                }
            }
        }

        query.query("COMMIT TRANSACTION").await?.check()?;

        tracing::info!(product_id = id, "Product aggregate updated");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::Database(format!("Product {id} missing after update")))
    }

    /// Cascade delete an aggregate: stock → sizes → items → product, in one
    /// transaction. Returns the deleted identity as confirmation.
    pub async fn delete(&self, id: i64) -> RepoResult<i64> {
        let existing: Option<Product> = self.base.db().select(thing(PRODUCT_TABLE, id)).await?;
        if existing.is_none() {
            return Err(RepoError::NotFound(format!("Product {id} not found")));
        }

        self.base
            .db()
            .query("BEGIN TRANSACTION")
            .query("DELETE stock WHERE size.item.product = $p")
            .query("DELETE size WHERE item.product = $p")
            .query("DELETE product_item WHERE product = $p")
            .query("DELETE $p")
            .query("COMMIT TRANSACTION")
            .bind(("p", thing(PRODUCT_TABLE, id)))
            .await?
            .check()?;

        tracing::info!(product_id = id, "Product aggregate deleted");
        Ok(id)
    }

    /// Attach or replace the image reference on an existing item.
    pub async fn set_item_image(&self, item_id: i64, image_url: &str) -> RepoResult<ProductItemFull> {
        validate_required_text(image_url, "image_url", MAX_URL_LEN)?;

        let updated: Vec<ProductItem> = self
            .base
            .db()
            .query("UPDATE type::thing('product_item', $id) SET image_url = $url RETURN AFTER")
            .bind(("id", item_id))
            .bind(("url", image_url.to_string()))
            .await?
            .take(0)?;

        let item = updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product item {item_id} not found")))?;
        self.hydrate_item(item).await
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    async fn hydrate_all(&self, rows: Vec<Product>) -> RepoResult<Vec<ProductFull>> {
        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(self.hydrate(row).await?);
        }
        Ok(products)
    }

    async fn hydrate(&self, row: Product) -> RepoResult<ProductFull> {
        let product_rec = row
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("product row without id".to_string()))?;
        let product_id = record_key(&product_rec)?;

        let mut res = self
            .base
            .db()
            .query("SELECT * FROM product_item WHERE product = $p ORDER BY id")
            .query("SELECT * FROM size WHERE item.product = $p ORDER BY id")
            .query("SELECT * FROM stock WHERE size.item.product = $p")
            .bind(("p", product_rec))
            .await?;
        let items: Vec<ProductItem> = res.take(0)?;
        let sizes: Vec<Size> = res.take(1)?;
        let stocks: Vec<Stock> = res.take(2)?;

        let mut sizes_by_item = assemble_sizes(sizes, stocks)?;
        let mut product_items = Vec::with_capacity(items.len());
        for item in items {
            let item_rec = item
                .id
                .ok_or_else(|| RepoError::Database("product_item row without id".to_string()))?;
            product_items.push(ProductItemFull {
                item_id: record_key(&item_rec)?,
                product_id,
                color: item.color,
                image_url: item.image_url,
                sizes: sizes_by_item.remove(&item_rec.to_string()).unwrap_or_default(),
            });
        }

        Ok(ProductFull {
            product_id,
            product_name: row.product_name,
            description: row.description,
            category_id: row.category_id,
            gender_id: row.gender_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            product_items,
        })
    }

    async fn hydrate_item(&self, item: ProductItem) -> RepoResult<ProductItemFull> {
        let item_rec = item
            .id
            .ok_or_else(|| RepoError::Database("product_item row without id".to_string()))?;
        let item_id = record_key(&item_rec)?;

        let mut res = self
            .base
            .db()
            .query("SELECT * FROM size WHERE item = $i ORDER BY id")
            .query("SELECT * FROM stock WHERE size.item = $i")
            .bind(("i", item_rec.clone()))
            .await?;
        let sizes: Vec<Size> = res.take(0)?;
        let stocks: Vec<Stock> = res.take(1)?;

        let mut sizes_by_item = assemble_sizes(sizes, stocks)?;
        Ok(ProductItemFull {
            item_id,
            product_id: record_key(&item.product)?,
            color: item.color,
            image_url: item.image_url,
            sizes: sizes_by_item.remove(&item_rec.to_string()).unwrap_or_default(),
        })
    }
}

/// Join size rows with their 1:1 stock rows, grouped by owning item id.
/// Preserves the incoming (identity) order of sizes.
fn assemble_sizes(
    sizes: Vec<Size>,
    stocks: Vec<Stock>,
) -> RepoResult<HashMap<String, Vec<SizeFull>>> {
    let mut stock_by_size: HashMap<String, Stock> = stocks
        .into_iter()
        .map(|s| (s.size.to_string(), s))
        .collect();

    let mut sizes_by_item: HashMap<String, Vec<SizeFull>> = HashMap::new();
    for size in sizes {
        let size_rec = size
            .id
            .ok_or_else(|| RepoError::Database("size row without id".to_string()))?;
        let size_id = record_key(&size_rec)?;
        let stock_row = stock_by_size
            .remove(&size_rec.to_string())
            .ok_or_else(|| RepoError::Database(format!("size {size_id} has no stock row")))?;
        let stock_rec = stock_row
            .id
            .ok_or_else(|| RepoError::Database("stock row without id".to_string()))?;

        sizes_by_item
            .entry(size.item.to_string())
            .or_default()
            .push(SizeFull {
                size_id,
                item_id: record_key(&size.item)?,
                size: size.size,
                price: size.price,
                stock: StockFull::new(record_key(&stock_rec)?, size_id, stock_row.stock),
            });
    }
    Ok(sizes_by_item)
}

// =============================================================================
// Partial-update merge payloads
// =============================================================================

#[derive(Serialize)]
struct ProductMerge {
    #[serde(skip_serializing_if = "Option::is_none")]
    product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender_id: Option<i64>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ItemMerge {
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

#[derive(Serialize)]
struct SizeMerge {
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<i64>,
}

#[derive(Serialize)]
struct StockMerge {
    stock: i64,
}

// =============================================================================
// Validation and patching
// =============================================================================

/// Validate a full submission before any row is written. Errors name the
/// offending field path, e.g. `product_items[1].sizes[0].price`.
fn validate_submission(data: &ProductCreate) -> RepoResult<()> {
    validate_required_text(&data.product_name, "product_name", MAX_NAME_LEN)?;
    validate_text(&data.description, "description", MAX_NOTE_LEN)?;

    if data.product_items.is_empty() {
        return Err(RepoError::Validation(
            "product_items must contain at least one item".to_string(),
        ));
    }

    let mut colors = HashSet::new();
    for (ii, item) in data.product_items.iter().enumerate() {
        let path = format!("product_items[{ii}]");
        validate_item_fields(&item.color, item.image_url.as_ref(), &path, &mut colors)?;

        if item.sizes.is_empty() {
            return Err(RepoError::Validation(format!(
                "{path}.sizes must contain at least one size"
            )));
        }

        let mut labels = HashSet::new();
        for (si, size) in item.sizes.iter().enumerate() {
            let size_path = format!("{path}.sizes[{si}]");
            validate_size_fields(&size.size, size.price, size.stock, &size_path, &mut labels)?;
        }
    }
    Ok(())
}

/// Validate a hydrated aggregate after a patch has been applied. The same
/// invariants as at create time hold for the resulting state.
fn validate_aggregate(product: &ProductFull) -> RepoResult<()> {
    validate_required_text(&product.product_name, "product_name", MAX_NAME_LEN)?;
    validate_text(&product.description, "description", MAX_NOTE_LEN)?;

    if product.product_items.is_empty() {
        return Err(RepoError::Validation(
            "product_items must contain at least one item".to_string(),
        ));
    }

    let mut colors = HashSet::new();
    for (ii, item) in product.product_items.iter().enumerate() {
        let path = format!("product_items[{ii}]");
        let image_url = (!item.image_url.is_empty()).then(|| item.image_url.clone());
        validate_item_fields(&item.color, image_url.as_ref(), &path, &mut colors)?;

        if item.sizes.is_empty() {
            return Err(RepoError::Validation(format!(
                "{path}.sizes must contain at least one size"
            )));
        }

        let mut labels = HashSet::new();
        for (si, size) in item.sizes.iter().enumerate() {
            let size_path = format!("{path}.sizes[{si}]");
            validate_size_fields(
                &size.size,
                size.price,
                size.stock.stock,
                &size_path,
                &mut labels,
            )?;
        }
    }
    Ok(())
}

fn validate_item_fields(
    color: &str,
    image_url: Option<&String>,
    path: &str,
    seen_colors: &mut HashSet<String>,
) -> RepoResult<()> {
    validate_required_text(color, &format!("{path}.color"), MAX_NAME_LEN)?;
    validate_optional_text(
        &image_url.cloned(),
        &format!("{path}.image_url"),
        MAX_URL_LEN,
    )?;
    if !seen_colors.insert(color.trim().to_lowercase()) {
        return Err(RepoError::Validation(format!(
            "{path}.color duplicates another item's color '{color}'"
        )));
    }
    Ok(())
}

fn validate_size_fields(
    label: &str,
    price: i64,
    stock: i64,
    path: &str,
    seen_labels: &mut HashSet<String>,
) -> RepoResult<()> {
    validate_required_text(label, &format!("{path}.size"), MAX_NAME_LEN)?;
    if price <= 0 {
        return Err(RepoError::Validation(format!(
            "{path}.price must be greater than zero"
        )));
    }
    if stock < 0 {
        return Err(RepoError::Validation(format!(
            "{path}.stock must not be negative"
        )));
    }
    if !seen_labels.insert(label.trim().to_lowercase()) {
        return Err(RepoError::Validation(format!(
            "{path}.size duplicates another size label '{label}'"
        )));
    }
    Ok(())
}

/// Apply a patch to a hydrated aggregate in memory. Only fields present in
/// the patch change; unknown item/size identities are a `NotFound`.
fn apply_patch(current: &mut ProductFull, patch: &ProductUpdate) -> RepoResult<()> {
    if let Some(v) = &patch.product_name {
        current.product_name = v.clone();
    }
    if let Some(v) = &patch.description {
        current.description = v.clone();
    }
    if let Some(v) = patch.category_id {
        current.category_id = v;
    }
    if let Some(v) = patch.gender_id {
        current.gender_id = v;
    }

    for item_patch in patch.product_items.iter().flatten() {
        let item = current
            .product_items
            .iter_mut()
            .find(|i| i.item_id == item_patch.item_id)
            .ok_or_else(|| {
                RepoError::NotFound(format!("Product item {} not found", item_patch.item_id))
            })?;
        if let Some(v) = &item_patch.color {
            item.color = v.clone();
        }
        if let Some(v) = &item_patch.image_url {
            item.image_url = v.clone();
        }

        for size_patch in item_patch.sizes.iter().flatten() {
            let size = item
                .sizes
                .iter_mut()
                .find(|s| s.size_id == size_patch.size_id)
                .ok_or_else(|| {
                    RepoError::NotFound(format!("Size {} not found", size_patch.size_id))
                })?;
            if let Some(v) = &size_patch.size {
                size.size = v.clone();
            }
            if let Some(v) = size_patch.price {
                size.price = v;
            }
            if let Some(v) = size_patch.stock {
                size.stock.stock = v;
                size.stock.stock_level = StockLevel::classify(v);
            }
        }
    }
    Ok(())
}

fn stock_id_for_size(product: &ProductFull, size_id: i64) -> RepoResult<i64> {
    product
        .product_items
        .iter()
        .flat_map(|item| item.sizes.iter())
        .find(|size| size.size_id == size_id)
        .map(|size| size.stock.stock_id)
        .ok_or_else(|| RepoError::NotFound(format!("Size {size_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ProductItemCreate, SizeCreate};

    fn submission() -> ProductCreate {
        ProductCreate {
            product_name: "Shirt".to_string(),
            description: "New Shirt".to_string(),
            category_id: 1,
            gender_id: 1,
            product_items: vec![ProductItemCreate {
                color: "green".to_string(),
                image_url: Some("http://www.shirt.com".to_string()),
                sizes: vec![SizeCreate {
                    size: "small".to_string(),
                    price: 200,
                    stock: 50,
                }],
            }],
        }
    }

    #[test]
    fn accepts_a_well_formed_submission() {
        assert!(validate_submission(&submission()).is_ok());
    }

    #[test]
    fn rejects_nonpositive_price_with_field_path() {
        let mut data = submission();
        data.product_items[0].sizes[0].price = 0;
        let err = validate_submission(&data).unwrap_err();
        assert!(
            matches!(err, RepoError::Validation(msg) if msg.contains("product_items[0].sizes[0].price"))
        );
    }

    #[test]
    fn rejects_negative_stock_with_field_path() {
        let mut data = submission();
        data.product_items[0].sizes[0].stock = -1;
        let err = validate_submission(&data).unwrap_err();
        assert!(
            matches!(err, RepoError::Validation(msg) if msg.contains("product_items[0].sizes[0].stock"))
        );
    }

    #[test]
    fn rejects_empty_item_list() {
        let mut data = submission();
        data.product_items.clear();
        let err = validate_submission(&data).unwrap_err();
        assert!(matches!(err, RepoError::Validation(msg) if msg.contains("product_items")));
    }

    #[test]
    fn rejects_item_without_sizes() {
        let mut data = submission();
        data.product_items[0].sizes.clear();
        let err = validate_submission(&data).unwrap_err();
        assert!(matches!(err, RepoError::Validation(msg) if msg.contains("sizes")));
    }

    #[test]
    fn rejects_duplicate_color_case_insensitively() {
        let mut data = submission();
        let mut dup = data.product_items[0].clone();
        dup.color = "Green".to_string();
        data.product_items.push(dup);
        let err = validate_submission(&data).unwrap_err();
        assert!(matches!(err, RepoError::Validation(msg) if msg.contains("color")));
    }

    #[test]
    fn rejects_duplicate_size_label_within_item() {
        let mut data = submission();
        let dup = data.product_items[0].sizes[0].clone();
        data.product_items[0].sizes.push(dup);
        let err = validate_submission(&data).unwrap_err();
        assert!(matches!(err, RepoError::Validation(msg) if msg.contains("size")));
    }
}
