//! Product aggregate repository tests
//!
//! Each test runs against its own embedded database in a temp directory.
//! Run: cargo test -p catalog-server --test product_aggregate

use catalog_server::db::DbService;
use catalog_server::db::models::{
    ProductCreate, ProductItemCreate, ProductItemPatch, ProductUpdate, SizeCreate, SizePatch,
    StockLevel,
};
use catalog_server::db::repository::{ProductRepository, RepoError};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

async fn open_repo() -> (tempfile::TempDir, Surreal<Db>, ProductRepository) {
    let tmp = tempfile::tempdir().unwrap();
    let service = DbService::new(tmp.path()).await.unwrap();
    let db = service.db.clone();
    (tmp, db.clone(), ProductRepository::new(db))
}

async fn count_rows(db: &Surreal<Db>, table: &str) -> i64 {
    let mut res = db
        .query(format!("SELECT count() FROM {table} GROUP ALL"))
        .await
        .unwrap();
    let count: Option<i64> = res.take((0, "count")).unwrap();
    count.unwrap_or(0)
}

/// The three-color shirt from the storefront's product form.
fn shirt_submission() -> ProductCreate {
    ProductCreate {
        product_name: "Shirt".to_string(),
        description: "New Shirt".to_string(),
        category_id: 1,
        gender_id: 2,
        product_items: vec![
            ProductItemCreate {
                color: "green".to_string(),
                image_url: Some("http://www.shirt.com".to_string()),
                sizes: vec![
                    SizeCreate {
                        size: "small".to_string(),
                        price: 200,
                        stock: 50,
                    },
                    SizeCreate {
                        size: "medium".to_string(),
                        price: 250,
                        stock: 10,
                    },
                    SizeCreate {
                        size: "large".to_string(),
                        price: 300,
                        stock: 0,
                    },
                ],
            },
            ProductItemCreate {
                color: "brown".to_string(),
                image_url: Some("http://www.shirt.com".to_string()),
                sizes: vec![
                    SizeCreate {
                        size: "extra small".to_string(),
                        price: 100,
                        stock: 70,
                    },
                    SizeCreate {
                        size: "medium".to_string(),
                        price: 250,
                        stock: 110,
                    },
                ],
            },
        ],
    }
}

/// Single item, single size.
fn hoodie_submission() -> ProductCreate {
    ProductCreate {
        product_name: "Hoodie".to_string(),
        description: "Plain hoodie".to_string(),
        category_id: 1,
        gender_id: 1,
        product_items: vec![ProductItemCreate {
            color: "black".to_string(),
            image_url: None,
            sizes: vec![SizeCreate {
                size: "M".to_string(),
                price: 450,
                stock: 5,
            }],
        }],
    }
}

// ========================================================================
// Create + read round trip
// ========================================================================

#[tokio::test]
async fn create_then_get_round_trips_the_whole_tree() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(shirt_submission()).await.unwrap();
    let fetched = repo.find_by_id(created.product_id).await.unwrap().unwrap();

    assert_eq!(fetched.product_name, "Shirt");
    assert_eq!(fetched.description, "New Shirt");
    assert_eq!(fetched.category_id, 1);
    assert_eq!(fetched.gender_id, 2);
    assert_eq!(fetched.product_items.len(), 2);

    let green = &fetched.product_items[0];
    assert_eq!(green.color, "green");
    assert_eq!(green.image_url, "http://www.shirt.com");
    assert_eq!(green.product_id, fetched.product_id);
    assert_eq!(green.sizes.len(), 3);

    let small = &green.sizes[0];
    assert_eq!(small.size, "small");
    assert_eq!(small.price, 200);
    assert_eq!(small.item_id, green.item_id);
    assert_eq!(small.stock.stock, 50);
    assert_eq!(small.stock.size_id, small.size_id);

    // Derived levels per submitted count: 50 → Low, 70 → Medium, 110 → High
    assert_eq!(small.stock.stock_level, StockLevel::Low);
    let brown = &fetched.product_items[1];
    assert_eq!(brown.sizes[0].stock.stock_level, StockLevel::Medium);
    assert_eq!(brown.sizes[1].stock.stock_level, StockLevel::High);
}

#[tokio::test]
async fn created_identities_are_assigned_and_distinct() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(shirt_submission()).await.unwrap();
    let mut ids = vec![created.product_id];
    for item in &created.product_items {
        ids.push(item.item_id);
        for size in &item.sizes {
            ids.push(size.size_id);
            ids.push(size.stock.stock_id);
        }
    }
    let count = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), count, "all identities must be distinct");
}

// ========================================================================
// Creation atomicity and cardinality invariants
// ========================================================================

#[tokio::test]
async fn invalid_price_rejects_the_whole_submission() {
    let (_tmp, db, repo) = open_repo().await;

    let mut data = shirt_submission();
    data.product_items[1].sizes[0].price = 0;

    let err = repo.create(data).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(ref msg)
        if msg.contains("product_items[1].sizes[0].price")));

    // No partial aggregate is ever visible
    assert_eq!(count_rows(&db, "product").await, 0);
    assert_eq!(count_rows(&db, "product_item").await, 0);
    assert_eq!(count_rows(&db, "size").await, 0);
    assert_eq!(count_rows(&db, "stock").await, 0);
    assert!(repo.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn negative_stock_rejects_the_whole_submission() {
    let (_tmp, db, repo) = open_repo().await;

    let mut data = hoodie_submission();
    data.product_items[0].sizes[0].stock = -3;

    let err = repo.create(data).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(ref msg) if msg.contains("stock")));
    assert_eq!(count_rows(&db, "product").await, 0);
}

#[tokio::test]
async fn submission_without_items_is_rejected() {
    let (_tmp, db, repo) = open_repo().await;

    let mut data = hoodie_submission();
    data.product_items.clear();

    let err = repo.create(data).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(count_rows(&db, "product").await, 0);
}

#[tokio::test]
async fn item_without_sizes_is_rejected() {
    let (_tmp, db, repo) = open_repo().await;

    let mut data = shirt_submission();
    data.product_items[1].sizes.clear();

    let err = repo.create(data).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(ref msg)
        if msg.contains("product_items[1].sizes")));
    assert_eq!(count_rows(&db, "product").await, 0);
    assert_eq!(count_rows(&db, "product_item").await, 0);
}

// ========================================================================
// Partial updates
// ========================================================================

#[tokio::test]
async fn update_changes_only_the_fields_present_in_the_patch() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(shirt_submission()).await.unwrap();
    let updated = repo
        .update(
            created.product_id,
            ProductUpdate {
                product_name: Some("Linen Shirt".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.product_name, "Linen Shirt");
    assert_eq!(updated.description, "New Shirt");
    assert_eq!(updated.category_id, 1);
    assert_eq!(updated.product_items.len(), 2);
}

#[tokio::test]
async fn update_with_empty_patch_is_a_noop() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(hoodie_submission()).await.unwrap();
    let updated = repo
        .update(created.product_id, ProductUpdate::default())
        .await
        .unwrap();

    assert_eq!(updated.product_name, created.product_name);
    assert_eq!(updated.product_items.len(), 1);
}

#[tokio::test]
async fn nested_patch_updates_price_and_stock_by_identity() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(shirt_submission()).await.unwrap();
    let item = &created.product_items[0];
    let target = &item.sizes[1];

    let updated = repo
        .update(
            created.product_id,
            ProductUpdate {
                product_items: Some(vec![ProductItemPatch {
                    item_id: item.item_id,
                    color: None,
                    image_url: None,
                    sizes: Some(vec![SizePatch {
                        size_id: target.size_id,
                        size: None,
                        price: Some(275),
                        stock: Some(150),
                    }]),
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let item_after = &updated.product_items[0];
    let size_after = item_after
        .sizes
        .iter()
        .find(|s| s.size_id == target.size_id)
        .unwrap();
    assert_eq!(size_after.price, 275);
    assert_eq!(size_after.stock.stock, 150);
    assert_eq!(size_after.stock.stock_level, StockLevel::High);

    // Sibling size untouched
    let sibling = item_after
        .sizes
        .iter()
        .find(|s| s.size_id == item.sizes[0].size_id)
        .unwrap();
    assert_eq!(sibling.price, 200);
    assert_eq!(sibling.stock.stock, 50);
}

#[tokio::test]
async fn update_rejects_a_patch_that_violates_invariants() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(hoodie_submission()).await.unwrap();
    let item = &created.product_items[0];
    let size = &item.sizes[0];

    let err = repo
        .update(
            created.product_id,
            ProductUpdate {
                product_items: Some(vec![ProductItemPatch {
                    item_id: item.item_id,
                    color: None,
                    image_url: None,
                    sizes: Some(vec![SizePatch {
                        size_id: size.size_id,
                        size: None,
                        price: Some(0),
                        stock: None,
                    }]),
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(ref msg) if msg.contains("price")));

    // Nothing was persisted
    let after = repo.find_by_id(created.product_id).await.unwrap().unwrap();
    assert_eq!(after.product_items[0].sizes[0].price, 450);
}

#[tokio::test]
async fn update_of_unknown_product_is_not_found() {
    let (_tmp, _db, repo) = open_repo().await;

    let err = repo
        .update(
            4242,
            ProductUpdate {
                product_name: Some("ghost".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn update_of_unknown_item_is_not_found() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(hoodie_submission()).await.unwrap();
    let err = repo
        .update(
            created.product_id,
            ProductUpdate {
                product_items: Some(vec![ProductItemPatch {
                    item_id: 999_999,
                    color: Some("red".to_string()),
                    image_url: None,
                    sizes: None,
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

// ========================================================================
// Cascade delete
// ========================================================================

#[tokio::test]
async fn delete_cascades_and_leaves_no_orphans() {
    let (_tmp, db, repo) = open_repo().await;

    let shirt = repo.create(shirt_submission()).await.unwrap();
    let hoodie = repo.create(hoodie_submission()).await.unwrap();

    let deleted = repo.delete(shirt.product_id).await.unwrap();
    assert_eq!(deleted, shirt.product_id);

    assert!(repo.find_by_id(shirt.product_id).await.unwrap().is_none());

    // Only the hoodie's tree remains queryable
    assert_eq!(count_rows(&db, "product").await, 1);
    assert_eq!(count_rows(&db, "product_item").await, 1);
    assert_eq!(count_rows(&db, "size").await, 1);
    assert_eq!(count_rows(&db, "stock").await, 1);

    let remaining = repo.find_by_id(hoodie.product_id).await.unwrap().unwrap();
    assert_eq!(remaining.product_items[0].sizes.len(), 1);
}

#[tokio::test]
async fn delete_of_unknown_product_is_not_found() {
    let (_tmp, _db, repo) = open_repo().await;

    let err = repo.delete(31337).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

// ========================================================================
// Listing and search
// ========================================================================

#[tokio::test]
async fn listing_is_ordered_by_identity_and_limit_is_a_prefix() {
    let (_tmp, _db, repo) = open_repo().await;

    let first = repo.create(hoodie_submission()).await.unwrap();
    let second = repo.create(shirt_submission()).await.unwrap();
    let mut third = hoodie_submission();
    third.product_name = "Cap".to_string();
    let third = repo.create(third).await.unwrap();

    let all = repo.find_all().await.unwrap();
    let ids: Vec<i64> = all.iter().map(|p| p.product_id).collect();
    assert_eq!(
        ids,
        vec![first.product_id, second.product_id, third.product_id]
    );

    let limited = repo.find_limited(2).await.unwrap();
    let limited_ids: Vec<i64> = limited.iter().map(|p| p.product_id).collect();
    assert_eq!(limited_ids, ids[..2].to_vec());
}

#[tokio::test]
async fn search_matches_substrings_case_insensitively() {
    let (_tmp, _db, repo) = open_repo().await;

    repo.create(shirt_submission()).await.unwrap();
    repo.create(hoodie_submission()).await.unwrap();

    let hits = repo.search("shi").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].product_name, "Shirt");

    let hits = repo.search("SHIRT").await.unwrap();
    assert_eq!(hits.len(), 1);

    // No match is an empty list, not an error
    let hits = repo.search("trousers").await.unwrap();
    assert!(hits.is_empty());
}

// ========================================================================
// Item images
// ========================================================================

#[tokio::test]
async fn set_item_image_replaces_the_reference() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(hoodie_submission()).await.unwrap();
    let item_id = created.product_items[0].item_id;
    assert_eq!(created.product_items[0].image_url, "");

    let item = repo
        .set_item_image(item_id, "http://cdn.example/hoodie.png")
        .await
        .unwrap();
    assert_eq!(item.image_url, "http://cdn.example/hoodie.png");
    assert_eq!(item.sizes.len(), 1);

    let fetched = repo.find_by_id(created.product_id).await.unwrap().unwrap();
    assert_eq!(
        fetched.product_items[0].image_url,
        "http://cdn.example/hoodie.png"
    );
}

#[tokio::test]
async fn set_item_image_on_unknown_item_is_not_found() {
    let (_tmp, _db, repo) = open_repo().await;

    let err = repo
        .set_item_image(271_828, "http://cdn.example/x.png")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn set_item_image_rejects_an_empty_url() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(hoodie_submission()).await.unwrap();
    let item_id = created.product_items[0].item_id;

    let err = repo.set_item_image(item_id, "  ").await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

// ========================================================================
// Duplicate variant axes
// ========================================================================

#[tokio::test]
async fn duplicate_color_across_items_is_rejected() {
    let (_tmp, db, repo) = open_repo().await;

    let mut data = shirt_submission();
    data.product_items[1].color = "Green".to_string();

    let err = repo.create(data).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(ref msg) if msg.contains("color")));
    assert_eq!(count_rows(&db, "product").await, 0);
}

#[tokio::test]
async fn update_cannot_introduce_a_duplicate_size_label() {
    let (_tmp, _db, repo) = open_repo().await;

    let created = repo.create(shirt_submission()).await.unwrap();
    let item = &created.product_items[0];
    // Rename "small" to "medium", which the same item already has
    let err = repo
        .update(
            created.product_id,
            ProductUpdate {
                product_items: Some(vec![ProductItemPatch {
                    item_id: item.item_id,
                    color: None,
                    image_url: None,
                    sizes: Some(vec![SizePatch {
                        size_id: item.sizes[0].size_id,
                        size: Some("medium".to_string()),
                        price: None,
                        stock: None,
                    }]),
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(ref msg) if msg.contains("size")));
}
