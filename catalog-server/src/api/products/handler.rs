//! Product API Handlers
//!
//! Thin delegates over [`ProductRepository`]: deserialize, call the
//! repository, map the error taxonomy onto HTTP statuses via `AppError`.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{
    ItemImageUpdate, ProductCreate, ProductFull, ProductItemFull, ProductUpdate,
};
use crate::db::repository::ProductRepository;
use crate::utils::AppResult;

/// Query parameters for the product listing
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// 返回前 n 个商品；缺省返回全部
    pub limit: Option<i64>,
}

/// Response for delete operations
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: i64,
}

/// GET /api/products - 获取所有商品 (可选 ?limit=n)
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<ProductFull>>> {
    let repo = ProductRepository::new(state.db.clone());
    let products = match params.limit {
        Some(limit) => repo.find_limited(limit).await?,
        None => repo.find_all().await?,
    };
    Ok(Json(products))
}

/// GET /api/products/:id - 获取单个商品 (完整层级)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductFull>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| crate::utils::AppError::not_found(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// GET /api/products/search/:name - 按名称搜索商品
pub async fn search(
    State(state): State<ServerState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<ProductFull>>> {
    let repo = ProductRepository::new(state.db.clone());
    let products = repo.search(&name).await?;
    Ok(Json(products))
}

/// POST /api/products - 创建商品 (原子化创建完整层级)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<ProductFull>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.create(payload).await?;
    Ok(Json(product))
}

/// PUT /api/products/:id - 更新商品 (部分更新)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<ProductFull>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo.update(id, payload).await?;
    Ok(Json(product))
}

/// DELETE /api/products/:id - 删除商品 (级联删除)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DeleteResponse>> {
    let repo = ProductRepository::new(state.db.clone());
    let deleted = repo.delete(id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// PUT /api/products/items/:item_id/image - 设置商品款式图片
pub async fn set_item_image(
    State(state): State<ServerState>,
    Path(item_id): Path<i64>,
    Json(payload): Json<ItemImageUpdate>,
) -> AppResult<Json<ProductItemFull>> {
    let repo = ProductRepository::new(state.db.clone());
    let item = repo.set_item_image(item_id, &payload.image_url).await?;
    Ok(Json(item))
}
