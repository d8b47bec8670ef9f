//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查接口
//! - [`products`] - 商品管理接口

pub mod health;
pub mod products;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
