//! Catalog Server - 电商商品目录服务
//!
//! # 架构概述
//!
//! 本服务管理商品聚合 (Product → ProductItem → Size → Stock)：
//! 一个商品由若干颜色款式组成，每个款式有多个尺码，每个尺码有独立的
//! 价格和库存。聚合作为一个一致性单元创建、读取、更新和删除：
//!
//! - **创建**: 一次提交原子化落库整个层级 (单事务，失败全部回滚)
//! - **读取**: 按 ID / 列表 / 名称搜索返回完整层级，库存等级即时推导
//! - **更新**: 部分更新，缺省字段保持不变，更新后重新校验全部不变量
//! - **删除**: 级联删除全部下属款式、尺码和库存
//!
//! # 模块结构
//!
//! ```text
//! catalog-server/src/
//! ├── core/          # 配置、状态、HTTP 服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (模型 + 仓储)
//! └── utils/         # 错误、日志、校验、ID 生成
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use crate::utils::{AppError, AppResult};

// Re-export logger functions
pub use crate::utils::logger::{init_logger, init_logger_with_file};
