//! Repository Module
//!
//! CRUD operations for the catalog aggregate over embedded SurrealDB.

pub mod product;

pub use product::ProductRepository;

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 i64 雪花 ID
// =============================================================================
//
// 记录 ID 统一为 "table:id" 形式，id 是服务端分配的 i64 (utils::snowflake_id)：
//   - 构造: let id = thing("product", 123);
//   - 取纯 ID: let key = record_key(&id)?;
//   - CRUD: db.select(id) / db.delete(id) 直接使用 RecordId

/// Build a record id from a table name and an i64 key.
pub(crate) fn thing(table: &str, id: i64) -> RecordId {
    RecordId::from_table_key(table, id)
}

/// Extract the i64 key from a record id.
pub(crate) fn record_key(id: &RecordId) -> RepoResult<i64> {
    id.key()
        .to_string()
        .parse::<i64>()
        .map_err(|_| RepoError::Database(format!("unexpected record key: {id}")))
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
