//! Database Module
//!
//! Owns the embedded SurrealDB instance and the schema for the four
//! aggregate tables. Invariant checks are deliberately NOT expressed as
//! field assertions here; they live in the repository entry points so a
//! violation surfaces as a structured validation error, not a storage
//! error.

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "catalog";
const DATABASE: &str = "catalog";

// Tables are schemaless; the only storage-level rule is the 1:1 link
// between a size and its stock row.
const SCHEMA: &str = "\
    DEFINE TABLE IF NOT EXISTS product SCHEMALESS;\n\
    DEFINE TABLE IF NOT EXISTS product_item SCHEMALESS;\n\
    DEFINE TABLE IF NOT EXISTS size SCHEMALESS;\n\
    DEFINE TABLE IF NOT EXISTS stock SCHEMALESS;\n\
    DEFINE INDEX IF NOT EXISTS stock_size_unique ON TABLE stock COLUMNS size UNIQUE;\n";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the embedded database under `db_dir` and apply the
    /// schema definitions.
    pub async fn new(db_dir: &Path) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_dir)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        db.query(SCHEMA)
            .await
            .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?
            .check()
            .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;

        tracing::info!("Database ready (embedded SurrealDB at {})", db_dir.display());
        Ok(Self { db })
    }
}
