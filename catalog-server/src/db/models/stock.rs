//! Stock Model
//!
//! Each size owns exactly one stock row. The three-tier stock level is a
//! pure function of the count, recomputed wherever stock is surfaced and
//! never persisted.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type StockId = RecordId;

/// Stock row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<StockId>,
    /// Record link to the owning size (1:1, unique-indexed)
    pub size: RecordId,
    #[serde(default)]
    pub stock: i64,
}

/// Derived stock tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockLevel {
    Low,
    Medium,
    High,
}

impl StockLevel {
    /// Classify a raw count. Total over all integers; counts below zero
    /// should not occur but still classify as `Low`.
    pub fn classify(stock: i64) -> Self {
        if stock > 100 {
            StockLevel::High
        } else if stock > 50 {
            StockLevel::Medium
        } else {
            StockLevel::Low
        }
    }
}

/// Hydrated stock with the derived level decorated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockFull {
    pub stock_id: i64,
    pub size_id: i64,
    pub stock: i64,
    pub stock_level: StockLevel,
}

impl StockFull {
    pub fn new(stock_id: i64, size_id: i64, stock: i64) -> Self {
        Self {
            stock_id,
            size_id,
            stock,
            stock_level: StockLevel::classify(stock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_threshold_exact() {
        assert_eq!(StockLevel::classify(101), StockLevel::High);
        assert_eq!(StockLevel::classify(100), StockLevel::Medium);
        assert_eq!(StockLevel::classify(51), StockLevel::Medium);
        assert_eq!(StockLevel::classify(50), StockLevel::Low);
        assert_eq!(StockLevel::classify(0), StockLevel::Low);
    }

    #[test]
    fn negative_counts_classify_as_low() {
        assert_eq!(StockLevel::classify(-1), StockLevel::Low);
        assert_eq!(StockLevel::classify(i64::MIN), StockLevel::Low);
    }

    #[test]
    fn level_serializes_as_plain_variant_name() {
        let level = serde_json::to_value(StockLevel::Medium).unwrap();
        assert_eq!(level, serde_json::json!("Medium"));
    }

    #[test]
    fn hydrated_stock_carries_derived_level() {
        let full = StockFull::new(1, 2, 250);
        assert_eq!(full.stock_level, StockLevel::High);
    }
}
