//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Limits are chosen based on:
//! - Reasonable UX limits for names and descriptions
//! - Embedded storage has no built-in length enforcement

use crate::db::repository::RepoError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product name, size label, color
pub const MAX_NAME_LEN: usize = 200;

/// Descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), RepoError> {
    if value.trim().is_empty() {
        return Err(RepoError::Validation(format!("{field} must not be empty")));
    }
    validate_text(value, field, max_len)
}

/// Validate that a string is within the length limit (empty is allowed).
pub fn validate_text(value: &str, field: &str, max_len: usize) -> Result<(), RepoError> {
    if value.len() > max_len {
        return Err(RepoError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), RepoError> {
    if let Some(v) = value {
        validate_text(v, field, max_len)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_required_text() {
        let err = validate_required_text("   ", "product_name", MAX_NAME_LEN).unwrap_err();
        assert!(matches!(err, RepoError::Validation(msg) if msg.contains("product_name")));
    }

    #[test]
    fn rejects_overlong_text() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let err = validate_required_text(&long, "color", MAX_NAME_LEN).unwrap_err();
        assert!(matches!(err, RepoError::Validation(msg) if msg.contains("too long")));
    }

    #[test]
    fn accepts_absent_optional_text() {
        assert!(validate_optional_text(&None, "image_url", MAX_URL_LEN).is_ok());
    }
}
