//! Input checks shared by the write paths. They run before any transaction is
//! opened so invalid requests never touch the database.

use crate::error::{RecordsError, Result};
use crate::models::canonical_subject;

/// Trimmed, non-blank name.
pub(crate) fn require_name<'a>(what: &str, raw: &'a str) -> Result<&'a str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(RecordsError::InvalidArgument(format!("{what} name is required.")))
    } else {
        Ok(trimmed)
    }
}

pub(crate) fn require_subject(raw: &str) -> Result<String> {
    canonical_subject(raw)
        .ok_or_else(|| RecordsError::InvalidArgument("Class subject is required.".to_string()))
}

pub(crate) fn require_non_negative(field: &str, value: i64) -> Result<i64> {
    if value < 0 {
        Err(RecordsError::InvalidArgument(format!(
            "{field} must be zero or greater, got {value}."
        )))
    } else {
        Ok(value)
    }
}
