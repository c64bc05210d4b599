//! Identifier and value validation
//!
//! Pure checks run before any request leaves the process.

use tracing::trace;

use crate::error::{Error, Result};
use crate::types::ResourceKind;

/// Maximum length of a set or lookup name
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a stored value
pub const MAX_VALUE_LEN: usize = 255;

/// Check a set/lookup name against `^[A-Za-z0-9_-]{1,100}$`.
pub fn validate_name(kind: ResourceKind, name: &str) -> Result<()> {
    trace!(resource = %kind, name, "validating name");

    if name.is_empty() {
        return Err(Error::validation(format!(
            "{} name is required and must be a string",
            kind
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::validation(format!(
            "{} name can only contain letters, numbers, hyphens, and underscores",
            kind
        )));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "{} name cannot exceed {} characters",
            kind, MAX_NAME_LEN
        )));
    }

    Ok(())
}

/// Check a value is non-empty and at most 255 characters.
pub fn validate_value(value: &str) -> Result<()> {
    validate_labeled_value("Value", value)
}

/// [`validate_value`] with a custom label (`Left value`, `Right value`, ...)
pub fn validate_labeled_value(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(format!(
            "{} is required and must be a string",
            label
        )));
    }

    if value.chars().count() > MAX_VALUE_LEN {
        return Err(Error::validation(format!(
            "{} cannot exceed {} characters",
            label, MAX_VALUE_LEN
        )));
    }

    Ok(())
}

/// Check a lock or last-updated key is present.
pub fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::validation("Key is required and cannot be empty"));
    }
    Ok(())
}
