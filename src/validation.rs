//! Identifier validation for mdcatalog
//!
//! Collection names and document ids become directory and file names, so both
//! are checked before they touch the filesystem.

use thiserror::Error;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid identifier '{0}': {1}")]
    InvalidIdentifier(String, &'static str),

    #[error("Identifier '{0}' is too long (max {1} characters)")]
    TooLong(String, usize),

    #[error("Identifier cannot be empty")]
    Empty,

    #[error("Reserved name: '{0}'")]
    Reserved(String),
}

/// Maximum length for identifiers
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Names Windows refuses as file names, plus the relative directory entries
const RESERVED_NAMES: &[&str] = &[
    ".", "..", "con", "prn", "aux", "nul",
    "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8", "com9",
    "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Validate a collection name
pub fn validate_collection_name(name: &str) -> Result<(), ValidationError> {
    validate_identifier(name)
}

/// Validate a document ID
///
/// Same rules as collection names; store-assigned UUIDs always pass.
pub fn validate_document_id(id: &str) -> Result<(), ValidationError> {
    validate_identifier(id)
}

/// Rules:
/// - 1-255 characters
/// - only ASCII alphanumerics, underscore and hyphen
/// - no leading hyphen or underscore
/// - not a reserved name (case-insensitive)
fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong(name.to_string(), MAX_IDENTIFIER_LENGTH));
    }

    for (i, c) in name.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
            return Err(ValidationError::InvalidIdentifier(
                name.to_string(),
                "contains invalid characters (only alphanumeric, underscore, and hyphen allowed)",
            ));
        }
        if i == 0 && (c == '-' || c == '_') {
            return Err(ValidationError::InvalidIdentifier(
                name.to_string(),
                "cannot start with hyphen or underscore",
            ));
        }
    }

    if RESERVED_NAMES.contains(&name.to_lowercase().as_str()) {
        return Err(ValidationError::Reserved(name.to_string()));
    }

    Ok(())
}
