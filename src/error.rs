//! Error types for mdcatalog
//!
//! Two kinds of failure reach callers of the catalog: a product id that does
//! not resolve (`ProductNotFound`) and everything the document store can fail
//! with. Bad search input is never an error; it is coerced or ignored.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for mdcatalog operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Catalog Errors
    // ==========================================================================
    #[error("Product not found with id {id}")]
    ProductNotFound { id: String },

    // ==========================================================================
    // Document Errors
    // ==========================================================================
    #[error("Document '{id}' not found in collection '{collection}'")]
    DocumentNotFound { collection: String, id: String },

    #[error("Document '{id}' already exists in collection '{collection}'")]
    DocumentAlreadyExists { collection: String, id: String },

    #[error("Malformed document '{id}' in collection '{collection}': {message}")]
    MalformedDocument {
        collection: String,
        id: String,
        message: String,
    },

    #[error("Failed to create collection '{name}': {source}")]
    CollectionCreateFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    // ==========================================================================
    // Validation Errors
    // ==========================================================================
    #[error("Invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Reserved name '{name}' cannot be used")]
    ReservedName { name: String },

    // ==========================================================================
    // Git Errors
    // ==========================================================================
    #[error("Git operation failed: {message}")]
    GitError {
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    // ==========================================================================
    // IO Errors
    // ==========================================================================
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==========================================================================
    // Serialization Errors
    // ==========================================================================
    #[error("Failed to parse YAML: {message}")]
    YamlParseError { message: String },

    #[error("Failed to serialize to YAML: {message}")]
    YamlSerializeError { message: String },

    #[error("Failed to parse JSON: {message}")]
    JsonParseError { message: String },

    // ==========================================================================
    // Catch-all
    // ==========================================================================
    #[error("{0}")]
    Other(String),
}

/// Result type alias for mdcatalog operations
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::GitError {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::YamlParseError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonParseError {
            message: err.to_string(),
        }
    }
}

impl From<crate::validation::ValidationError> for Error {
    fn from(err: crate::validation::ValidationError) -> Self {
        match err {
            crate::validation::ValidationError::InvalidIdentifier(value, reason) => {
                Error::InvalidIdentifier {
                    kind: "identifier",
                    value,
                    reason,
                }
            }
            crate::validation::ValidationError::TooLong(value, _max) => Error::InvalidIdentifier {
                kind: "identifier",
                value,
                reason: "exceeds maximum length",
            },
            crate::validation::ValidationError::Empty => Error::InvalidIdentifier {
                kind: "identifier",
                value: String::new(),
                reason: "cannot be empty",
            },
            crate::validation::ValidationError::Reserved(name) => Error::ReservedName { name },
        }
    }
}

// =============================================================================
// Error Classification
// =============================================================================

impl Error {
    /// True when the requested product does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ProductNotFound { .. })
    }

    /// True when the document store failed or rejected the operation
    pub fn is_store_failure(&self) -> bool {
        !self.is_not_found()
    }

    /// Returns a user-friendly suggestion for fixing the error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ProductNotFound { .. } => {
                Some("Check the product id with: mdcatalog search")
            }
            Error::InvalidIdentifier { .. } => {
                Some("Use only letters, numbers, underscores, and hyphens")
            }
            Error::MalformedDocument { .. } | Error::YamlParseError { .. } => {
                Some("Fix or remove the offending markdown file under collections/")
            }
            Error::GitError { .. } => Some("Run with --no-commit to write without git"),
            _ => None,
        }
    }
}
