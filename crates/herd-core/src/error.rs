//! Error types and result aliases for herd.
//!
//! This module defines the shared error types used across all herd components.
//! Errors are structured for programmatic handling and include context for debugging.

use std::fmt;

/// The result type used throughout herd.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in herd core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A key part was missing or malformed.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of what made the key invalid.
        message: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The requested resource was not found.
    #[error("not found: {resource_type} with key {key}")]
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: &'static str,
        /// The key that was looked up.
        key: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new invalid key error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a serialization error wrapping a `serde_json` failure.
    #[must_use]
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a new resource not found error.
    #[must_use]
    pub fn resource_not_found(resource_type: &'static str, key: impl fmt::Display) -> Self {
        Self::ResourceNotFound {
            resource_type,
            key: key.to_string(),
        }
    }
}
