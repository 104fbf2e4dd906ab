//! Error types for herd-catalog operations.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The destination queue identity does not resolve to a known channel.
    #[error("queue with \"{queue_name}\" name not found")]
    UnknownChannel {
        /// The queue identity that was looked up.
        queue_name: String,
    },

    /// A stored policy uses a rule type the selector does not implement.
    #[error("storage policy rule type \"{rule_type}\" is not supported")]
    UnsupportedPolicyRule {
        /// The unsupported rule type.
        rule_type: String,
    },

    /// A storage policy create or update request failed validation.
    #[error("invalid storage policy: {message}")]
    InvalidPolicy {
        /// Description of the validation failure.
        message: String,
    },

    /// A resource with the same key already exists.
    #[error("already exists: {message}")]
    AlreadyExists {
        /// Description of the conflicting resource.
        message: String,
    },

    /// Resource not found.
    #[error("not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// Publishing a selection message to its channel failed.
    #[error("publish to \"{queue_name}\" failed: {message}")]
    Publish {
        /// Channel the message was sent to.
        queue_name: String,
        /// Description of the publish failure.
        message: String,
    },

    /// An error from the shared core crate (keys, serialization, input).
    #[error(transparent)]
    Core(#[from] herd_core::Error),
}

impl CatalogError {
    /// Returns true for errors caused by deployment or policy misconfiguration.
    ///
    /// These abort a selection run outright and are never retried.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownChannel { .. } | Self::UnsupportedPolicyRule { .. }
        )
    }

    pub(crate) fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_flagged() {
        let unknown = CatalogError::UnknownChannel {
            queue_name: "missing".into(),
        };
        let unsupported = CatalogError::UnsupportedPolicyRule {
            rule_type: "SIZE".into(),
        };
        assert!(unknown.is_configuration_error());
        assert!(unsupported.is_configuration_error());
        assert!(!CatalogError::invalid_policy("x").is_configuration_error());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = CatalogError::UnknownChannel {
            queue_name: "missing".into(),
        };
        assert_eq!(err.to_string(), "queue with \"missing\" name not found");

        let err = CatalogError::UnsupportedPolicyRule {
            rule_type: "SIZE".into(),
        };
        assert_eq!(
            err.to_string(),
            "storage policy rule type \"SIZE\" is not supported"
        );
    }
}
