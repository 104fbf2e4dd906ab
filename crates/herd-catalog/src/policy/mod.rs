//! Storage policies.
//!
//! A storage policy is a rule, a filter, and a transition:
//!
//! - the **filter** picks which registered data the policy looks at,
//! - the **rule** says when that data becomes due,
//! - the **transition** names the storage the data should move to.
//!
//! # Example
//!
//! ```rust
//! use herd_catalog::policy::{
//!     StoragePolicy, StoragePolicyFilter, StoragePolicyRule, StoragePolicyTransition,
//! };
//! use herd_core::StoragePolicyKey;
//!
//! let policy = StoragePolicy {
//!     key: StoragePolicyKey::new("FINRA", "archive-trades")?,
//!     rule: StoragePolicyRule::days_since_registration(90),
//!     filter: StoragePolicyFilter::for_storage("S3_MANAGED").with_definition("FINRA", "trades"),
//!     transition: StoragePolicyTransition::new("S3_GLACIER"),
//! };
//! assert!(policy.normalized().is_ok());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod filter;
mod rule;

use serde::{Deserialize, Serialize};

use herd_core::StoragePolicyKey;
use herd_core::keys::{codes_equal, required_part};

use crate::error::{CatalogError, Result};

pub use filter::{FilterPriority, StoragePolicyFilter};
pub use rule::{DAYS_SINCE_BDATA_REGISTERED, EvaluatedRule, StoragePolicyRule};

/// Where matching data should move to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePolicyTransition {
    /// Destination storage name.
    pub destination_storage_name: String,
}

impl StoragePolicyTransition {
    /// Creates a transition to the named storage.
    #[must_use]
    pub fn new(destination_storage_name: impl Into<String>) -> Self {
        Self {
            destination_storage_name: destination_storage_name.into(),
        }
    }
}

/// A registered storage policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePolicy {
    /// Policy key.
    #[serde(rename = "storagePolicyKey")]
    pub key: StoragePolicyKey,
    /// When matching data becomes due.
    #[serde(rename = "storagePolicyRule")]
    pub rule: StoragePolicyRule,
    /// Which data the policy applies to.
    #[serde(rename = "storagePolicyFilter")]
    pub filter: StoragePolicyFilter,
    /// Where matching data moves.
    #[serde(rename = "storagePolicyTransition")]
    pub transition: StoragePolicyTransition,
}

impl StoragePolicy {
    /// Returns a trimmed, validated copy suitable for registration.
    ///
    /// The rule type is deliberately not checked here; policies with rule
    /// types this build cannot apply are rejected when selection runs.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidPolicy`] if the key, rule type, filter,
    /// or transition is invalid, or if the transition targets the filter's
    /// own storage.
    pub fn normalized(&self) -> Result<Self> {
        let key = self
            .key
            .normalized()
            .map_err(|e| CatalogError::invalid_policy(e.to_string()))?;
        let rule_type = required_part("storage policy rule type", &self.rule.rule_type)
            .map_err(|e| CatalogError::invalid_policy(e.to_string()))?;
        let filter = self.filter.normalized()?;
        let destination_storage_name = required_part(
            "destination storage name",
            &self.transition.destination_storage_name,
        )
        .map_err(|e| CatalogError::invalid_policy(e.to_string()))?;

        if codes_equal(&destination_storage_name, &filter.storage_name) {
            return Err(CatalogError::invalid_policy(format!(
                "destination storage \"{destination_storage_name}\" must differ from the filter storage"
            )));
        }

        Ok(Self {
            key,
            rule: StoragePolicyRule::new(rule_type, self.rule.rule_value),
            filter,
            transition: StoragePolicyTransition::new(destination_storage_name),
        })
    }
}
