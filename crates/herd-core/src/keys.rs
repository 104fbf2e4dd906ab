//! Alternate keys for storage policies and registered business object data.
//!
//! herd identifies catalog rows by composite natural keys rather than surrogate
//! IDs. Code-valued key parts (namespaces, definition names, format usages and
//! file types) are compared case-insensitively, the same way the catalog looks
//! them up. Keys keep whatever casing they were registered with.
//!
//! # Example
//!
//! ```rust
//! use herd_core::keys::StoragePolicyKey;
//!
//! let key = StoragePolicyKey::new(" FINRA ", "archive-after-90").unwrap();
//! assert_eq!(key.namespace, "FINRA");
//! assert!(key.matches(&StoragePolicyKey::new("finra", "ARCHIVE-AFTER-90").unwrap()));
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of sub-partition values a business object data key may carry.
pub const MAX_SUBPARTITION_VALUES: usize = 4;

/// Compares two code values the way the catalog does (ASCII case-insensitive).
#[must_use]
pub fn codes_equal(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right)
}

/// Orders two code values case-insensitively, falling back to a byte order
/// so that values differing only in case still have a stable order.
#[must_use]
pub fn cmp_codes(left: &str, right: &str) -> Ordering {
    let folded = left
        .bytes()
        .map(|b| b.to_ascii_lowercase())
        .cmp(right.bytes().map(|b| b.to_ascii_lowercase()));
    folded.then_with(|| left.cmp(right))
}

/// Trims a required key part and rejects blank values.
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] if the value is empty after trimming.
pub fn required_part(name: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_key(format!("{name} must be specified")));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional key part, treating blank values as not set.
#[must_use]
pub fn optional_part(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Key of a storage policy: a namespace plus a policy name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePolicyKey {
    /// Namespace code the policy is registered under.
    pub namespace: String,
    /// Policy name, unique within the namespace.
    pub storage_policy_name: String,
}

impl StoragePolicyKey {
    /// Creates a key after trimming and validating both parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if either part is blank.
    pub fn new(namespace: &str, storage_policy_name: &str) -> Result<Self> {
        Ok(Self {
            namespace: required_part("namespace", namespace)?,
            storage_policy_name: required_part("storage policy name", storage_policy_name)?,
        })
    }

    /// Re-validates a key built from untrusted input (for example a decoded message).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if either part is blank.
    pub fn normalized(&self) -> Result<Self> {
        Self::new(&self.namespace, &self.storage_policy_name)
    }

    /// Returns true if both keys name the same policy, ignoring case.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        codes_equal(&self.namespace, &other.namespace)
            && codes_equal(&self.storage_policy_name, &other.storage_policy_name)
    }

    /// Case-insensitive ordering by namespace, then policy name.
    #[must_use]
    pub fn cmp_codes(&self, other: &Self) -> Ordering {
        cmp_codes(&self.namespace, &other.namespace)
            .then_with(|| cmp_codes(&self.storage_policy_name, &other.storage_policy_name))
    }
}

impl fmt::Display for StoragePolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "namespace: \"{}\", storagePolicyName: \"{}\"",
            self.namespace, self.storage_policy_name
        )
    }
}

/// Key of one registered version of business object data.
///
/// This is the catalog record key: the business object format it belongs to,
/// the primary partition value, up to [`MAX_SUBPARTITION_VALUES`] sub-partition
/// values, and the data version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecordKey {
    /// Namespace code.
    pub namespace: String,
    /// Business object definition name.
    pub business_object_definition_name: String,
    /// Business object format usage code.
    pub business_object_format_usage: String,
    /// Business object format file type code.
    pub business_object_format_file_type: String,
    /// Business object format version.
    pub business_object_format_version: u32,
    /// Primary partition value.
    pub partition_value: String,
    /// Sub-partition values, outermost first.
    #[serde(default)]
    pub sub_partition_values: Vec<String>,
    /// Business object data version.
    pub business_object_data_version: u32,
}

impl CatalogRecordKey {
    /// Returns a copy with every string part trimmed and validated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if a required part is blank, a sub-partition
    /// value is blank, or more than [`MAX_SUBPARTITION_VALUES`] sub-partition
    /// values are present.
    pub fn normalized(&self) -> Result<Self> {
        if self.sub_partition_values.len() > MAX_SUBPARTITION_VALUES {
            return Err(Error::invalid_key(format!(
                "exceeded maximum number of allowed sub-partition values: {} (got {})",
                MAX_SUBPARTITION_VALUES,
                self.sub_partition_values.len()
            )));
        }

        let sub_partition_values = self
            .sub_partition_values
            .iter()
            .enumerate()
            .map(|(i, v)| required_part(&format!("sub-partition value #{}", i + 1), v))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            namespace: required_part("namespace", &self.namespace)?,
            business_object_definition_name: required_part(
                "business object definition name",
                &self.business_object_definition_name,
            )?,
            business_object_format_usage: required_part(
                "business object format usage",
                &self.business_object_format_usage,
            )?,
            business_object_format_file_type: required_part(
                "business object format file type",
                &self.business_object_format_file_type,
            )?,
            business_object_format_version: self.business_object_format_version,
            partition_value: required_part("partition value", &self.partition_value)?,
            sub_partition_values,
            business_object_data_version: self.business_object_data_version,
        })
    }

    /// Returns true if both keys identify the same data, ignoring case in
    /// code-valued parts. Partition values are compared exactly.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        codes_equal(&self.namespace, &other.namespace)
            && codes_equal(
                &self.business_object_definition_name,
                &other.business_object_definition_name,
            )
            && codes_equal(
                &self.business_object_format_usage,
                &other.business_object_format_usage,
            )
            && codes_equal(
                &self.business_object_format_file_type,
                &other.business_object_format_file_type,
            )
            && self.business_object_format_version == other.business_object_format_version
            && self.partition_value == other.partition_value
            && self.sub_partition_values == other.sub_partition_values
            && self.business_object_data_version == other.business_object_data_version
    }
}

impl fmt::Display for CatalogRecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "namespace: \"{}\", businessObjectDefinitionName: \"{}\", \
             businessObjectFormatUsage: \"{}\", businessObjectFormatFileType: \"{}\", \
             businessObjectFormatVersion: {}, businessObjectDataPartitionValue: \"{}\", \
             businessObjectDataSubPartitionValues: \"{}\", businessObjectDataVersion: {}",
            self.namespace,
            self.business_object_definition_name,
            self.business_object_format_usage,
            self.business_object_format_file_type,
            self.business_object_format_version,
            self.partition_value,
            self.sub_partition_values.join(","),
            self.business_object_data_version
        )
    }
}
