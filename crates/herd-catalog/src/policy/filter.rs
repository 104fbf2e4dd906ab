//! Storage policy filters and their priority ranking.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use herd_core::keys::{codes_equal, optional_part, required_part};

use crate::error::{CatalogError, Result};
use crate::record::CatalogRecord;

/// Which records a policy applies to.
///
/// Optional fields left unset act as wildcards. The source storage is always
/// required: a policy only ever looks at data in one storage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePolicyFilter {
    /// Namespace code to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Business object definition name to match. Requires `namespace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_object_definition_name: Option<String>,
    /// Business object format usage code to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_object_format_usage: Option<String>,
    /// Business object format file type code to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_object_format_file_type: Option<String>,
    /// Storage the data must currently live in.
    pub storage_name: String,
}

impl StoragePolicyFilter {
    /// Creates a filter that matches every record in `storage_name`.
    #[must_use]
    pub fn for_storage(storage_name: impl Into<String>) -> Self {
        Self {
            storage_name: storage_name.into(),
            ..Self::default()
        }
    }

    /// Restricts the filter to one business object definition.
    #[must_use]
    pub fn with_definition(
        mut self,
        namespace: impl Into<String>,
        definition_name: impl Into<String>,
    ) -> Self {
        self.namespace = Some(namespace.into());
        self.business_object_definition_name = Some(definition_name.into());
        self
    }

    /// Restricts the filter to one business object format usage and file type.
    #[must_use]
    pub fn with_format(mut self, usage: impl Into<String>, file_type: impl Into<String>) -> Self {
        self.business_object_format_usage = Some(usage.into());
        self.business_object_format_file_type = Some(file_type.into());
        self
    }

    /// Returns a trimmed copy with blank optional fields cleared.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidPolicy`] if the storage name is blank or
    /// a definition name is given without a namespace.
    pub fn normalized(&self) -> Result<Self> {
        let filter = Self {
            namespace: optional_part(self.namespace.as_deref()),
            business_object_definition_name: optional_part(
                self.business_object_definition_name.as_deref(),
            ),
            business_object_format_usage: optional_part(self.business_object_format_usage.as_deref()),
            business_object_format_file_type: optional_part(
                self.business_object_format_file_type.as_deref(),
            ),
            storage_name: required_part("filter storage name", &self.storage_name)
                .map_err(|e| CatalogError::invalid_policy(e.to_string()))?,
        };

        if filter.business_object_definition_name.is_some() && filter.namespace.is_none() {
            return Err(CatalogError::invalid_policy(
                "namespace must be specified when a business object definition name is specified",
            ));
        }

        Ok(filter)
    }

    /// Number of optional fields that are set.
    #[must_use]
    pub fn specificity(&self) -> u8 {
        [
            &self.namespace,
            &self.business_object_definition_name,
            &self.business_object_format_usage,
            &self.business_object_format_file_type,
        ]
        .into_iter()
        .map(|field| u8::from(field.is_some()))
        .sum()
    }

    /// Returns true if the filter names a business object definition.
    #[must_use]
    pub fn is_definition_scoped(&self) -> bool {
        self.business_object_definition_name.is_some()
    }

    /// Rank of this filter among overlapping policies.
    #[must_use]
    pub fn priority(&self) -> FilterPriority {
        FilterPriority {
            specificity: self.specificity(),
            definition_scoped: self.is_definition_scoped(),
        }
    }

    /// Returns true if every set field equals the record's value and the
    /// record lives in the filter's storage.
    #[must_use]
    pub fn matches(&self, record: &CatalogRecord) -> bool {
        let key = &record.key;
        field_matches(self.namespace.as_deref(), &key.namespace)
            && field_matches(
                self.business_object_definition_name.as_deref(),
                &key.business_object_definition_name,
            )
            && field_matches(
                self.business_object_format_usage.as_deref(),
                &key.business_object_format_usage,
            )
            && field_matches(
                self.business_object_format_file_type.as_deref(),
                &key.business_object_format_file_type,
            )
            && record.is_in_storage(&self.storage_name)
    }
}

fn field_matches(filter_value: Option<&str>, record_value: &str) -> bool {
    filter_value.is_none_or(|v| codes_equal(v, record_value))
}

/// Ranking of a filter; greater means higher priority.
///
/// Filters with more fields set win. At equal field counts a filter naming a
/// business object definition beats one that does not, which orders the
/// common shapes as definition+format, definition, format, storage only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterPriority {
    /// Number of optional filter fields set.
    pub specificity: u8,
    /// Whether the filter names a business object definition.
    pub definition_scoped: bool,
}

impl Ord for FilterPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.specificity
            .cmp(&other.specificity)
            .then_with(|| self.definition_scoped.cmp(&other.definition_scoped))
    }
}

impl PartialOrd for FilterPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use herd_core::CatalogRecordKey;

    use super::*;
    use crate::record::{StorageUnit, data_status};

    fn record(storage: &str) -> CatalogRecord {
        let key = CatalogRecordKey {
            namespace: "NS".into(),
            business_object_definition_name: "trades".into(),
            business_object_format_usage: "PRC".into(),
            business_object_format_file_type: "TXT".into(),
            business_object_format_version: 0,
            partition_value: "2024-01-01".into(),
            sub_partition_values: vec![],
            business_object_data_version: 0,
        };
        CatalogRecord::new(&key, data_status::VALID, Utc::now(), &StorageUnit::enabled(storage))
            .unwrap()
    }

    #[test]
    fn wildcard_filter_matches_any_record_in_storage() {
        let filter = StoragePolicyFilter::for_storage("S3");
        assert!(filter.matches(&record("S3")));
        assert!(!filter.matches(&record("GLACIER")));
        assert_eq!(filter.specificity(), 0);
    }

    #[test]
    fn set_fields_must_all_match() {
        let filter = StoragePolicyFilter::for_storage("S3")
            .with_definition("ns", "TRADES")
            .with_format("prc", "txt");
        assert!(filter.matches(&record("S3")));

        let filter = StoragePolicyFilter::for_storage("S3").with_format("PRC", "CSV");
        assert!(!filter.matches(&record("S3")));
    }

    #[test]
    fn namespace_only_filter_matches() {
        let filter = StoragePolicyFilter {
            namespace: Some("NS".into()),
            ..StoragePolicyFilter::for_storage("S3")
        };
        assert!(filter.matches(&record("S3")));
        assert_eq!(filter.specificity(), 1);
        assert!(!filter.is_definition_scoped());
    }

    #[test]
    fn normalized_clears_blank_fields() {
        let filter = StoragePolicyFilter {
            namespace: Some("  ".into()),
            business_object_format_usage: Some(" PRC ".into()),
            ..StoragePolicyFilter::for_storage(" S3 ")
        };
        let normalized = filter.normalized().unwrap();
        assert_eq!(normalized.namespace, None);
        assert_eq!(normalized.business_object_format_usage.as_deref(), Some("PRC"));
        assert_eq!(normalized.storage_name, "S3");
    }

    #[test]
    fn normalized_requires_namespace_with_definition() {
        let filter = StoragePolicyFilter {
            business_object_definition_name: Some("trades".into()),
            ..StoragePolicyFilter::for_storage("S3")
        };
        assert!(matches!(
            filter.normalized(),
            Err(CatalogError::InvalidPolicy { .. })
        ));
    }

    #[test]
    fn normalized_requires_storage() {
        assert!(StoragePolicyFilter::for_storage("").normalized().is_err());
    }

    #[test]
    fn priority_orders_common_filter_shapes() {
        let full = StoragePolicyFilter::for_storage("S3")
            .with_definition("NS", "trades")
            .with_format("PRC", "TXT")
            .priority();
        let definition = StoragePolicyFilter::for_storage("S3")
            .with_definition("NS", "trades")
            .priority();
        let format = StoragePolicyFilter::for_storage("S3")
            .with_format("PRC", "TXT")
            .priority();
        let storage_only = StoragePolicyFilter::for_storage("S3").priority();

        assert!(full > definition);
        assert!(definition > format);
        assert!(format > storage_only);
    }
}
