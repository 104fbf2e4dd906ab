//! Pre-built test fixtures for storage policy scenarios.
//!
//! Provides constants and factory functions with sensible defaults, plus a
//! [`TestCatalog`] that can back-date registered data.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use herd_catalog::policy::{
    DAYS_SINCE_BDATA_REGISTERED, StoragePolicy, StoragePolicyFilter, StoragePolicyRule,
    StoragePolicyTransition,
};
use herd_catalog::record::{CatalogRecord, StorageUnit, data_status};
use herd_catalog::{InMemoryCatalog, InMemoryQueues, StoragePolicySelector};
use herd_core::{CatalogRecordKey, StoragePolicyKey};

/// Namespace of registered data.
pub const BDEF_NAMESPACE: &str = "UT_NAMESPACE";
/// Business object definition name of registered data.
pub const BDEF_NAME: &str = "UT_BDEF_NAME";
/// Format usage of registered data.
pub const FORMAT_USAGE: &str = "UT_USAGE";
/// Format file type of registered data.
pub const FORMAT_FILE_TYPE: &str = "UT_FILE_TYPE";
/// Format version of registered data.
pub const FORMAT_VERSION: u32 = 0;
/// Default partition value.
pub const PARTITION_VALUE: &str = "2024-01-01";
/// Second partition value.
pub const PARTITION_VALUE_2: &str = "2024-01-02";
/// Data version of registered data.
pub const DATA_VERSION: u32 = 0;

/// Storage policy namespace.
pub const POLICY_NAMESPACE: &str = "UT_POLICY_NAMESPACE";
/// Second storage policy namespace.
pub const POLICY_NAMESPACE_2: &str = "UT_POLICY_NAMESPACE_2";
/// Storage policy name.
pub const POLICY_NAME: &str = "UT_POLICY";
/// Second storage policy name.
pub const POLICY_NAME_2: &str = "UT_POLICY_2";
/// A rule type no build supports.
pub const UNSUPPORTED_RULE_TYPE: &str = "UT_RULE_TYPE";

/// Storage policies filter on.
pub const STORAGE_NAME: &str = "UT_S3_MANAGED";
/// Storage policies transition to.
pub const STORAGE_NAME_2: &str = "UT_S3_GLACIER";

/// A storage unit status outside the well-known set.
pub const STORAGE_UNIT_STATUS: &str = "UT_STORAGE_UNIT_STATUS";

/// Default age threshold in days.
pub const BDATA_AGE_IN_DAYS: u32 = 90;

/// Queue the selector delivers to.
pub const QUEUE_NAME: &str = "ut-storage-policy-selector";
/// A queue name no registry knows.
pub const UNKNOWN_QUEUE_NAME: &str = "ut-queue-not-found";

/// Generous result cap.
pub const MAX_RESULTS: usize = 100;

/// A fixed clock value so tests do not depend on wall time.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

/// Sub-partition values of registered data.
#[must_use]
pub fn sub_partition_values() -> Vec<String> {
    vec!["A".into(), "B".into()]
}

/// Builds a record key for the default format with the given partition value.
#[must_use]
pub fn record_key(partition_value: &str) -> CatalogRecordKey {
    CatalogRecordKey {
        namespace: BDEF_NAMESPACE.into(),
        business_object_definition_name: BDEF_NAME.into(),
        business_object_format_usage: FORMAT_USAGE.into(),
        business_object_format_file_type: FORMAT_FILE_TYPE.into(),
        business_object_format_version: FORMAT_VERSION,
        partition_value: partition_value.into(),
        sub_partition_values: sub_partition_values(),
        business_object_data_version: DATA_VERSION,
    }
}

/// Builds valid data registered `age` before [`fixed_now`] in [`STORAGE_NAME`].
#[must_use]
pub fn record_aged(partition_value: &str, age: TimeDelta) -> CatalogRecord {
    CatalogRecord::new(
        &record_key(partition_value),
        data_status::VALID,
        fixed_now() - age,
        &StorageUnit::enabled(STORAGE_NAME),
    )
    .expect("valid record")
}

/// Builds valid data registered `age_days` days before [`fixed_now`].
#[must_use]
pub fn record(partition_value: &str, age_days: i64) -> CatalogRecord {
    record_aged(partition_value, TimeDelta::days(age_days))
}

/// Builds valid data in [`STORAGE_NAME`] with an arbitrary storage unit status.
#[must_use]
pub fn record_with_unit_status(partition_value: &str, age_days: i64, status: &str) -> CatalogRecord {
    CatalogRecord::new(
        &record_key(partition_value),
        data_status::VALID,
        fixed_now() - TimeDelta::days(age_days),
        &StorageUnit {
            storage_name: STORAGE_NAME.into(),
            status: status.into(),
        },
    )
    .expect("valid record")
}

/// Factory for storage policies that move data from [`STORAGE_NAME`] to
/// [`STORAGE_NAME_2`].
pub struct PolicyFactory;

impl PolicyFactory {
    /// A policy with an arbitrary rule type and filter.
    #[must_use]
    pub fn with_rule(
        namespace: &str,
        name: &str,
        rule_type: &str,
        rule_value: u32,
        filter: StoragePolicyFilter,
    ) -> StoragePolicy {
        StoragePolicy {
            key: StoragePolicyKey::new(namespace, name).expect("valid policy key"),
            rule: StoragePolicyRule::new(rule_type, rule_value),
            filter,
            transition: StoragePolicyTransition::new(STORAGE_NAME_2),
        }
    }

    /// An age policy with the given filter.
    #[must_use]
    pub fn aged(namespace: &str, name: &str, days: u32, filter: StoragePolicyFilter) -> StoragePolicy {
        Self::with_rule(namespace, name, DAYS_SINCE_BDATA_REGISTERED, days, filter)
    }

    /// Filter matching every record in [`STORAGE_NAME`].
    #[must_use]
    pub fn storage_only() -> StoragePolicyFilter {
        StoragePolicyFilter::for_storage(STORAGE_NAME)
    }

    /// Filter on the default business object definition.
    #[must_use]
    pub fn definition_only() -> StoragePolicyFilter {
        Self::storage_only().with_definition(BDEF_NAMESPACE, BDEF_NAME)
    }

    /// Filter on the default format usage and file type.
    #[must_use]
    pub fn format_only() -> StoragePolicyFilter {
        Self::storage_only().with_format(FORMAT_USAGE, FORMAT_FILE_TYPE)
    }

    /// Filter on every optional field.
    #[must_use]
    pub fn full() -> StoragePolicyFilter {
        Self::definition_only().with_format(FORMAT_USAGE, FORMAT_FILE_TYPE)
    }
}

/// An in-memory catalog plus in-memory queues wired for selector tests.
pub struct TestCatalog {
    /// Shared catalog.
    pub catalog: Arc<InMemoryCatalog>,
    /// Queues; [`QUEUE_NAME`] is known.
    pub queues: Arc<InMemoryQueues>,
}

impl TestCatalog {
    /// Creates an empty catalog with [`QUEUE_NAME`] registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalog::new()),
            queues: Arc::new(InMemoryQueues::new([QUEUE_NAME])),
        }
    }

    /// Registers a policy.
    pub fn add_policy(&self, policy: &StoragePolicy) -> StoragePolicy {
        self.catalog
            .create_storage_policy(policy)
            .expect("policy registers")
    }

    /// Registers a record.
    pub fn add_record(&self, record: &CatalogRecord) -> CatalogRecord {
        self.catalog.register_record(record).expect("record registers")
    }

    /// Makes registered data `offset_days` older (negative values make it younger).
    pub fn age_record(&self, key: &CatalogRecordKey, offset_days: i64) {
        let snapshot = herd_catalog::CatalogSource::snapshot(self.catalog.as_ref())
            .expect("snapshot");
        let created_on = snapshot
            .records
            .iter()
            .find(|r| r.key.matches(key))
            .map(|r| r.created_on)
            .expect("record registered");
        self.catalog
            .set_created_on(key, created_on - TimeDelta::days(offset_days))
            .expect("record back-dated");
    }

    /// A selector over this catalog and its queues.
    #[must_use]
    pub fn selector(&self) -> StoragePolicySelector<Arc<InMemoryCatalog>, Arc<InMemoryQueues>> {
        StoragePolicySelector::new(Arc::clone(&self.catalog), Arc::clone(&self.queues))
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}
