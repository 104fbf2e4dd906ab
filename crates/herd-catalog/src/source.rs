//! Catalog snapshots and the in-memory catalog.
//!
//! The selector never talks to a database directly. It asks a
//! [`CatalogSource`] for one consistent [`CatalogSnapshot`] of policies and
//! records and works on that. [`InMemoryCatalog`] is the reference source: it
//! holds registered policies and records behind an `RwLock` and supports the
//! administrative storage policy operations.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use herd_core::keys::{codes_equal, required_part};
use herd_core::observability::catalog_span;
use herd_core::{CatalogRecordKey, Error, StoragePolicyKey};

use crate::error::{CatalogError, Result};
use crate::policy::StoragePolicy;
use crate::record::CatalogRecord;

/// A point-in-time view of registered storage policies and catalog records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    /// Registered storage policies.
    #[serde(default)]
    pub storage_policies: Vec<StoragePolicy>,
    /// Registered business object data rows, one per storage unit.
    #[serde(default)]
    pub records: Vec<CatalogRecord>,
}

impl CatalogSnapshot {
    /// Parses a snapshot from JSON, validating every policy and record.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON, or the validation
    /// error of the first invalid policy or record.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Self = serde_json::from_str(json)
            .map_err(|e| Error::serialization("failed to parse catalog snapshot", e))?;

        let storage_policies = raw
            .storage_policies
            .iter()
            .map(StoragePolicy::normalized)
            .collect::<Result<Vec<_>>>()?;
        let records = raw
            .records
            .iter()
            .map(CatalogRecord::normalized)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            storage_policies,
            records,
        })
    }
}

/// Source of catalog snapshots for the selector.
pub trait CatalogSource: Send + Sync {
    /// Returns a consistent snapshot of all storage policies and records.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn snapshot(&self) -> Result<CatalogSnapshot>;
}

impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    fn snapshot(&self) -> Result<CatalogSnapshot> {
        (**self).snapshot()
    }
}

impl CatalogSource for CatalogSnapshot {
    fn snapshot(&self) -> Result<CatalogSnapshot> {
        Ok(self.clone())
    }
}

/// In-memory catalog.
///
/// Thread-safe via `RwLock`. Storage policy and record keys are unique under
/// case-insensitive comparison, the same way herd looks them up.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogSnapshot>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog seeded from a snapshot, registering each entry in turn.
    ///
    /// # Errors
    ///
    /// Returns the first validation or duplicate-key error encountered.
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Result<Self> {
        let catalog = Self::new();
        for policy in &snapshot.storage_policies {
            catalog.create_storage_policy(policy)?;
        }
        for record in &snapshot.records {
            catalog.register_record(record)?;
        }
        Ok(catalog)
    }

    /// Registers a new storage policy.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidPolicy`] if validation fails and
    /// [`CatalogError::AlreadyExists`] if a policy with the same key exists.
    pub fn create_storage_policy(&self, policy: &StoragePolicy) -> Result<StoragePolicy> {
        let policy = policy.normalized()?;
        let _span = catalog_span("create_storage_policy", &policy.key.to_string()).entered();

        let mut state = self.write()?;
        if state.storage_policies.iter().any(|p| p.key.matches(&policy.key)) {
            return Err(CatalogError::AlreadyExists {
                message: format!("storage policy with {{{}}} already exists", policy.key),
            });
        }

        state.storage_policies.push(policy.clone());
        info!(storage_policy = %policy.key, "created storage policy");
        Ok(policy)
    }

    /// Looks up a storage policy by key.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no policy has the key.
    pub fn get_storage_policy(&self, key: &StoragePolicyKey) -> Result<StoragePolicy> {
        let state = self.read()?;
        state
            .storage_policies
            .iter()
            .find(|p| p.key.matches(key))
            .cloned()
            .ok_or_else(|| policy_not_found(key))
    }

    /// Replaces the rule, filter, and transition of an existing policy.
    ///
    /// The stored key keeps its original casing.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidPolicy`] if validation fails and
    /// [`CatalogError::NotFound`] if no policy has the key.
    pub fn update_storage_policy(&self, policy: &StoragePolicy) -> Result<StoragePolicy> {
        let policy = policy.normalized()?;
        let _span = catalog_span("update_storage_policy", &policy.key.to_string()).entered();

        let mut state = self.write()?;
        let existing = state
            .storage_policies
            .iter_mut()
            .find(|p| p.key.matches(&policy.key))
            .ok_or_else(|| policy_not_found(&policy.key))?;

        existing.rule = policy.rule;
        existing.filter = policy.filter;
        existing.transition = policy.transition;
        info!(storage_policy = %existing.key, "updated storage policy");
        Ok(existing.clone())
    }

    /// Removes a storage policy and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no policy has the key.
    pub fn delete_storage_policy(&self, key: &StoragePolicyKey) -> Result<StoragePolicy> {
        let mut state = self.write()?;
        let index = state
            .storage_policies
            .iter()
            .position(|p| p.key.matches(key))
            .ok_or_else(|| policy_not_found(key))?;

        let removed = state.storage_policies.remove(index);
        info!(storage_policy = %removed.key, "deleted storage policy");
        Ok(removed)
    }

    /// Lists the keys of all registered storage policies in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog lock is poisoned.
    pub fn storage_policy_keys(&self) -> Result<Vec<StoragePolicyKey>> {
        let state = self.read()?;
        Ok(state.storage_policies.iter().map(|p| p.key.clone()).collect())
    }

    /// Registers business object data in one storage.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid record and
    /// [`CatalogError::AlreadyExists`] if the data already has a storage unit
    /// in that storage.
    pub fn register_record(&self, record: &CatalogRecord) -> Result<CatalogRecord> {
        let record = record.normalized()?;

        let mut state = self.write()?;
        if state.records.iter().any(|r| {
            r.key.matches(&record.key) && r.is_in_storage(&record.storage_unit.storage_name)
        }) {
            return Err(CatalogError::AlreadyExists {
                message: format!(
                    "business object data {{{}}} already has a storage unit in \"{}\"",
                    record.key, record.storage_unit.storage_name
                ),
            });
        }

        state.records.push(record.clone());
        debug!(business_object_data = %record.key, storage = %record.storage_unit.storage_name, "registered record");
        Ok(record)
    }

    /// Changes the status of the storage unit the data has in `storage_name`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if there is no such storage unit.
    pub fn update_storage_unit_status(
        &self,
        key: &CatalogRecordKey,
        storage_name: &str,
        status: &str,
    ) -> Result<CatalogRecord> {
        let status = required_part("storage unit status", status)?;

        let mut state = self.write()?;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.key.matches(key) && codes_equal(&r.storage_unit.storage_name, storage_name))
            .ok_or_else(|| CatalogError::NotFound {
                message: format!(
                    "storage unit for business object data {{{key}}} in storage \"{storage_name}\""
                ),
            })?;

        record.storage_unit.status = status;
        Ok(record.clone())
    }

    /// Overrides the registration time of every row of the given data.
    ///
    /// Used to back-date data when replaying or testing retention.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if the data is not registered.
    pub fn set_created_on(&self, key: &CatalogRecordKey, created_on: DateTime<Utc>) -> Result<()> {
        let mut state = self.write()?;
        let mut found = false;
        for record in state.records.iter_mut().filter(|r| r.key.matches(key)) {
            record.created_on = created_on;
            found = true;
        }

        if found {
            Ok(())
        } else {
            Err(Error::resource_not_found("business object data", key).into())
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CatalogSnapshot>> {
        self.state.read().map_err(|_| lock_poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogSnapshot>> {
        self.state.write().map_err(|_| lock_poisoned())
    }
}

impl CatalogSource for InMemoryCatalog {
    fn snapshot(&self) -> Result<CatalogSnapshot> {
        Ok(self.read()?.clone())
    }
}

fn policy_not_found(key: &StoragePolicyKey) -> CatalogError {
    CatalogError::NotFound {
        message: format!("storage policy with {{{key}}}"),
    }
}

fn lock_poisoned() -> CatalogError {
    Error::Internal {
        message: "catalog lock poisoned".into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::policy::{StoragePolicyFilter, StoragePolicyRule, StoragePolicyTransition};
    use crate::record::{StorageUnit, data_status, storage_unit_status};

    fn policy(name: &str) -> StoragePolicy {
        StoragePolicy {
            key: StoragePolicyKey::new("NS", name).unwrap(),
            rule: StoragePolicyRule::days_since_registration(30),
            filter: StoragePolicyFilter::for_storage("S3"),
            transition: StoragePolicyTransition::new("GLACIER"),
        }
    }

    fn record_key() -> CatalogRecordKey {
        CatalogRecordKey {
            namespace: "NS".into(),
            business_object_definition_name: "trades".into(),
            business_object_format_usage: "PRC".into(),
            business_object_format_file_type: "TXT".into(),
            business_object_format_version: 0,
            partition_value: "2024-01-01".into(),
            sub_partition_values: vec![],
            business_object_data_version: 0,
        }
    }

    fn record(storage: &str) -> CatalogRecord {
        CatalogRecord::new(
            &record_key(),
            data_status::VALID,
            Utc::now(),
            &StorageUnit::enabled(storage),
        )
        .unwrap()
    }

    #[test]
    fn create_then_get_storage_policy() {
        let catalog = InMemoryCatalog::new();
        let created = catalog.create_storage_policy(&policy("policy")).unwrap();

        let lookup = StoragePolicyKey::new("ns", "POLICY").unwrap();
        assert_eq!(catalog.get_storage_policy(&lookup).unwrap(), created);
    }

    #[test]
    fn create_rejects_duplicate_key_ignoring_case() {
        let catalog = InMemoryCatalog::new();
        catalog.create_storage_policy(&policy("policy")).unwrap();

        let err = catalog.create_storage_policy(&policy("POLICY")).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { .. }));
    }

    #[test]
    fn create_rejects_invalid_policy() {
        let catalog = InMemoryCatalog::new();
        let mut invalid = policy("policy");
        invalid.filter.storage_name = String::new();
        assert!(matches!(
            catalog.create_storage_policy(&invalid),
            Err(CatalogError::InvalidPolicy { .. })
        ));
        assert!(catalog.storage_policy_keys().unwrap().is_empty());
    }

    #[test]
    fn get_missing_policy_is_not_found() {
        let catalog = InMemoryCatalog::new();
        let err = catalog
            .get_storage_policy(&StoragePolicyKey::new("NS", "missing").unwrap())
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[test]
    fn update_keeps_original_key_casing() {
        let catalog = InMemoryCatalog::new();
        catalog.create_storage_policy(&policy("Policy")).unwrap();

        let mut update = policy("POLICY");
        update.rule = StoragePolicyRule::days_since_registration(60);
        let updated = catalog.update_storage_policy(&update).unwrap();

        assert_eq!(updated.key.storage_policy_name, "Policy");
        assert_eq!(updated.rule.rule_value, 60);
    }

    #[test]
    fn delete_removes_policy() {
        let catalog = InMemoryCatalog::new();
        catalog.create_storage_policy(&policy("a")).unwrap();
        catalog.create_storage_policy(&policy("b")).unwrap();

        catalog
            .delete_storage_policy(&StoragePolicyKey::new("NS", "a").unwrap())
            .unwrap();

        let keys = catalog.storage_policy_keys().unwrap();
        assert_eq!(keys, vec![StoragePolicyKey::new("NS", "b").unwrap()]);
    }

    #[test]
    fn register_record_rejects_second_unit_in_same_storage() {
        let catalog = InMemoryCatalog::new();
        catalog.register_record(&record("S3")).unwrap();
        catalog.register_record(&record("GLACIER")).unwrap();

        let err = catalog.register_record(&record("s3")).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyExists { .. }));
    }

    #[test]
    fn update_storage_unit_status_targets_one_storage() {
        let catalog = InMemoryCatalog::new();
        catalog.register_record(&record("S3")).unwrap();
        catalog.register_record(&record("GLACIER")).unwrap();

        catalog
            .update_storage_unit_status(&record_key(), "S3", storage_unit_status::ARCHIVED)
            .unwrap();

        let snapshot = catalog.snapshot().unwrap();
        let statuses: Vec<_> = snapshot
            .records
            .iter()
            .map(|r| r.storage_unit.status.as_str())
            .collect();
        assert_eq!(statuses, vec!["ARCHIVED", "ENABLED"]);
    }

    #[test]
    fn set_created_on_back_dates_every_row() {
        let catalog = InMemoryCatalog::new();
        catalog.register_record(&record("S3")).unwrap();
        catalog.register_record(&record("GLACIER")).unwrap();

        let when = Utc::now() - TimeDelta::days(400);
        catalog.set_created_on(&record_key(), when).unwrap();

        assert!(
            catalog
                .snapshot()
                .unwrap()
                .records
                .iter()
                .all(|r| r.created_on == when)
        );
    }

    #[test]
    fn set_created_on_unknown_data() {
        let catalog = InMemoryCatalog::new();
        let err = catalog.set_created_on(&record_key(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Core(Error::ResourceNotFound { .. })
        ));
    }

    #[test]
    fn snapshot_from_json_validates_entries() {
        let json = r#"{
            "storagePolicies": [{
                "storagePolicyKey": {"namespace": "NS", "storagePolicyName": "p"},
                "storagePolicyRule": {"storagePolicyRuleType": "DAYS_SINCE_BDATA_REGISTERED", "storagePolicyRuleValue": 5},
                "storagePolicyFilter": {"storageName": "S3"},
                "storagePolicyTransition": {"destinationStorageName": "S3"}
            }]
        }"#;
        let err = CatalogSnapshot::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPolicy { .. }));
    }

    #[test]
    fn from_snapshot_registers_everything() {
        let snapshot = CatalogSnapshot {
            storage_policies: vec![policy("a")],
            records: vec![record("S3")],
        };
        let catalog = InMemoryCatalog::from_snapshot(&snapshot).unwrap();
        assert_eq!(catalog.snapshot().unwrap(), snapshot);
    }
}
