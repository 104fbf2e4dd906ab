//! Registered business object data and the storage unit it lives in.
//!
//! A [`CatalogRecord`] is one row the selector scans: a business object data
//! key, the data's status, when it was registered, and one storage unit.
//! Data registered in several storages shows up as several records sharing a
//! key.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use herd_core::keys::{CatalogRecordKey, codes_equal, required_part};

use crate::error::Result;

/// Well-known business object data status codes.
pub mod data_status {
    /// Data is registered and usable.
    pub const VALID: &str = "VALID";
    /// Data was registered but later marked unusable.
    pub const INVALID: &str = "INVALID";
    /// Data was superseded by a newer version.
    pub const EXPIRED: &str = "EXPIRED";
    /// Data registration has not completed yet.
    pub const UPLOADING: &str = "UPLOADING";
}

/// Well-known storage unit status codes.
pub mod storage_unit_status {
    /// The storage unit is live and readable.
    pub const ENABLED: &str = "ENABLED";
    /// The storage unit was disabled by an operator.
    pub const DISABLED: &str = "DISABLED";
    /// A transition out of this storage is in progress.
    pub const ARCHIVING: &str = "ARCHIVING";
    /// The storage unit has been transitioned.
    pub const ARCHIVED: &str = "ARCHIVED";
}

/// Where a record's files currently live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUnit {
    /// Storage name.
    pub storage_name: String,
    /// Storage unit status code.
    pub status: String,
}

impl StorageUnit {
    /// Creates an enabled storage unit in the named storage.
    #[must_use]
    pub fn enabled(storage_name: impl Into<String>) -> Self {
        Self {
            storage_name: storage_name.into(),
            status: storage_unit_status::ENABLED.to_string(),
        }
    }
}

/// Business object data together with one of its storage units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    /// Business object data key.
    #[serde(rename = "businessObjectDataKey")]
    pub key: CatalogRecordKey,
    /// Business object data status code.
    pub status: String,
    /// When the data was registered.
    pub created_on: DateTime<Utc>,
    /// The storage unit this row describes.
    pub storage_unit: StorageUnit,
}

impl CatalogRecord {
    /// Creates a record after validating the key and storage unit.
    ///
    /// # Errors
    ///
    /// Returns an error if a key part, the status, or the storage name is blank.
    pub fn new(
        key: &CatalogRecordKey,
        status: &str,
        created_on: DateTime<Utc>,
        storage_unit: &StorageUnit,
    ) -> Result<Self> {
        Ok(Self {
            key: key.normalized()?,
            status: required_part("business object data status", status)?,
            created_on,
            storage_unit: StorageUnit {
                storage_name: required_part("storage name", &storage_unit.storage_name)?,
                status: required_part("storage unit status", &storage_unit.status)?,
            },
        })
    }

    /// Re-validates a record loaded from untrusted input.
    ///
    /// # Errors
    ///
    /// Returns an error if a key part, the status, or the storage name is blank.
    pub fn normalized(&self) -> Result<Self> {
        Self::new(&self.key, &self.status, self.created_on, &self.storage_unit)
    }

    /// Time elapsed since registration at `now`.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.created_on)
    }

    /// Returns true if this row's storage unit is in the named storage.
    #[must_use]
    pub fn is_in_storage(&self, storage_name: &str) -> bool {
        codes_equal(&self.storage_unit.storage_name, storage_name)
    }
}
