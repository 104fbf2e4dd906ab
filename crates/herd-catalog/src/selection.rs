//! The unit of output of a selection run and its queue message encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

use herd_core::{CatalogRecordKey, Error, StoragePolicyKey};

use crate::error::Result;

/// A record chosen for transition together with the policy that claimed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePolicySelection {
    /// Selected business object data.
    pub business_object_data_key: CatalogRecordKey,
    /// Policy that claimed it.
    pub storage_policy_key: StoragePolicyKey,
}

impl StoragePolicySelection {
    /// Creates a selection.
    #[must_use]
    pub fn new(business_object_data_key: CatalogRecordKey, storage_policy_key: StoragePolicyKey) -> Self {
        Self {
            business_object_data_key,
            storage_policy_key,
        }
    }

    /// Encodes the selection as the JSON payload sent to the delivery queue.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_message(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::serialization("failed to encode storage policy selection", e).into())
    }

    /// Decodes and validates a queue payload.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON and an invalid key
    /// error if either key fails validation.
    pub fn from_message(payload: &str) -> Result<Self> {
        let decoded: Self = serde_json::from_str(payload)
            .map_err(|e| Error::serialization("failed to decode storage policy selection", e))?;
        Ok(Self {
            business_object_data_key: decoded.business_object_data_key.normalized()?,
            storage_policy_key: decoded.storage_policy_key.normalized()?,
        })
    }
}

impl fmt::Display for StoragePolicySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "business object data: {{{}}}, storage policy: {{{}}}",
            self.business_object_data_key, self.storage_policy_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    fn selection() -> StoragePolicySelection {
        StoragePolicySelection::new(
            CatalogRecordKey {
                namespace: "NS".into(),
                business_object_definition_name: "trades".into(),
                business_object_format_usage: "PRC".into(),
                business_object_format_file_type: "TXT".into(),
                business_object_format_version: 1,
                partition_value: "2024-01-01".into(),
                sub_partition_values: vec!["east".into()],
                business_object_data_version: 0,
            },
            StoragePolicyKey::new("NS", "policy").unwrap(),
        )
    }

    #[test]
    fn message_uses_wire_field_names() {
        let message = selection().to_message().unwrap();
        let json: serde_json::Value = serde_json::from_str(&message).unwrap();
        assert_eq!(
            json["businessObjectDataKey"]["businessObjectFormatVersion"],
            1
        );
        assert_eq!(json["businessObjectDataKey"]["subPartitionValues"][0], "east");
        assert_eq!(json["storagePolicyKey"]["storagePolicyName"], "policy");
    }

    #[test]
    fn from_message_accepts_herd_payload() {
        let payload = r#"{
            "businessObjectDataKey": {
                "namespace": "NS",
                "businessObjectDefinitionName": "trades",
                "businessObjectFormatUsage": "PRC",
                "businessObjectFormatFileType": "TXT",
                "businessObjectFormatVersion": 1,
                "partitionValue": "2024-01-01",
                "subPartitionValues": ["east"],
                "businessObjectDataVersion": 0
            },
            "storagePolicyKey": {"namespace": " NS ", "storagePolicyName": "policy"}
        }"#;
        assert_eq!(StoragePolicySelection::from_message(payload).unwrap(), selection());
    }

    #[test]
    fn from_message_rejects_blank_keys() {
        let mut invalid = selection();
        invalid.storage_policy_key.storage_policy_name = " ".into();
        let payload = serde_json::to_string(&invalid).unwrap();
        let err = StoragePolicySelection::from_message(&payload).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Core(Error::InvalidKey { .. })
        ));
    }

    #[test]
    fn from_message_rejects_malformed_json() {
        let err = StoragePolicySelection::from_message("{not json").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Core(Error::Serialization { .. })
        ));
    }

    #[test]
    fn display_wraps_both_keys() {
        let text = selection().to_string();
        assert!(text.starts_with("business object data: {namespace: \"NS\""));
        assert!(text.ends_with("storage policy: {namespace: \"NS\", storagePolicyName: \"policy\"}"));
    }
}
