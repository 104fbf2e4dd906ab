//! Custom assertion helpers for selector tests.

use herd_catalog::StoragePolicySelection;

/// Asserts the partition values of the selected data, in order.
///
/// # Panics
///
/// Panics if the selections differ from `expected`.
pub fn assert_selected_partitions(selections: &[StoragePolicySelection], expected: &[&str]) {
    let actual: Vec<&str> = selections
        .iter()
        .map(|s| s.business_object_data_key.partition_value.as_str())
        .collect();
    assert_eq!(
        actual, expected,
        "Expected partitions {expected:?}, but selected {actual:?}"
    );
}

/// Asserts every selection was claimed by the named policy.
///
/// # Panics
///
/// Panics if any selection names a different policy.
pub fn assert_claimed_by(selections: &[StoragePolicySelection], namespace: &str, name: &str) {
    for selection in selections {
        let key = &selection.storage_policy_key;
        assert!(
            key.namespace == namespace && key.storage_policy_name == name,
            "Expected policy {namespace}/{name}, but {} claimed {}",
            key,
            selection.business_object_data_key
        );
    }
}
