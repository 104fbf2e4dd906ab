//! Storage policy selection.
//!
//! The selector decides which registered business object data should be
//! transitioned to another storage and which storage policy claims it:
//!
//! 1. Every registered policy's rule is resolved. A single policy with a rule
//!    type this build cannot apply aborts the whole run.
//! 2. For each record available for transition, the matching policy with the
//!    highest [`FilterPriority`] wins. Equal priorities fall back to the policy
//!    key, compared case-insensitively, smallest first.
//! 3. The record is kept only if it is old enough for the winning policy. A
//!    less specific policy never claims a record that a more specific one
//!    matched, even if the less specific one's threshold is already met.
//! 4. Records that already have a storage unit in the winning policy's
//!    destination storage are skipped.
//! 5. Survivors are ordered oldest first and truncated to the requested cap.
//!
//! Selection is read-only: running it twice over unchanged data yields the
//! same list.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use herd_core::observability::selector_span;
use herd_core::{CatalogRecordKey, Error};

use crate::channel::ChannelRegistry;
use crate::config::Eligibility;
use crate::error::Result;
use crate::metrics::{RunOutcome, record_selector_run};
use crate::policy::{EvaluatedRule, FilterPriority, StoragePolicy};
use crate::record::CatalogRecord;
use crate::selection::StoragePolicySelection;
use crate::source::{CatalogSnapshot, CatalogSource};

/// A policy with its rule resolved and its filter ranked.
#[derive(Debug, Clone, Copy)]
struct RankedPolicy<'a> {
    policy: &'a StoragePolicy,
    rule: EvaluatedRule,
    priority: FilterPriority,
}

/// Selects business object data due for a storage transition.
///
/// # Example
///
/// ```rust
/// use herd_catalog::{InMemoryCatalog, StaticChannelRegistry, StoragePolicySelector};
///
/// let selector = StoragePolicySelector::new(
///     InMemoryCatalog::new(),
///     StaticChannelRegistry::new(["selector-queue"]),
/// );
/// let selections = selector.execute("selector-queue", 100)?;
/// assert!(selections.is_empty());
/// # Ok::<(), herd_catalog::CatalogError>(())
/// ```
#[derive(Debug)]
pub struct StoragePolicySelector<S, R> {
    source: S,
    registry: R,
    eligibility: Eligibility,
}

impl<S: CatalogSource, R: ChannelRegistry> StoragePolicySelector<S, R> {
    /// Creates a selector with the default eligibility rules.
    #[must_use]
    pub fn new(source: S, registry: R) -> Self {
        Self {
            source,
            registry,
            eligibility: Eligibility::default(),
        }
    }

    /// Replaces the eligibility rules.
    #[must_use]
    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// Returns the catalog source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the channel registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Runs a selection for `queue_name` at the current time.
    ///
    /// # Errors
    ///
    /// See [`StoragePolicySelector::execute_at`].
    pub fn execute(
        &self,
        queue_name: &str,
        max_results: usize,
    ) -> Result<Vec<StoragePolicySelection>> {
        self.execute_at(queue_name, max_results, Utc::now())
    }

    /// Runs a selection for `queue_name` as of `now`.
    ///
    /// # Errors
    ///
    /// - [`crate::CatalogError::UnknownChannel`] if the queue does not resolve; no
    ///   policies are read.
    /// - [`crate::CatalogError::UnsupportedPolicyRule`] if any registered policy has
    ///   a rule type this build cannot apply; no selections are returned.
    /// - [`Error::InvalidInput`] if `max_results` is zero.
    /// - Any error reading the catalog snapshot.
    pub fn execute_at(
        &self,
        queue_name: &str,
        max_results: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<StoragePolicySelection>> {
        let _span = selector_span(queue_name, max_results).entered();
        let started = Instant::now();

        let result = self.run(queue_name, max_results, now);

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(selections) => {
                info!(selections = selections.len(), "storage policy selection complete");
                record_selector_run(RunOutcome::Success, selections.len(), elapsed);
            }
            Err(e) if e.is_configuration_error() => {
                error!(error = %e, "storage policy selection aborted on configuration error");
                record_selector_run(RunOutcome::ConfigurationError, 0, elapsed);
            }
            Err(e) => {
                error!(error = %e, "storage policy selection failed");
                record_selector_run(RunOutcome::Error, 0, elapsed);
            }
        }

        result
    }

    fn run(
        &self,
        queue_name: &str,
        max_results: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<StoragePolicySelection>> {
        if max_results == 0 {
            return Err(Error::InvalidInput("max results must be at least 1".into()).into());
        }

        let channel = self.registry.resolve(queue_name)?;
        debug!(address = %channel.address, "resolved destination queue");

        let snapshot = self.source.snapshot()?;
        select_at(&snapshot, max_results, now, &self.eligibility)
    }
}

/// Selects from a snapshot as of `now`, returning at most `max_results` pairs.
///
/// This is the pure core of [`StoragePolicySelector`]; it performs no queue
/// resolution and emits no metrics.
///
/// # Errors
///
/// Returns [`crate::CatalogError::UnsupportedPolicyRule`] if any policy in the
/// snapshot has a rule type this build cannot apply.
pub fn select_at(
    snapshot: &CatalogSnapshot,
    max_results: usize,
    now: DateTime<Utc>,
    eligibility: &Eligibility,
) -> Result<Vec<StoragePolicySelection>> {
    let policies = rank_policies(&snapshot.storage_policies)?;
    debug!(
        policies = policies.len(),
        records = snapshot.records.len(),
        "evaluating storage policies"
    );

    let transitioned: HashSet<(CatalogRecordKey, String)> = snapshot
        .records
        .iter()
        .map(|r| (fold_key(&r.key), r.storage_unit.storage_name.to_ascii_lowercase()))
        .collect();

    let mut candidates: Vec<(&CatalogRecord, &StoragePolicy)> = Vec::new();
    for record in snapshot.records.iter().filter(|r| eligibility.accepts(r)) {
        let Some(winner) = policies.iter().find(|p| p.policy.filter.matches(record)) else {
            continue;
        };

        if !winner.rule.is_satisfied_by(record.created_on, now) {
            debug!(
                business_object_data = %record.key,
                storage_policy = %winner.policy.key,
                "record not old enough for its highest priority storage policy"
            );
            continue;
        }

        let destination = winner
            .policy
            .transition
            .destination_storage_name
            .to_ascii_lowercase();
        if transitioned.contains(&(fold_key(&record.key), destination)) {
            debug!(
                business_object_data = %record.key,
                storage_policy = %winner.policy.key,
                "record already present in destination storage"
            );
            continue;
        }

        candidates.push((record, winner.policy));
    }

    candidates.sort_by(|(a, a_policy), (b, b_policy)| {
        a.created_on
            .cmp(&b.created_on)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a_policy.key.cmp_codes(&b_policy.key))
    });

    let mut seen = HashSet::new();
    let selections = candidates
        .into_iter()
        .map(|(record, policy)| {
            StoragePolicySelection::new(record.key.clone(), policy.key.clone())
        })
        .filter(|selection| seen.insert(selection.clone()))
        .take(max_results)
        .collect();

    Ok(selections)
}

/// Resolves every policy's rule and orders policies highest priority first.
fn rank_policies(policies: &[StoragePolicy]) -> Result<Vec<RankedPolicy<'_>>> {
    let mut ranked = policies
        .iter()
        .map(|policy| {
            Ok(RankedPolicy {
                policy,
                rule: policy.rule.evaluate()?,
                priority: policy.filter.priority(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ranked.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.policy.key.cmp_codes(&b.policy.key))
    });
    Ok(ranked)
}

/// Folds the code-valued parts of a key so that keys equal under
/// [`CatalogRecordKey::matches`] hash equally.
fn fold_key(key: &CatalogRecordKey) -> CatalogRecordKey {
    CatalogRecordKey {
        namespace: key.namespace.to_ascii_lowercase(),
        business_object_definition_name: key.business_object_definition_name.to_ascii_lowercase(),
        business_object_format_usage: key.business_object_format_usage.to_ascii_lowercase(),
        business_object_format_file_type: key.business_object_format_file_type.to_ascii_lowercase(),
        ..key.clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use herd_core::StoragePolicyKey;

    use super::*;
    use crate::channel::StaticChannelRegistry;
    use crate::error::CatalogError;
    use crate::policy::{StoragePolicyFilter, StoragePolicyRule, StoragePolicyTransition};
    use crate::record::{StorageUnit, data_status};

    const QUEUE: &str = "selector-queue";

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn key(partition: &str) -> CatalogRecordKey {
        CatalogRecordKey {
            namespace: "NS".into(),
            business_object_definition_name: "trades".into(),
            business_object_format_usage: "PRC".into(),
            business_object_format_file_type: "TXT".into(),
            business_object_format_version: 0,
            partition_value: partition.into(),
            sub_partition_values: vec![],
            business_object_data_version: 0,
        }
    }

    fn record(partition: &str, age_days: i64) -> CatalogRecord {
        CatalogRecord::new(
            &key(partition),
            data_status::VALID,
            now() - TimeDelta::days(age_days),
            &StorageUnit::enabled("S3"),
        )
        .unwrap()
    }

    fn policy(name: &str, days: u32, filter: StoragePolicyFilter) -> StoragePolicy {
        StoragePolicy {
            key: StoragePolicyKey::new("NS", name).unwrap(),
            rule: StoragePolicyRule::days_since_registration(days),
            filter,
            transition: StoragePolicyTransition::new("GLACIER"),
        }
    }

    fn select(snapshot: &CatalogSnapshot, max: usize) -> Vec<StoragePolicySelection> {
        select_at(snapshot, max, now(), &Eligibility::default()).unwrap()
    }

    #[test]
    fn selects_old_enough_record() {
        let snapshot = CatalogSnapshot {
            storage_policies: vec![policy("p", 10, StoragePolicyFilter::for_storage("S3"))],
            records: vec![record("a", 11)],
        };
        let selections = select(&snapshot, 10);
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].storage_policy_key.storage_policy_name, "p");
    }

    #[test]
    fn record_in_other_storage_is_ignored() {
        let mut other = record("a", 11);
        other.storage_unit.storage_name = "OTHER".into();
        let snapshot = CatalogSnapshot {
            storage_policies: vec![policy("p", 10, StoragePolicyFilter::for_storage("S3"))],
            records: vec![other],
        };
        assert!(select(&snapshot, 10).is_empty());
    }

    #[test]
    fn more_specific_policy_pre_empts_even_when_too_young() {
        let snapshot = CatalogSnapshot {
            storage_policies: vec![
                policy("wide", 1, StoragePolicyFilter::for_storage("S3")),
                policy(
                    "narrow",
                    30,
                    StoragePolicyFilter::for_storage("S3").with_format("PRC", "TXT"),
                ),
            ],
            records: vec![record("a", 5)],
        };
        assert!(select(&snapshot, 10).is_empty());
    }

    #[test]
    fn equal_priority_falls_back_to_policy_key() {
        let snapshot = CatalogSnapshot {
            storage_policies: vec![
                policy("b", 1, StoragePolicyFilter::for_storage("S3")),
                policy("A", 1, StoragePolicyFilter::for_storage("S3")),
            ],
            records: vec![record("a", 5)],
        };
        let selections = select(&snapshot, 10);
        assert_eq!(selections[0].storage_policy_key.storage_policy_name, "A");
    }

    #[test]
    fn record_already_in_destination_is_skipped() {
        let mut archived = record("a", 20);
        archived.storage_unit = StorageUnit::enabled("glacier");
        let snapshot = CatalogSnapshot {
            storage_policies: vec![policy("p", 10, StoragePolicyFilter::for_storage("S3"))],
            records: vec![record("a", 20), archived, record("b", 20)],
        };
        let selections = select(&snapshot, 10);
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].business_object_data_key.partition_value, "b");
    }

    #[test]
    fn ineligible_status_is_ignored() {
        let mut invalid = record("a", 20);
        invalid.status = data_status::INVALID.into();
        let snapshot = CatalogSnapshot {
            storage_policies: vec![policy("p", 10, StoragePolicyFilter::for_storage("S3"))],
            records: vec![invalid],
        };
        assert!(select(&snapshot, 10).is_empty());
    }

    #[test]
    fn results_are_oldest_first_and_capped() {
        let snapshot = CatalogSnapshot {
            storage_policies: vec![policy("p", 10, StoragePolicyFilter::for_storage("S3"))],
            records: vec![record("young", 11), record("old", 40), record("mid", 20)],
        };
        let partitions: Vec<_> = select(&snapshot, 2)
            .into_iter()
            .map(|s| s.business_object_data_key.partition_value)
            .collect();
        assert_eq!(partitions, vec!["old", "mid"]);
    }

    #[test]
    fn duplicate_rows_are_selected_once() {
        let snapshot = CatalogSnapshot {
            storage_policies: vec![policy("p", 10, StoragePolicyFilter::for_storage("S3"))],
            records: vec![record("a", 20), record("a", 20)],
        };
        assert_eq!(select(&snapshot, 10).len(), 1);
    }

    #[test]
    fn unsupported_rule_fails_whole_run() {
        let mut bad = policy("bad", 10, StoragePolicyFilter::for_storage("OTHER"));
        bad.rule = StoragePolicyRule::new("SIZE_IN_BYTES", 1);
        let snapshot = CatalogSnapshot {
            storage_policies: vec![policy("p", 10, StoragePolicyFilter::for_storage("S3")), bad],
            records: vec![record("a", 20)],
        };
        let err = select_at(&snapshot, 10, now(), &Eligibility::default()).unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedPolicyRule { .. }));
    }

    #[test]
    fn selector_rejects_unknown_queue_before_reading_policies() {
        struct FailingSource;
        impl CatalogSource for FailingSource {
            fn snapshot(&self) -> Result<CatalogSnapshot> {
                panic!("snapshot must not be read for an unknown queue");
            }
        }

        let selector = StoragePolicySelector::new(FailingSource, StaticChannelRegistry::new([QUEUE]));
        let err = selector.execute_at("unknown", 10, now()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownChannel { queue_name } if queue_name == "unknown"));
    }

    #[test]
    fn selector_rejects_zero_max_results() {
        let selector = StoragePolicySelector::new(
            CatalogSnapshot::default(),
            StaticChannelRegistry::new([QUEUE]),
        );
        let err = selector.execute_at(QUEUE, 0, now()).unwrap_err();
        assert!(matches!(err, CatalogError::Core(Error::InvalidInput(_))));
    }

    #[test]
    fn custom_eligibility_admits_other_statuses() {
        let mut invalid = record("a", 20);
        invalid.status = data_status::INVALID.into();
        let snapshot = CatalogSnapshot {
            storage_policies: vec![policy("p", 10, StoragePolicyFilter::for_storage("S3"))],
            records: vec![invalid],
        };
        let selector = StoragePolicySelector::new(snapshot, StaticChannelRegistry::new([QUEUE]))
            .with_eligibility(Eligibility {
                data_statuses: vec!["VALID".into(), "INVALID".into()],
                ..Eligibility::default()
            });
        assert_eq!(selector.execute_at(QUEUE, 10, now()).unwrap().len(), 1);
    }
}
