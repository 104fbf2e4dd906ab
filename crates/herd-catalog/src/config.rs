//! Storage policy selector configuration.

use serde::{Deserialize, Serialize};

use herd_core::Error;
use herd_core::keys::codes_equal;

use crate::error::Result;
use crate::record::{CatalogRecord, data_status};

/// Default cap on selections returned by one run.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Default destination queue for selection messages.
pub const DEFAULT_QUEUE_NAME: &str = "herd-storage-policy-selector";

/// Which records are available for transition at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    /// Business object data statuses that may be transitioned.
    pub data_statuses: Vec<String>,
    /// Storage unit statuses that may be transitioned.
    ///
    /// Empty means any storage unit status.
    #[serde(default)]
    pub storage_unit_statuses: Vec<String>,
}

impl Default for Eligibility {
    fn default() -> Self {
        Self {
            data_statuses: vec![data_status::VALID.to_string()],
            storage_unit_statuses: Vec::new(),
        }
    }
}

impl Eligibility {
    /// Returns true if the data status is in the configured set and the
    /// storage unit status is too, when that set is restricted.
    #[must_use]
    pub fn accepts(&self, record: &CatalogRecord) -> bool {
        self.data_statuses
            .iter()
            .any(|s| codes_equal(s, &record.status))
            && (self.storage_unit_statuses.is_empty()
                || self
                    .storage_unit_statuses
                    .iter()
                    .any(|s| codes_equal(s, &record.storage_unit.status)))
    }
}

/// Configuration for the storage policy selector job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorConfig {
    /// Queue selection messages are delivered to.
    pub queue_name: String,

    /// Maximum selections per run.
    ///
    /// Default: 1000.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Queues the static channel registry knows about.
    ///
    /// When empty, only `queue_name` is known.
    #[serde(default)]
    pub known_queues: Vec<String>,

    /// Record eligibility rules.
    #[serde(default)]
    pub eligibility: Eligibility,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            known_queues: Vec::new(),
            eligibility: Eligibility::default(),
        }
    }
}

impl SelectorConfig {
    /// Loads configuration from `HERD_*` environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `HERD_STORAGE_POLICY_SELECTOR_QUEUE_NAME` | `queue_name` |
    /// | `HERD_STORAGE_POLICY_SELECTOR_MAX_RESULTS` | `max_results` |
    /// | `HERD_KNOWN_QUEUES` | `known_queues` (comma separated) |
    /// | `HERD_STORAGE_POLICY_ELIGIBLE_DATA_STATUSES` | `eligibility.data_statuses` |
    /// | `HERD_STORAGE_POLICY_ELIGIBLE_STORAGE_UNIT_STATUSES` | `eligibility.storage_unit_statuses` |
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the result fails
    /// [`SelectorConfig::validate`].
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`SelectorConfig::from_env`].
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| {
            lookup(name).and_then(|v| {
                let trimmed = v.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
        };

        let mut config = Self::default();
        if let Some(queue_name) = var("HERD_STORAGE_POLICY_SELECTOR_QUEUE_NAME") {
            config.queue_name = queue_name;
        }
        if let Some(max_results) = var("HERD_STORAGE_POLICY_SELECTOR_MAX_RESULTS") {
            config.max_results = max_results.parse::<usize>().map_err(|e| {
                Error::InvalidInput(format!(
                    "HERD_STORAGE_POLICY_SELECTOR_MAX_RESULTS must be a usize: {e}"
                ))
            })?;
        }
        if let Some(queues) = var("HERD_KNOWN_QUEUES") {
            config.known_queues = split_list(&queues);
        }
        if let Some(statuses) = var("HERD_STORAGE_POLICY_ELIGIBLE_DATA_STATUSES") {
            config.eligibility.data_statuses = split_list(&statuses);
        }
        if let Some(statuses) = var("HERD_STORAGE_POLICY_ELIGIBLE_STORAGE_UNIT_STATUSES") {
            config.eligibility.storage_unit_statuses = split_list(&statuses);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the queue name is blank, the cap is
    /// zero, or no data status is eligible.
    pub fn validate(&self) -> Result<()> {
        if self.queue_name.trim().is_empty() {
            return Err(Error::InvalidInput("selector queue name must be set".into()).into());
        }
        if self.max_results == 0 {
            return Err(Error::InvalidInput("max results must be at least 1".into()).into());
        }
        if self.eligibility.data_statuses.is_empty() {
            return Err(
                Error::InvalidInput("at least one eligible data status is required".into()).into(),
            );
        }
        Ok(())
    }

    /// Queues the static registry should know: `known_queues`, or just
    /// `queue_name` when none are listed.
    #[must_use]
    pub fn registry_queues(&self) -> Vec<String> {
        if self.known_queues.is_empty() {
            vec![self.queue_name.clone()]
        } else {
            self.known_queues.clone()
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
