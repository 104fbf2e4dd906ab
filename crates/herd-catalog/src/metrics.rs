//! Storage policy selector metrics.
//!
//! These complement the structured logging emitted by the selector and job.

use metrics::{counter, describe_counter, describe_histogram, histogram};

// ============================================================================
// Selector Metrics
// ============================================================================

/// Selector runs, labelled by outcome.
pub const SELECTOR_RUNS: &str = "herd_storage_policy_selector_runs_total";

/// Selections returned by the selector.
pub const SELECTIONS: &str = "herd_storage_policy_selections_total";

/// Selector run duration histogram.
pub const SELECTOR_DURATION: &str = "herd_storage_policy_selector_duration_seconds";

/// Selection messages published by the selector job.
pub const MESSAGES_PUBLISHED: &str = "herd_storage_policy_selection_messages_published_total";

// ============================================================================
// Metric Registration
// ============================================================================

/// Registers all selector metric descriptions.
///
/// Without an installed recorder the descriptions are discarded.
pub fn register_metrics() {
    describe_counter!(SELECTOR_RUNS, "Total storage policy selector runs");
    describe_counter!(SELECTIONS, "Total storage policy selections returned");
    describe_histogram!(
        SELECTOR_DURATION,
        "Duration of storage policy selector runs in seconds"
    );
    describe_counter!(
        MESSAGES_PUBLISHED,
        "Total storage policy selection messages published"
    );
}

// ============================================================================
// Recording
// ============================================================================

/// Outcome label of a selector run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run returned a (possibly empty) selection list.
    Success,
    /// The run aborted on a configuration error.
    ConfigurationError,
    /// The run failed for another reason.
    Error,
}

impl RunOutcome {
    /// Label value for this outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ConfigurationError => "configuration_error",
            Self::Error => "error",
        }
    }
}

/// Records the completion of a selector run.
pub fn record_selector_run(outcome: RunOutcome, selections: usize, duration_secs: f64) {
    counter!(SELECTOR_RUNS, "outcome" => outcome.as_str()).increment(1);
    counter!(SELECTIONS).increment(selections as u64);
    histogram!(SELECTOR_DURATION, "outcome" => outcome.as_str()).record(duration_secs);
}

/// Records messages published to a queue.
pub fn record_messages_published(queue_name: &str, count: usize) {
    counter!(MESSAGES_PUBLISHED, "queue" => queue_name.to_string()).increment(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        register_metrics();
        record_selector_run(RunOutcome::Success, 3, 0.01);
        record_messages_published("queue", 3);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(RunOutcome::Success.as_str(), "success");
        assert_eq!(
            RunOutcome::ConfigurationError.as_str(),
            "configuration_error"
        );
        assert_eq!(RunOutcome::Error.as_str(), "error");
    }
}
