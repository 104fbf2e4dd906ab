//! The storage policy selector job.
//!
//! One run selects data due for transition and publishes a
//! [`StoragePolicySelection`](crate::selection::StoragePolicySelection)
//! message per selection to the configured queue. Downstream processors
//! consume those messages and perform the actual transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::channel::{ChannelRegistry, SelectionPublisher};
use crate::config::SelectorConfig;
use crate::error::{CatalogError, Result};
use crate::metrics::record_messages_published;
use crate::selector::StoragePolicySelector;
use crate::source::CatalogSource;

/// Summary of one job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// Queue the messages were sent to.
    pub queue_name: String,
    /// Number of selections made.
    pub selected: usize,
    /// Number of messages published.
    pub published: usize,
}

/// Runs the selector and publishes its output.
///
/// `Q` is both the channel registry the selector validates against and the
/// publisher messages are sent through, so the two always agree on which
/// queues exist.
#[derive(Debug)]
pub struct StoragePolicySelectorJob<S, Q> {
    selector: StoragePolicySelector<S, Arc<Q>>,
    queues: Arc<Q>,
    config: SelectorConfig,
}

impl<S, Q> StoragePolicySelectorJob<S, Q>
where
    S: CatalogSource,
    Q: ChannelRegistry + SelectionPublisher,
{
    /// Creates a job.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(source: S, queues: Arc<Q>, config: SelectorConfig) -> Result<Self> {
        config.validate()?;
        let selector = StoragePolicySelector::new(source, Arc::clone(&queues))
            .with_eligibility(config.eligibility.clone());
        Ok(Self {
            selector,
            queues,
            config,
        })
    }

    /// Returns the underlying selector.
    pub fn selector(&self) -> &StoragePolicySelector<S, Arc<Q>> {
        &self.selector
    }

    /// Runs the job at the current time.
    ///
    /// # Errors
    ///
    /// See [`StoragePolicySelectorJob::run_at`].
    pub fn run(&self) -> Result<JobReport> {
        self.run_at(Utc::now())
    }

    /// Runs the job as of `now`.
    ///
    /// # Errors
    ///
    /// Returns any selection error, in which case nothing is published. A
    /// publish failure stops the run; messages sent before it stay sent.
    pub fn run_at(&self, now: DateTime<Utc>) -> Result<JobReport> {
        let queue_name = self.config.queue_name.as_str();
        let selections = self
            .selector
            .execute_at(queue_name, self.config.max_results, now)?;
        let channel = self.queues.resolve(queue_name)?;

        let mut published = 0;
        let result = selections.iter().try_for_each(|selection| {
            let payload = selection.to_message()?;
            self.queues.publish(&channel, &payload)?;
            debug!(%selection, "published storage policy selection");
            published += 1;
            Ok::<(), CatalogError>(())
        });
        record_messages_published(&channel.queue_name, published);
        result?;

        info!(
            queue = %channel.queue_name,
            selected = selections.len(),
            published,
            "storage policy selector job complete"
        );
        Ok(JobReport {
            queue_name: channel.queue_name,
            selected: selections.len(),
            published,
        })
    }
}
