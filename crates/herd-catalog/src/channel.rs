//! Delivery channels for selection messages.
//!
//! The selector only needs to know that its destination queue exists; the job
//! that acts on selections also publishes to it. Both concerns sit behind
//! small traits so that a real message broker and the in-memory queues used
//! in tests and the CLI are interchangeable.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use herd_core::Error;

use crate::error::{CatalogError, Result};

/// A resolved delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Queue name as configured.
    pub queue_name: String,
    /// Broker-specific address of the queue.
    pub address: String,
}

/// Resolves queue identities to delivery channels.
pub trait ChannelRegistry: Send + Sync {
    /// Resolves a queue name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownChannel`] if the queue is not known.
    fn resolve(&self, queue_name: &str) -> Result<Channel>;
}

/// Sends encoded selection messages to a channel.
pub trait SelectionPublisher: Send + Sync {
    /// Publishes one message.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Publish`] if the broker rejects the message.
    fn publish(&self, channel: &Channel, payload: &str) -> Result<()>;
}

impl<T: ChannelRegistry + ?Sized> ChannelRegistry for Arc<T> {
    fn resolve(&self, queue_name: &str) -> Result<Channel> {
        (**self).resolve(queue_name)
    }
}

impl<T: SelectionPublisher + ?Sized> SelectionPublisher for Arc<T> {
    fn publish(&self, channel: &Channel, payload: &str) -> Result<()> {
        (**self).publish(channel, payload)
    }
}

/// A registry over a fixed list of queue names.
#[derive(Debug, Clone, Default)]
pub struct StaticChannelRegistry {
    queues: Vec<String>,
}

impl StaticChannelRegistry {
    /// Creates a registry that knows the given queues.
    ///
    /// Names are trimmed; blank names are ignored.
    #[must_use]
    pub fn new<I, S>(queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queues: queue_names(queues),
        }
    }
}

impl ChannelRegistry for StaticChannelRegistry {
    fn resolve(&self, queue_name: &str) -> Result<Channel> {
        resolve_in(&self.queues, queue_name)
    }
}

/// In-memory queues that record every published message.
///
/// Publishing to a queue listed with [`InMemoryQueues::fail_publishes_to`]
/// fails, which lets callers exercise broker errors.
#[derive(Debug, Default)]
pub struct InMemoryQueues {
    queues: Vec<String>,
    failing: Vec<String>,
    messages: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryQueues {
    /// Creates in-memory queues with the given names, trimmed.
    #[must_use]
    pub fn new<I, S>(queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queues: queue_names(queues),
            ..Self::default()
        }
    }

    /// Makes every publish to `queue_name` fail.
    #[must_use]
    pub fn fail_publishes_to(mut self, queue_name: impl Into<String>) -> Self {
        self.failing.push(queue_name.into());
        self
    }

    /// Returns the messages published to a queue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the message lock is poisoned.
    pub fn messages(&self, queue_name: &str) -> Result<Vec<String>> {
        let messages = self.messages.read().map_err(|_| lock_poisoned())?;
        Ok(messages.get(queue_name).cloned().unwrap_or_default())
    }
}

impl ChannelRegistry for InMemoryQueues {
    fn resolve(&self, queue_name: &str) -> Result<Channel> {
        resolve_in(&self.queues, queue_name)
    }
}

impl SelectionPublisher for InMemoryQueues {
    fn publish(&self, channel: &Channel, payload: &str) -> Result<()> {
        if self.failing.iter().any(|q| *q == channel.queue_name) {
            return Err(CatalogError::Publish {
                queue_name: channel.queue_name.clone(),
                message: "queue rejected the message".into(),
            });
        }

        let mut messages = self.messages.write().map_err(|_| lock_poisoned())?;
        messages
            .entry(channel.queue_name.clone())
            .or_default()
            .push(payload.to_string());
        Ok(())
    }
}

fn queue_names<I, S>(queues: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    queues
        .into_iter()
        .map(Into::into)
        .filter_map(|q| {
            let trimmed = q.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

fn resolve_in(queues: &[String], queue_name: &str) -> Result<Channel> {
    let queue_name = queue_name.trim();
    queues
        .iter()
        .find(|q| q.as_str() == queue_name)
        .map(|q| Channel {
            queue_name: q.clone(),
            address: format!("memory://{q}"),
        })
        .ok_or_else(|| CatalogError::UnknownChannel {
            queue_name: queue_name.to_string(),
        })
}

fn lock_poisoned() -> CatalogError {
    Error::Internal {
        message: "queue lock poisoned".into(),
    }
    .into()
}
