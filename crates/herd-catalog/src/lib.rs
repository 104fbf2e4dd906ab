//! # herd-catalog
//!
//! Storage policies and storage policy selection for the herd data catalog.
//!
//! herd registers business object data that lives in object storage. Storage
//! policies describe when registered data should move to another storage
//! tier; this crate decides which data is due and which policy claims it.
//!
//! - **Policies**: rule, filter, and transition ([`policy`])
//! - **Records**: registered data and its storage unit ([`record`])
//! - **Selection**: the selector and its pure core ([`selector`])
//! - **Job**: selection plus message publication ([`job`])
//!
//! ## Priority
//!
//! When several policies match the same data, the most specific filter wins
//! outright. Ranking from highest to lowest for the common filter shapes:
//!
//! ```text
//! definition + format usage/file type
//! definition
//! format usage/file type
//! storage only
//! ```
//!
//! ## Example
//!
//! ```rust
//! use herd_catalog::prelude::*;
//!
//! let catalog = InMemoryCatalog::new();
//! catalog.create_storage_policy(&StoragePolicy {
//!     key: StoragePolicyKey::new("FINRA", "archive-trades")?,
//!     rule: StoragePolicyRule::days_since_registration(90),
//!     filter: StoragePolicyFilter::for_storage("S3_MANAGED"),
//!     transition: StoragePolicyTransition::new("S3_GLACIER"),
//! })?;
//!
//! let selector = StoragePolicySelector::new(catalog, StaticChannelRegistry::new(["selector"]));
//! let selections = selector.execute("selector", 1000)?;
//! assert!(selections.is_empty());
//! # Ok::<(), herd_catalog::CatalogError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod channel;
pub mod config;
pub mod error;
pub mod job;
pub mod metrics;
pub mod policy;
pub mod record;
pub mod selection;
pub mod selector;
pub mod source;

// Re-export main types at crate root
pub use channel::{
    Channel, ChannelRegistry, InMemoryQueues, SelectionPublisher, StaticChannelRegistry,
};
pub use config::{Eligibility, SelectorConfig};
pub use error::{CatalogError, Result};
pub use job::{JobReport, StoragePolicySelectorJob};
pub use policy::{
    StoragePolicy, StoragePolicyFilter, StoragePolicyRule, StoragePolicyTransition,
};
pub use record::{CatalogRecord, StorageUnit};
pub use selection::StoragePolicySelection;
pub use selector::{StoragePolicySelector, select_at};
pub use source::{CatalogSnapshot, CatalogSource, InMemoryCatalog};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::channel::{ChannelRegistry, InMemoryQueues, StaticChannelRegistry};
    pub use crate::policy::{
        StoragePolicy, StoragePolicyFilter, StoragePolicyRule, StoragePolicyTransition,
    };
    pub use crate::record::{CatalogRecord, StorageUnit};
    pub use crate::selection::StoragePolicySelection;
    pub use crate::selector::StoragePolicySelector;
    pub use crate::source::{CatalogSnapshot, CatalogSource, InMemoryCatalog};
    pub use herd_core::{CatalogRecordKey, StoragePolicyKey};
}
