//! # herd-core
//!
//! Core abstractions shared by the herd catalog components.
//!
//! This crate provides:
//!
//! - **Keys**: Validated alternate keys for storage policies and business object data
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Logging initialization and standard spans
//!
//! ## Example
//!
//! ```rust
//! use herd_core::prelude::*;
//!
//! let key = StoragePolicyKey::new("FINRA", "archive-after-90")?;
//! assert_eq!(key.storage_policy_name, "archive-after-90");
//! # Ok::<(), herd_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod observability;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::keys::{CatalogRecordKey, StoragePolicyKey};
    pub use crate::observability::{LogFormat, init_logging};
}

pub use error::{Error, Result};
pub use keys::{CatalogRecordKey, MAX_SUBPARTITION_VALUES, StoragePolicyKey, codes_equal};
pub use observability::{LogFormat, init_logging};
