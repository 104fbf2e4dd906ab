//! Shared test utilities for herd tests.
//!
//! This crate provides:
//! - [`TestCatalog`]: In-memory catalog and queues wired to a selector
//! - Factory functions and constants for policies and records
//! - Custom assertion helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use herd_test_utils::*;
//!
//! let ctx = TestCatalog::new();
//! ctx.add_policy(&PolicyFactory::aged(POLICY_NAMESPACE, POLICY_NAME, 30, PolicyFactory::full()));
//! ctx.add_record(&record(PARTITION_VALUE, 31));
//! let selections = ctx.selector().execute_at(QUEUE_NAME, MAX_RESULTS, fixed_now()).unwrap();
//! assert_selected_partitions(&selections, &[PARTITION_VALUE]);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("herd=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
