//! Observability infrastructure for herd.
//!
//! Structured logging with consistent spans. This module provides
//! initialization helpers and span constructors shared by every herd
//! component.

use std::str::FromStr;
use std::sync::Once;

use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::Error;

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(Error::InvalidInput(format!(
                "unknown log format '{other}' (expected json or pretty)"
            ))),
        }
    }
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops. Logs go to stderr so stdout stays free for
/// command output.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `herd_catalog=debug`)
///
/// # Example
///
/// ```rust
/// use herd_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty().with_writer(std::io::stderr))
                    .init();
            }
        }
    });
}

/// Creates the span a storage policy selection run executes in.
///
/// # Example
///
/// ```rust
/// use herd_core::observability::selector_span;
///
/// let span = selector_span("herd-storage-policy-selector", 1000);
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn selector_span(queue_name: &str, max_results: usize) -> Span {
    tracing::info_span!(
        "storage_policy_selector",
        queue = queue_name,
        max_results = max_results,
    )
}

/// Creates a span for administrative catalog operations.
#[must_use]
pub fn catalog_span(operation: &str, key: &str) -> Span {
    tracing::debug_span!("catalog", op = operation, key = key)
}
