//! # herd-cli
//!
//! Command-line interface for herd storage policy selection.
//!
//! ## Commands
//!
//! - `herd select` - Select business object data due for a storage transition
//! - `herd validate-policies` - Check every storage policy rule can be applied
//!
//! Both commands read a JSON catalog snapshot:
//!
//! ```json
//! { "storagePolicies": [ ... ], "records": [ ... ] }
//! ```
//!
//! ## Configuration
//!
//! - `HERD_STORAGE_POLICY_SELECTOR_QUEUE_NAME` - Destination queue
//! - `HERD_STORAGE_POLICY_SELECTOR_MAX_RESULTS` - Selection cap (default: 1000)
//! - `HERD_KNOWN_QUEUES` - Comma-separated queues the registry resolves
//! - `HERD_LOG_FORMAT` - `pretty` or `json` diagnostics on stderr

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use herd_catalog::CatalogSnapshot;
use herd_core::LogFormat;

/// herd CLI - storage policy selection.
#[derive(Debug, Parser)]
#[command(name = "herd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Diagnostic log format.
    #[arg(long, global = true, env = "HERD_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            format: self.format.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Select business object data due for a storage transition.
    Select(commands::select::SelectArgs),
    /// Check that every storage policy rule can be applied.
    ValidatePolicies(commands::validate_policies::ValidatePoliciesArgs),
}

/// Output format.
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Table output.
    Table,
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Output format.
    pub format: OutputFormat,
}

/// Reads and validates a catalog snapshot file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a valid
/// snapshot.
pub fn load_snapshot(path: &Path) -> Result<CatalogSnapshot> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
    CatalogSnapshot::from_json(&json)
        .with_context(|| format!("Invalid catalog snapshot in {}", path.display()))
}
