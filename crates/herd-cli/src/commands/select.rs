//! Select command - pick business object data due for a storage transition.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use owo_colors::OwoColorize;

use herd_catalog::{
    SelectorConfig, StaticChannelRegistry, StoragePolicySelection, StoragePolicySelector,
};

use crate::{Config, OutputFormat, load_snapshot};

/// Arguments for the select command.
///
/// Unset flags fall back to the `HERD_*` environment variables read by
/// [`SelectorConfig::from_env`], then to the built-in defaults.
#[derive(Debug, Args)]
pub struct SelectArgs {
    /// Catalog snapshot JSON file.
    #[arg(long, short = 's')]
    pub snapshot: PathBuf,

    /// Queue the selections are destined for.
    #[arg(long, short = 'q')]
    pub queue: Option<String>,

    /// Queues the channel registry knows (defaults to just `--queue`).
    #[arg(long = "known-queue", value_delimiter = ',')]
    pub known_queues: Vec<String>,

    /// Maximum number of selections.
    #[arg(long, short = 'n')]
    pub max_results: Option<usize>,

    /// Data statuses eligible for transition.
    #[arg(long = "data-status", value_delimiter = ',')]
    pub data_statuses: Vec<String>,

    /// Storage unit statuses eligible for transition (default: any).
    #[arg(long = "storage-unit-status", value_delimiter = ',')]
    pub storage_unit_statuses: Vec<String>,

    /// Evaluate ages as of this RFC 3339 instant instead of now.
    #[arg(long)]
    pub now: Option<String>,
}

impl SelectArgs {
    /// Builds the selector configuration from the process environment and
    /// these arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the result fails
    /// validation.
    pub fn selector_config(&self) -> Result<SelectorConfig> {
        self.selector_config_from(|name| std::env::var(name).ok())
    }

    /// Builds the selector configuration from an arbitrary variable lookup,
    /// with flags taking precedence.
    ///
    /// # Errors
    ///
    /// Same as [`SelectArgs::selector_config`].
    pub fn selector_config_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<SelectorConfig> {
        let mut config =
            SelectorConfig::from_vars(lookup).context("Invalid HERD_* environment settings")?;

        if let Some(queue) = &self.queue {
            config.queue_name = queue.trim().to_string();
        }
        if let Some(max_results) = self.max_results {
            config.max_results = max_results;
        }
        if let Some(queues) = trimmed(&self.known_queues) {
            config.known_queues = queues;
        }
        if let Some(statuses) = trimmed(&self.data_statuses) {
            config.eligibility.data_statuses = statuses;
        }
        if let Some(statuses) = trimmed(&self.storage_unit_statuses) {
            config.eligibility.storage_unit_statuses = statuses;
        }

        config.validate().context("Invalid selector configuration")?;
        Ok(config)
    }

    /// Returns the evaluation instant.
    ///
    /// # Errors
    ///
    /// Returns an error if `--now` is not an RFC 3339 timestamp.
    pub fn evaluation_time(&self) -> Result<DateTime<Utc>> {
        match &self.now {
            Some(now) => Ok(DateTime::parse_from_rfc3339(now)
                .with_context(|| format!("--now must be an RFC 3339 timestamp, got '{now}'"))?
                .with_timezone(&Utc)),
            None => Ok(Utc::now()),
        }
    }
}

/// Trims list flag values; `None` when nothing non-blank was given.
fn trimmed(values: &[String]) -> Option<Vec<String>> {
    let values: Vec<String> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    (!values.is_empty()).then_some(values)
}

/// Runs a selection and returns its result.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded, the configuration is
/// invalid, or the selection fails.
pub fn run(args: &SelectArgs) -> Result<Vec<StoragePolicySelection>> {
    run_with_config(args, &args.selector_config()?)
}

/// Runs a selection with an already-built configuration.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or the selection fails.
pub fn run_with_config(
    args: &SelectArgs,
    config: &SelectorConfig,
) -> Result<Vec<StoragePolicySelection>> {
    let now = args.evaluation_time()?;
    let snapshot = load_snapshot(&args.snapshot)?;

    let selector = StoragePolicySelector::new(
        snapshot,
        StaticChannelRegistry::new(config.registry_queues()),
    )
    .with_eligibility(config.eligibility.clone());

    selector
        .execute_at(&config.queue_name, config.max_results, now)
        .context("Storage policy selection failed")
}

/// Execute the select command.
///
/// # Errors
///
/// Returns an error if the selection fails or output cannot be rendered.
pub fn execute(args: &SelectArgs, config: &Config) -> Result<()> {
    let selector_config = args.selector_config()?;
    let selections = run_with_config(args, &selector_config)?;

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&selections)?);
        }
        OutputFormat::Text => {
            if selections.is_empty() {
                println!("No business object data selected");
                return Ok(());
            }

            println!(
                "Selected {} business object data for queue {}:",
                selections.len().to_string().green(),
                selector_config.queue_name.bold()
            );
            println!();
            for selection in &selections {
                println!("  {}", selection.business_object_data_key);
                println!(
                    "    -> {}",
                    selection.storage_policy_key.to_string().cyan()
                );
            }
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct SelectionRow {
                #[tabled(rename = "Namespace")]
                namespace: String,
                #[tabled(rename = "Definition")]
                definition: String,
                #[tabled(rename = "Format")]
                format: String,
                #[tabled(rename = "Partition")]
                partition: String,
                #[tabled(rename = "Data Version")]
                data_version: u32,
                #[tabled(rename = "Storage Policy")]
                policy: String,
            }

            let rows: Vec<_> = selections
                .iter()
                .map(|s| {
                    let key = &s.business_object_data_key;
                    let mut partition = key.partition_value.clone();
                    for sub in &key.sub_partition_values {
                        partition.push('|');
                        partition.push_str(sub);
                    }
                    SelectionRow {
                        namespace: key.namespace.clone(),
                        definition: key.business_object_definition_name.clone(),
                        format: format!(
                            "{}/{}/{}",
                            key.business_object_format_usage,
                            key.business_object_format_file_type,
                            key.business_object_format_version
                        ),
                        partition,
                        data_version: key.business_object_data_version,
                        policy: format!(
                            "{}/{}",
                            s.storage_policy_key.namespace, s.storage_policy_key.storage_policy_name
                        ),
                    }
                })
                .collect();

            if rows.is_empty() {
                println!("No business object data selected");
            } else {
                println!("{}", Table::new(rows));
            }
        }
    }

    Ok(())
}
