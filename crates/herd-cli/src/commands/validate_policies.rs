//! Validate-policies command - check every storage policy rule can be applied.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;

use herd_catalog::{CatalogSnapshot, StoragePolicy};
use herd_core::StoragePolicyKey;

use crate::{Config, OutputFormat, load_snapshot};

/// Arguments for the validate-policies command.
#[derive(Debug, Args)]
pub struct ValidatePoliciesArgs {
    /// Catalog snapshot JSON file.
    #[arg(long, short = 's')]
    pub snapshot: PathBuf,
}

/// Outcome of checking one storage policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCheck {
    /// Storage policy key.
    pub storage_policy_key: StoragePolicyKey,
    /// Rule type as stored.
    pub rule_type: String,
    /// Rule value as stored.
    pub rule_value: u32,
    /// Why the rule cannot be applied, if it cannot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PolicyCheck {
    fn of(policy: &StoragePolicy) -> Self {
        Self {
            storage_policy_key: policy.key.clone(),
            rule_type: policy.rule.rule_type.clone(),
            rule_value: policy.rule.rule_value,
            error: policy.rule.evaluate().err().map(|e| e.to_string()),
        }
    }

    /// Returns true if the selector can apply this policy's rule.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.error.is_none()
    }
}

/// Checks every policy in a snapshot, in snapshot order.
#[must_use]
pub fn check(snapshot: &CatalogSnapshot) -> Vec<PolicyCheck> {
    snapshot.storage_policies.iter().map(PolicyCheck::of).collect()
}

/// Execute the validate-policies command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or any policy has a rule
/// the selector cannot apply.
pub fn execute(args: &ValidatePoliciesArgs, config: &Config) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let checks = check(&snapshot);
    let unsupported = checks.iter().filter(|c| !c.is_supported()).count();

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&checks)?);
        }
        OutputFormat::Text | OutputFormat::Table => {
            if checks.is_empty() {
                println!("No storage policies found");
            }
            for c in &checks {
                let status = if c.is_supported() {
                    "ok".green().to_string()
                } else {
                    "unsupported".red().to_string()
                };
                println!(
                    "  {} [{} {}] {status}",
                    c.storage_policy_key, c.rule_type, c.rule_value
                );
                if let Some(error) = &c.error {
                    println!("    Error: {}", error.red());
                }
            }
        }
    }

    if unsupported > 0 {
        anyhow::bail!(
            "{unsupported} of {} storage policies use unsupported rule types",
            checks.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use herd_test_utils::*;

    use super::*;

    #[test]
    fn test_validate_args_parsing() {
        use clap::Parser;

        #[derive(Parser)]
        struct TestCli {
            #[command(flatten)]
            args: ValidatePoliciesArgs,
        }

        let cli = TestCli::parse_from(["test", "-s", "catalog.json"]);
        assert_eq!(cli.args.snapshot, PathBuf::from("catalog.json"));
    }

    #[test]
    fn test_check_flags_unsupported_rules() {
        let snapshot = CatalogSnapshot {
            storage_policies: vec![
                PolicyFactory::aged(
                    POLICY_NAMESPACE,
                    POLICY_NAME,
                    BDATA_AGE_IN_DAYS,
                    PolicyFactory::full(),
                ),
                PolicyFactory::with_rule(
                    POLICY_NAMESPACE,
                    POLICY_NAME_2,
                    UNSUPPORTED_RULE_TYPE,
                    BDATA_AGE_IN_DAYS,
                    PolicyFactory::storage_only(),
                ),
            ],
            records: Vec::new(),
        };

        let checks = check(&snapshot);

        assert_eq!(checks.len(), 2);
        assert!(checks[0].is_supported());
        assert!(!checks[1].is_supported());
        assert!(
            checks[1]
                .error
                .as_deref()
                .is_some_and(|e| e.contains(UNSUPPORTED_RULE_TYPE))
        );
    }
}
