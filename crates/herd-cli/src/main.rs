//! herd CLI - Command-line interface for storage policy selection.
//!
//! The main entry point for the `herd` CLI binary.

use anyhow::Result;
use clap::Parser;

use herd_catalog::metrics::register_metrics;
use herd_cli::{Cli, Commands};
use herd_core::observability::init_logging;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let config = cli.config();

    init_logging(cli.log_format);
    register_metrics();

    match cli.command {
        Commands::Select(args) => herd_cli::commands::select::execute(&args, &config),
        Commands::ValidatePolicies(args) => {
            herd_cli::commands::validate_policies::execute(&args, &config)
        }
    }
}
