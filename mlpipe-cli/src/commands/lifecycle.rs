//! Lifecycle command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use mlpipe_client::DispatcherClient;

use crate::config::Config;

/// Lifecycle subcommands
#[derive(Subcommand)]
pub enum LifecycleCommands {
    /// Copy raw data files to the processed prefix
    ProcessRaw,
    /// Delete all but the most recent model artifacts
    PruneModels {
        /// Number of models to keep (dispatcher default when omitted)
        #[arg(long)]
        keep: Option<usize>,
    },
}

pub async fn handle_lifecycle_command(command: LifecycleCommands, config: &Config) -> Result<()> {
    let client = DispatcherClient::new(&config.dispatcher_url);

    match command {
        LifecycleCommands::ProcessRaw => {
            let report = client
                .process_raw()
                .await
                .context("Failed to process raw data")?;

            println!(
                "{}",
                format!("Processed {} file(s)", report.processed.len()).bold()
            );
            for file in &report.processed {
                println!("  {} {} -> {}", "✓".green(), file.key, file.processed_key);
            }
            for file in &report.failed {
                println!("  {} {} {}", "✗".red(), file.key, file.error.red());
            }
        }
        LifecycleCommands::PruneModels { keep } => {
            let report = client
                .prune_models(keep)
                .await
                .context("Failed to prune models")?;

            println!(
                "{}",
                format!("Kept {} model(s), deleted {}", report.kept, report.deleted.len()).bold()
            );
            for key in &report.deleted {
                println!("  {} {}", "-".red(), key.dimmed());
            }
        }
    }

    Ok(())
}
