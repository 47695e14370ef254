//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod alarm;
mod job;
mod lifecycle;
mod trigger;

pub use job::JobCommands;
pub use lifecycle::LifecycleCommands;
pub use trigger::TriggerCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use mlpipe_core::domain::job::JobStatus;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Send a trigger to the dispatcher
    Trigger {
        #[command(subcommand)]
        command: TriggerCommands,
    },
    /// Inspect job records
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Show the current alarm evaluation
    Alarms,
    /// Data and model artifact maintenance
    Lifecycle {
        #[command(subcommand)]
        command: LifecycleCommands,
    },
}

/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Trigger { command } => trigger::handle_trigger_command(command, config).await,
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Alarms => alarm::show_alarms(config).await,
        Commands::Lifecycle { command } => {
            lifecycle::handle_lifecycle_command(command, config).await
        }
    }
}

/// Colorize job status for display
pub(crate) fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Succeeded => status_str.green(),
        JobStatus::Failed => status_str.red(),
    }
}
