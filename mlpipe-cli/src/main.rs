//! mlpipe CLI
//!
//! Command-line interface for the mlpipe dispatcher: fire triggers, inspect
//! job records and alarms, and run artifact maintenance.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "mlpipe")]
#[command(about = "ML pipeline dispatcher CLI", long_about = None)]
struct Cli {
    /// Dispatcher URL
    #[arg(
        long,
        env = "MLPIPE_DISPATCHER_URL",
        default_value = "http://localhost:8080"
    )]
    dispatcher_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        dispatcher_url: cli.dispatcher_url,
    };

    handle_command(cli.command, &config).await
}
