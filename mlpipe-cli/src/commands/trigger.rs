//! Trigger command handlers
//!
//! Sends object-created, schedule, direct and notification-envelope triggers
//! to the dispatcher and prints what happened.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use mlpipe_client::DispatcherClient;
use mlpipe_core::dto::trigger::{
    ObjectCreatedEvent, ObjectEventEnvelope, ObjectEventResult, ScheduledEvent, TriggerOutcome,
    TriggerResponse,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::commands::colorize_status;
use crate::config::Config;

/// Trigger subcommands
#[derive(Subcommand)]
pub enum TriggerCommands {
    /// Report a new object in a watched bucket
    Object {
        /// Bucket the object landed in
        #[arg(long)]
        bucket: String,

        /// Object key
        key: String,

        /// Object size in bytes
        #[arg(long, default_value = "0")]
        size: u64,
    },
    /// Deliver an object-storage notification envelope read from a JSON file
    Events {
        /// Path to the `{"Records": [...]}` document
        file: PathBuf,
    },
    /// Fire a schedule rule now
    Schedule {
        /// Rule identifier
        #[arg(long, default_value = "manual")]
        rule_id: String,
    },
    /// Invoke the dispatcher directly
    Direct {
        /// Payload entries as key=value pairs (e.g., action=train_model)
        #[arg(short, long, value_parser = parse_key_val)]
        param: Vec<(String, String)>,
    },
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;

    if key.is_empty() {
        anyhow::bail!("invalid KEY=value: empty key in `{}`", s);
    }

    Ok((key.to_string(), value.to_string()))
}

pub async fn handle_trigger_command(command: TriggerCommands, config: &Config) -> Result<()> {
    let client = DispatcherClient::new(&config.dispatcher_url);

    match command {
        TriggerCommands::Object { bucket, key, size } => {
            let response = client
                .object_created(ObjectCreatedEvent { bucket, key, size })
                .await
                .context("Failed to send object-created trigger")?;
            print_response(&response);
        }
        TriggerCommands::Events { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let envelope: ObjectEventEnvelope = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            let results = client
                .object_events(&envelope)
                .await
                .context("Failed to deliver notification")?;
            print_event_results(&results);
        }
        TriggerCommands::Schedule { rule_id } => {
            let response = client
                .scheduled(ScheduledEvent {
                    rule_id,
                    fired_at: None,
                })
                .await
                .context("Failed to fire schedule")?;
            print_response(&response);
        }
        TriggerCommands::Direct { param } => {
            let payload: BTreeMap<String, String> = param.into_iter().collect();
            let response = client
                .direct(&payload)
                .await
                .context("Failed to invoke dispatcher")?;
            print_response(&response);
        }
    }

    Ok(())
}

fn outcome_label(outcome: TriggerOutcome) -> ColoredString {
    match outcome {
        TriggerOutcome::Dispatched => "dispatched".green(),
        TriggerOutcome::AlreadyActive => "already active".yellow(),
        TriggerOutcome::Ignored => "ignored".dimmed(),
    }
}

fn print_response(response: &TriggerResponse) {
    println!("{} {}", "Outcome:".bold(), outcome_label(response.outcome));

    if let Some(job) = &response.job {
        println!("  Job:     {}", job.job_id.cyan());
        println!("  Attempt: {}", job.attempt);
        println!("  Status:  {}", colorize_status(job.status));
        println!("  Network: {} ({})", job.network_ref.network_id, job.network_ref.source);
    }
}

fn print_event_results(results: &[ObjectEventResult]) {
    println!("{}", format!("{} record(s):", results.len()).bold());

    for result in results {
        let location = format!("s3://{}/{}", result.bucket, result.key);
        match (&result.outcome, &result.error) {
            (_, Some(error)) => println!("  {} {} {}", "✗".red(), location, error.red()),
            (Some(outcome), None) => {
                let job = result
                    .job
                    .as_ref()
                    .map(|j| j.job_id.as_str())
                    .unwrap_or("-");
                println!(
                    "  {} {} {} {}",
                    "▸".cyan(),
                    location,
                    outcome_label(*outcome),
                    job.dimmed()
                );
            }
            (None, None) => println!("  {} {}", "?".yellow(), location),
        }
    }
}
