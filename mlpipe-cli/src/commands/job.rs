//! Job command handlers
//!
//! Listing and viewing dispatch records.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use mlpipe_client::DispatcherClient;
use mlpipe_core::domain::action::Action;
use mlpipe_core::domain::job::{JobRecord, JobStatus};

use crate::commands::colorize_status;
use crate::config::Config;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List job records, most recent first
    List {
        /// Only records in this status (pending, running, succeeded, failed)
        #[arg(long)]
        status: Option<JobStatus>,
    },
    /// Get job details
    Get {
        /// Job ID (e.g., train-1a2b3c4d5e6f7a8b)
        id: String,
    },
}

pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = DispatcherClient::new(&config.dispatcher_url);

    match command {
        JobCommands::List { status } => list_jobs(&client, status).await,
        JobCommands::Get { id } => get_job(&client, &id).await,
    }
}

async fn list_jobs(client: &DispatcherClient, status: Option<JobStatus>) -> Result<()> {
    let jobs = client
        .list_jobs(status)
        .await
        .context("Failed to list jobs")?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

async fn get_job(client: &DispatcherClient, id: &str) -> Result<()> {
    let job = client
        .get_job(id)
        .await
        .with_context(|| format!("Failed to get job {}", id))?;

    print_job_details(&job);

    Ok(())
}

fn print_job_summary(job: &JobRecord) {
    println!("  {} Job {}", "▸".cyan(), job.job_id.dimmed());
    println!("    Kind:     {}", job.action.kind());
    println!("    Status:   {}", colorize_status(job.status));
    println!(
        "    Started:  {}",
        job.started_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

fn print_job_details(job: &JobRecord) {
    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", job.job_id.cyan());
    println!("  Attempt:   {}", job.attempt);
    println!("  Status:    {}", colorize_status(job.status));
    println!("  Started:   {}", job.started_at.format("%Y-%m-%d %H:%M:%S"));

    if let Some(ended) = job.ended_at {
        println!("  Ended:     {}", ended.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(seconds) = job.duration_secs() {
        println!("  Duration:  {:.0}s", seconds);
    }
    if let Some(handle) = &job.external_handle {
        println!("  Handle:    {}", handle.dimmed());
    }

    println!("\n{}", "Action:".bold());
    match &job.action {
        Action::TrainModel {
            dataset_ref,
            instance_type,
            max_duration_secs,
        } => {
            println!("  Train model on {}", dataset_ref.uri());
            println!("  Instance:  {}", instance_type);
            println!("  Max time:  {}s", max_duration_secs);
        }
        Action::RunBatchInference {
            input_ref,
            output_prefix,
            model_ref,
        } => {
            println!("  Batch inference on {}", input_ref.uri());
            println!("  Model:     {}", model_ref);
            println!("  Output:    {}", output_prefix);
        }
    }

    println!("\n{}", "Network:".bold());
    println!(
        "  {} ({})",
        job.network_ref.network_id, job.network_ref.source
    );
    println!("  Subnets:   {}", job.network_ref.subnet_ids.join(", "));

    if let Some(error) = &job.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.to_string().red());
    }
}
