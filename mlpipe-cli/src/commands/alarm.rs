use anyhow::{Context, Result};
use colored::*;
use mlpipe_client::DispatcherClient;

use crate::config::Config;

pub async fn show_alarms(config: &Config) -> Result<()> {
    let client = DispatcherClient::new(&config.dispatcher_url);
    let alarms = client.alarms().await.context("Failed to fetch alarms")?;

    for alarm in alarms {
        let status = if alarm.is_firing() {
            "FIRING".red().bold()
        } else {
            "ok".green()
        };
        println!(
            "  {:<16} {:<8} observed {:.2} / threshold {:.2} over {}s",
            format!("{:?}", alarm.kind),
            status,
            alarm.observed,
            alarm.threshold,
            alarm.window_secs
        );
    }

    Ok(())
}
