//! Autofit command handlers
//!
//! Launches an automatic calibration run and follows it through the
//! computation watcher, the same flow the web client uses.

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use uuid::Uuid;

use vigil_client::PlatformClient;
use vigil_poller::JobPoller;
use vigil_poller::watch::{ComputationWatcher, WatchEvent};

use crate::config::Config;

use super::task::print_report;

/// Autofit subcommands
#[derive(Subcommand)]
pub enum AutofitCommands {
    /// Launch an autofit run and follow it until it finishes
    Run {
        /// Project ID
        project_id: Uuid,

        /// Parameter set ID
        parset_id: Uuid,

        /// Cap on solver runtime, in seconds
        #[arg(long)]
        maxtime: Option<f64>,

        /// Delay between status checks, in milliseconds
        /// (default: $VIGIL_POLL_INTERVAL_MS or 1000)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Check whether an autofit run is in progress for a parameter set
    Status {
        /// Project ID
        project_id: Uuid,

        /// Parameter set ID
        parset_id: Uuid,
    },
}

/// Handle autofit commands
pub async fn handle_autofit_command(command: AutofitCommands, config: &Config) -> Result<()> {
    match command {
        AutofitCommands::Run {
            project_id,
            parset_id,
            maxtime,
            interval_ms,
        } => run_autofit(config, project_id, parset_id, maxtime, interval_ms).await,
        AutofitCommands::Status {
            project_id,
            parset_id,
        } => {
            let client = PlatformClient::new(&config.api_url);
            let report = client.autofit_status(project_id, parset_id).await?;
            print_report(&report);
            Ok(())
        }
    }
}

async fn run_autofit(
    config: &Config,
    project_id: Uuid,
    parset_id: Uuid,
    maxtime: Option<f64>,
    interval_ms: Option<u64>,
) -> Result<()> {
    let client = Arc::new(PlatformClient::new(&config.api_url));
    let poll_config = super::poll_config(interval_ms)?;
    let poller = JobPoller::new(Arc::clone(&client), poll_config);
    let watcher = ComputationWatcher::new(poller, client);

    println!("{}", "Launching autofit...".bold());
    let mut events = watcher.watch_autofit(project_id, parset_id, maxtime).await?;

    while let Some(event) = events.recv().await {
        match event {
            WatchEvent::Running { seconds } => {
                println!("{}", format!("Autofit running for {} s", seconds).yellow());
            }
            WatchEvent::Completed(report) => {
                if let Some(result_id) = report.result_id {
                    println!(
                        "{} (result {})",
                        "Autofit completed".green().bold(),
                        result_id
                    );
                } else {
                    println!("{}", "Autofit completed".green().bold());
                }
                break;
            }
            WatchEvent::Blocked => {
                println!(
                    "{}",
                    "Another calculation on this project is already running.".yellow()
                );
                break;
            }
            WatchEvent::Failed { message } => {
                println!("{} {}", "Autofit failed:".red().bold(), message);
                break;
            }
        }
    }

    Ok(())
}
