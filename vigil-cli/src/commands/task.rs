//! Task command handlers
//!
//! Handles the generic task-slot commands: one-shot status checks,
//! following a computation until it finishes, and killing it server-side.

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use tokio::sync::mpsc;
use uuid::Uuid;

use vigil_client::PlatformClient;
use vigil_core::status::{StatusReport, TaskStatus};
use vigil_core::work::WorkType;
use vigil_poller::{JobPoller, PollConfig, PollHandler};

use crate::config::Config;

/// Task subcommands
#[derive(Subcommand)]
pub enum TaskCommands {
    /// Check a task slot once
    Status {
        /// Project ID
        project_id: Uuid,

        /// Work type (autofit, optimization, gaoptim-<id>, portfolio-<id>)
        work_type: WorkType,
    },
    /// Poll a task slot until the computation finishes or fails
    Watch {
        /// Project ID
        project_id: Uuid,

        /// Work type (autofit, optimization, gaoptim-<id>, portfolio-<id>)
        work_type: WorkType,

        /// Delay between status checks, in milliseconds
        /// (default: $VIGIL_POLL_INTERVAL_MS or 1000)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Abort the computation server-side
    Kill {
        /// Project ID
        project_id: Uuid,

        /// Work type (autofit, optimization, gaoptim-<id>, portfolio-<id>)
        work_type: WorkType,
    },
}

/// Handle task commands
pub async fn handle_task_command(command: TaskCommands, config: &Config) -> Result<()> {
    let client = PlatformClient::new(&config.api_url);

    match command {
        TaskCommands::Status {
            project_id,
            work_type,
        } => {
            let report = client.check_task(project_id, &work_type).await?;
            print_report(&report);
            Ok(())
        }
        TaskCommands::Watch {
            project_id,
            work_type,
            interval_ms,
        } => {
            let poll_config = super::poll_config(interval_ms)?;
            watch_task(client, project_id, work_type, poll_config).await
        }
        TaskCommands::Kill {
            project_id,
            work_type,
        } => {
            client.kill_task(project_id, &work_type).await?;
            println!("{}", format!("Kill signal sent for {} task.", work_type).yellow());
            Ok(())
        }
    }
}

/// Follow one task slot until a terminal outcome is observed
async fn watch_task(
    client: PlatformClient,
    project_id: Uuid,
    work_type: WorkType,
    poll_config: PollConfig,
) -> Result<()> {
    let client = Arc::new(client);
    let poller = JobPoller::new(Arc::clone(&client), poll_config);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handler: PollHandler = Arc::new(move |outcome| {
        let _ = tx.send(outcome);
    });

    poller.start_poll(
        project_id.to_string(),
        PlatformClient::task_status_path(project_id, &work_type),
        handler,
    );

    while let Some(outcome) = rx.recv().await {
        match outcome {
            Ok(report) => {
                print_report(&report);
                if report.status.is_terminal() {
                    break;
                }
            }
            Err(e) => {
                println!("{} {}", "Status check failed:".red(), e);
                break;
            }
        }
    }

    Ok(())
}

/// Print a one-line summary of a status report
pub(super) fn print_report(report: &StatusReport) {
    match report.status {
        TaskStatus::Started => {
            let seconds = report.elapsed().map(|d| d.num_seconds()).unwrap_or(0);
            println!("{}", format!("running for {} s", seconds).yellow());
        }
        TaskStatus::Completed => {
            if let Some(result_id) = report.result_id {
                println!("{} (result {})", "completed".green().bold(), result_id);
            } else {
                println!("{}", "completed".green().bold());
            }
        }
        TaskStatus::Blocked => {
            println!(
                "{}",
                "blocked: another computation is already running for this resource".yellow()
            );
        }
        status => {
            let detail = report.error_text.as_deref().unwrap_or("no error text");
            println!("{} {}", format!("{}:", status).red().bold(), detail);
        }
    }
}
