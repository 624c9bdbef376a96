//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod autofit;
mod task;

pub use autofit::AutofitCommands;
pub use task::TaskCommands;

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use vigil_poller::PollConfig;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Task slots: status, watch, kill
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Automatic calibration runs
    Autofit {
        #[command(subcommand)]
        command: AutofitCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Task { command } => task::handle_task_command(command, config).await,
        Commands::Autofit { command } => autofit::handle_autofit_command(command, config).await,
    }
}

/// Poll configuration for watch commands
///
/// An explicit `--interval-ms` wins; otherwise the environment override
/// (VIGIL_POLL_INTERVAL_MS) and the 1000 ms default apply. Either way the
/// result is validated before any poll starts.
pub(crate) fn poll_config(interval_ms: Option<u64>) -> Result<PollConfig> {
    let config = match interval_ms {
        Some(ms) => PollConfig::new(Duration::from_millis(ms)),
        None => PollConfig::from_env(),
    };
    config.validate()?;

    Ok(config)
}
