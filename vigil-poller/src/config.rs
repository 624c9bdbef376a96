//! Poller configuration

use std::time::Duration;

const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Polling configuration
///
/// The interval is the delay between consecutive status checks of one
/// task, measured from the end of one check to the start of the next.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between consecutive status checks of one task
    pub interval: Duration,
}

impl PollConfig {
    /// Creates a configuration with an explicit interval
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - VIGIL_POLL_INTERVAL_MS (optional, milliseconds, default: 1000)
    pub fn from_env() -> Self {
        let interval = std::env::var("VIGIL_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INTERVAL);

        Self { interval }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interval.is_zero() {
            anyhow::bail!("poll interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
