//! Vigil Poller
//!
//! A registry of named polling tasks for long-running backend computations.
//!
//! Architecture:
//! - Configuration: polling interval, from environment or defaults
//! - Poller: the registry itself; one check loop per running task,
//!   stop/stop-all semantics, fire-and-forget server-side kill
//! - Watchers: launch-and-watch flows for the computations the platform
//!   runs (autofit, BOC calculations, portfolio GA)
//!
//! A task polls its status endpoint at a fixed interval until the backend
//! reports a status other than `started`, a request fails, or the poll is
//! explicitly stopped. Every received outcome is delivered to the task's
//! handler; outcomes that land after a stop are suppressed.

mod config;
mod poller;
pub mod watch;

pub use config::PollConfig;
pub use poller::{JobPoller, PollHandler, PollOutcome};
