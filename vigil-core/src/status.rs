//! Status taxonomy for long-running backend computations

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Server-reported state of a computation
///
/// Status endpoints answer with lowercase strings; anything the client does
/// not recognize maps to [`TaskStatus::Unknown`] and is treated as terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Started,
    Completed,
    Blocked,
    Cancelled,
    Error,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// A terminal status means no further checks will change the outcome
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Decoded body of a status endpoint
///
/// Only `status` is always present: the timing fields are filled in while
/// the computation runs, `error_text` on failure, and `result_id` once a
/// result has been stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: TaskStatus,
    #[serde(default)]
    pub error_text: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stop_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_id: Option<Uuid>,
}

impl StatusReport {
    /// How long the computation has been running
    ///
    /// Measured against the server clock when the report carries one, so
    /// client/server clock skew does not distort the figure.
    pub fn elapsed(&self) -> Option<Duration> {
        let start = self.start_time?;
        let now = self.current_time.unwrap_or_else(Utc::now);
        Some(now - start)
    }
}
