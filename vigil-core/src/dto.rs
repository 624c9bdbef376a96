//! Request payloads for computation launch endpoints

use serde::{Deserialize, Serialize};

/// POST body for launching a computation
///
/// `maxtime` caps the server-side solver runtime in seconds; `None` lets
/// the backend pick its default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxtime: Option<f64>,
}
