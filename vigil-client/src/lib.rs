//! Vigil HTTP Client
//!
//! A typed HTTP client for the modeling platform's REST API.
//!
//! This crate is shared by the poller and the CLI; it covers the status
//! endpoints the poller consumes plus the launch and kill endpoints the
//! watchers call around them.
//!
//! # Example
//!
//! ```no_run
//! use vigil_client::PlatformClient;
//! use vigil_core::work::WorkType;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vigil_client::ClientError> {
//!     let client = PlatformClient::new("http://localhost:8080");
//!
//!     let project_id = Uuid::new_v4();
//!     let report = client.check_task(project_id, &WorkType::Autofit).await?;
//!
//!     println!("autofit is {}", report.status);
//!     Ok(())
//! }
//! ```

pub mod error;
mod calibration;
mod portfolio;
mod tasks;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the modeling platform API
///
/// Methods are organized into logical groups:
/// - Generic task slots (status checks, kill)
/// - Automatic calibration (autofit) launches
/// - Portfolio computations (BOC curves, full GA optimization)
#[derive(Debug, Clone)]
pub struct PlatformClient {
    /// Base URL of the platform API (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl PlatformClient {
    /// Create a new platform client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the platform API (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new platform client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the platform API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a site-relative path onto the base URL
    ///
    /// Status paths are stored and passed around site-relative, the way the
    /// backend reports them; absolute URLs stay local to this method.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Checks the status code and returns an appropriate error if the
    /// request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no useful body (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
