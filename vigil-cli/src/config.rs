//! Configuration module
//!
//! Handles CLI configuration including the platform API URL.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the platform API
    pub api_url: String,
}
