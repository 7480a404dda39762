//! HTTP client configuration
//!
//! One configuration value feeds both the blob client and the token
//! provider, so timeouts and the user agent stay consistent across every
//! request the tool makes.

use std::env;
use std::time::Duration;

use crate::constants::{env as env_constants, http, identity, storage};

/// Settings for the shared HTTP client and service endpoints
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Total request timeout
    pub timeout: Duration,

    /// Connection establishment timeout
    pub connect_timeout: Duration,

    /// User agent sent with every request
    pub user_agent: String,

    /// Storage REST API version
    pub storage_api_version: String,

    /// Instance metadata service token endpoint
    pub imds_endpoint: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
            storage_api_version: storage::API_VERSION.to_string(),
            imds_endpoint: identity::IMDS_ENDPOINT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Default configuration with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = env::var(env_constants::IMDS_ENDPOINT) {
            config.imds_endpoint = endpoint;
        }
        config
    }

    /// Build the `reqwest` client for this configuration.
    pub fn build_http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
    }
}
