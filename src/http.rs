//! Outbound HTTP client shared by feed sources and the notifier.

use std::time::Duration;

use reqwest::Client;

use crate::config::HttpConfig;
use crate::{NewsgrabError, Result};

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("newsgrab/", env!("CARGO_PKG_VERSION"));

/// Build a client with the configured timeouts and redirect limit.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.read_timeout_secs))
        .timeout(Duration::from_secs(config.total_timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| NewsgrabError::Config(format!("failed to create HTTP client: {}", e)))
}
