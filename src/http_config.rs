//! HTTP client configuration
//!
//! Timeouts and connection settings for outbound requests made by the card
//! message generator.

use crate::error::AppResult;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Total request timeout
    pub timeout: Duration,
    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(45),
            pool_max_idle_per_host: 2,
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short timeouts for message generation; failures fall back to canned
    /// text.
    pub fn message_generator() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            pool_max_idle_per_host: 1,
        }
    }

    /// Build a reqwest client with this configuration
    pub fn build_client(&self) -> AppResult<Client> {
        Ok(ClientBuilder::new()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .build()?)
    }
}
