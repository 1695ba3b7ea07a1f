//! Byte-level transport for the DNS API.

use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use std::time::Duration;

const USER_AGENT: &str = concat!("netcup-ddns/", env!("CARGO_PKG_VERSION"));

/// Sends a request body and returns the response body.
///
/// Implementations report connection problems as [`DdnsError::Network`];
/// that is the only error class the API client retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, body: &[u8]) -> Result<Vec<u8>>;
}

/// reqwest-backed transport posting JSON.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DdnsError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: &[u8]) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_vec())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}
