//! Error types for netcup-ddns.

use thiserror::Error;

/// Result type alias for netcup-ddns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// DDNS error types.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure (connection refused, timeout, HTTP 5xx, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// Transport retries used up for one API call.
    #[error("{action} failed after {attempts} attempts: {last_error}")]
    TransportExhausted {
        action: String,
        attempts: u32,
        last_error: String,
    },

    /// The API answered with a non-success status.
    #[error("API error during {action} (status {status_code}): {message}")]
    Api {
        action: String,
        status_code: u32,
        message: String,
    },

    /// More than one record matches a (hostname, type) pair.
    #[error(
        "Found {count} {record_type} records for host {hostname}. \
         Configure a host for which only a single {record_type} record exists"
    )]
    AmbiguousRecord {
        hostname: String,
        record_type: String,
        count: usize,
    },

    /// An address that is not usable as a public address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// IP detection error.
    #[error("IP detection failed: {0}")]
    IpDetection(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DdnsError {
    /// Whether the error comes from the transport and may be retried.
    pub fn is_transport(&self) -> bool {
        matches!(self, DdnsError::Network(_))
    }

    /// Whether the API itself rejected the request.
    pub fn is_api(&self) -> bool {
        matches!(self, DdnsError::Api { .. })
    }

    /// Whether an ERROR line was already logged where this error arose.
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            DdnsError::Api { .. }
                | DdnsError::AmbiguousRecord { .. }
                | DdnsError::TransportExhausted { .. }
        )
    }
}

impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        DdnsError::Network(e.to_string())
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for DdnsError {
    fn from(e: toml::ser::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}
