//! netcup CCP DNS API client.
//!
//! Every call is one JSON round trip to a single endpoint. Two recovery layers
//! sit between a call and the transport:
//!
//! - transport retry: a connection-level failure is retried up to
//!   [`RetryPolicy::attempts`] times with a fixed delay, then the call fails
//!   with [`DdnsError::TransportExhausted`];
//! - session recovery: a privileged call answered with
//!   [`STATUS_SESSION_INVALID`] logs in again and is resent exactly once.

pub mod transport;
pub mod types;


pub use transport::{HttpTransport, Transport};
pub use types::{
    Action, ApiResponse, DnsRecord, DnsRecordSet, DnsZone, STATUS_SESSION_INVALID,
    STATUS_VALIDATION_ERROR,
};

use crate::error::{DdnsError, Result};
use serde_json::{json, Map, Value};
use std::time::Duration;
use types::ApiRequest;

pub const DEFAULT_ENDPOINT: &str =
    "https://ccp.netcup.net/run/webservice/servers/endpoint.php?JSON";

const VALIDATION_HINT: &str = " [ADDITIONAL INFORMATION: This error from the netcup DNS API \
often indicates wrong API credentials or too many login attempts in a short time. \
Please check the credentials in the config file.]";

/// Account credentials for the API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub customer_number: String,
    pub api_key: String,
    pub api_password: String,
}

/// Transport retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(30),
        }
    }
}

/// Where the client stands with the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(String),
    /// The server rejected the session id; a new login is pending.
    Expired,
    LoggedOut,
}

/// Recovery budget of one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Fresh,
    RetriedOnce,
}

/// Client for one run: owns the transport and the session id.
pub struct ApiClient<T> {
    transport: T,
    endpoint: String,
    credentials: Credentials,
    retry: RetryPolicy,
    session: SessionState,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, credentials: Credentials) -> Self {
        Self {
            transport,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials,
            retry: RetryPolicy::default(),
            session: SessionState::Unauthenticated,
        }
    }

    /// Talk to another endpoint (for testing).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Log in and remember the session id.
    pub async fn login(&mut self) -> Result<String> {
        tracing::info!("Logging into API");

        let param = object(json!({
            "customernumber": self.credentials.customer_number,
            "apikey": self.credentials.api_key,
            "apipassword": self.credentials.api_password,
        }));
        let response = self.send(Action::Login, &param).await?;

        if !response.is_success() {
            let mut message = response.message();
            if response.statuscode == STATUS_VALIDATION_ERROR {
                message.push_str(VALIDATION_HINT);
            }
            tracing::error!("Error while {}: {}", Action::Login.describe(), message);
            return Err(DdnsError::Api {
                action: Action::Login.to_string(),
                status_code: response.statuscode,
                message,
            });
        }

        let session_id = response
            .responsedata
            .get("apisessionid")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DdnsError::Serialization("login response carries no apisessionid".to_string())
            })?
            .to_string();

        self.session = SessionState::Authenticated(session_id.clone());
        tracing::info!("Logged in successfully!");
        Ok(session_id)
    }

    /// End the session. API-level failures only produce a log line.
    pub async fn logout(&mut self) -> Result<bool> {
        if !matches!(self.session, SessionState::Authenticated(_)) {
            return Ok(false);
        }

        tracing::info!("Logging out from API");
        match self.call(Action::Logout, self.base_param(None)).await {
            Ok(_) => {
                self.session = SessionState::LoggedOut;
                tracing::info!("Logged out successfully!");
                Ok(true)
            }
            Err(e) if e.is_api() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Zone settings of `domain`.
    pub async fn info_zone(&mut self, domain: &str) -> Result<DnsZone> {
        tracing::info!("Getting DNS zone info for domain {}", domain);
        let data = self
            .call(Action::InfoDnsZone, self.base_param(Some(domain)))
            .await?;
        let zone = serde_json::from_value(data)?;
        tracing::info!("Successfully received Domain info.");
        Ok(zone)
    }

    /// All records of `domain`.
    pub async fn info_records(&mut self, domain: &str) -> Result<Vec<DnsRecord>> {
        tracing::info!("Getting DNS records for domain {}", domain);
        let data = self
            .call(Action::InfoDnsRecords, self.base_param(Some(domain)))
            .await?;
        let set: DnsRecordSet = serde_json::from_value(data)?;
        tracing::info!("Successfully received DNS record data.");
        Ok(set.dnsrecords)
    }

    /// Write back zone settings.
    pub async fn update_zone(&mut self, domain: &str, zone: &DnsZone) -> Result<()> {
        tracing::info!("Updating DNS zone for domain {}", domain);
        let mut param = self.base_param(Some(domain));
        param.insert("dnszone".to_string(), serde_json::to_value(zone)?);
        self.call(Action::UpdateDnsZone, param).await?;
        Ok(())
    }

    /// Create or update records; a record without id is created.
    pub async fn update_records(&mut self, domain: &str, records: &[DnsRecord]) -> Result<()> {
        tracing::info!("Updating DNS records for domain {}", domain);
        let mut param = self.base_param(Some(domain));
        param.insert(
            "dnsrecordset".to_string(),
            json!({ "dnsrecords": records }),
        );
        self.call(Action::UpdateDnsRecords, param).await?;
        Ok(())
    }

    fn base_param(&self, domain: Option<&str>) -> Map<String, Value> {
        let mut param = Map::new();
        if let Some(domain) = domain {
            param.insert("domainname".to_string(), json!(domain));
        }
        param.insert(
            "customernumber".to_string(),
            json!(self.credentials.customer_number),
        );
        param.insert("apikey".to_string(), json!(self.credentials.api_key));
        param
    }

    /// Privileged round trip with one-shot session recovery.
    async fn call(&mut self, action: Action, mut param: Map<String, Value>) -> Result<Value> {
        let mut attempt = Attempt::Fresh;

        loop {
            let SessionState::Authenticated(session_id) = &self.session else {
                tracing::error!("Error while {}: no active API session", action.describe());
                return Err(DdnsError::Api {
                    action: action.to_string(),
                    status_code: 0,
                    message: "no active API session".to_string(),
                });
            };
            param.insert("apisessionid".to_string(), json!(session_id));

            let response = self.send(action, &param).await?;
            if response.is_success() {
                return Ok(response.responsedata);
            }

            if response.statuscode == STATUS_SESSION_INVALID && attempt == Attempt::Fresh {
                tracing::warn!(
                    "API session is no longer valid during {}. Logging in again.",
                    action
                );
                self.session = SessionState::Expired;
                self.login().await?;
                attempt = Attempt::RetriedOnce;
                continue;
            }

            let message = response.message();
            tracing::error!("Error while {}: {}", action.describe(), message);
            return Err(DdnsError::Api {
                action: action.to_string(),
                status_code: response.statuscode,
                message,
            });
        }
    }

    /// One request with transport retry.
    async fn send(&self, action: Action, param: &Map<String, Value>) -> Result<ApiResponse> {
        let body = serde_json::to_vec(&ApiRequest {
            action: action.as_str(),
            param,
        })?;

        let mut attempt = 1;
        loop {
            match self.transport.post(&self.endpoint, &body).await {
                Ok(bytes) => {
                    return serde_json::from_slice(&bytes).map_err(|e| {
                        DdnsError::Serialization(format!("invalid {} response: {}", action, e))
                    });
                }
                Err(e) if e.is_transport() && attempt < self.retry.attempts => {
                    tracing::warn!(
                        "Request {} failed (attempt {}/{}): {}. Retrying in {}s.",
                        action,
                        attempt,
                        self.retry.attempts,
                        e,
                        self.retry.delay.as_secs()
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_transport() => {
                    tracing::error!(
                        "Request {} failed after {} attempts: {}",
                        action,
                        attempt,
                        e
                    );
                    return Err(DdnsError::TransportExhausted {
                        action: action.to_string(),
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
