//! netcup CCP DNS API wire types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status string the API uses for successful responses.
pub const STATUS_SUCCESS: &str = "success";

/// "The session id is not in a valid format" (expired or unknown session).
pub const STATUS_SESSION_INVALID: u32 = 4001;

/// Validation error on login, usually wrong credentials or a throttled key.
pub const STATUS_VALIDATION_ERROR: u32 = 4013;

/// Remote API actions used by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Logout,
    InfoDnsZone,
    InfoDnsRecords,
    UpdateDnsZone,
    UpdateDnsRecords,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::Logout => "logout",
            Action::InfoDnsZone => "infoDnsZone",
            Action::InfoDnsRecords => "infoDnsRecords",
            Action::UpdateDnsZone => "updateDnsZone",
            Action::UpdateDnsRecords => "updateDnsRecords",
        }
    }

    /// Gerund used in error lines ("Error while <...>").
    pub fn describe(&self) -> &'static str {
        match self {
            Action::Login => "logging in",
            Action::Logout => "logging out",
            Action::InfoDnsZone => "getting DNS Zone info",
            Action::InfoDnsRecords => "getting DNS Record info",
            Action::UpdateDnsZone => "updating DNS Zone",
            Action::UpdateDnsRecords => "updating DNS Records",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request envelope: `{ "action": ..., "param": { ... } }`.
#[derive(Debug, Serialize)]
pub struct ApiRequest<'a> {
    pub action: &'a str,
    pub param: &'a Map<String, Value>,
}

/// Response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub statuscode: u32,
    #[serde(default)]
    pub shortmessage: Option<String>,
    #[serde(default)]
    pub longmessage: Option<String>,
    /// An empty string on failures, an object on success.
    #[serde(default)]
    pub responsedata: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Long message, falling back to the short one.
    pub fn message(&self) -> String {
        self.longmessage
            .as_deref()
            .or(self.shortmessage.as_deref())
            .unwrap_or("no message from API")
            .to_string()
    }
}

/// DNS zone settings returned by `infoDnsZone`.
///
/// Only the TTL is interpreted; all other fields are passed back unchanged
/// on `updateDnsZone`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsZone {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub ttl: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl DnsZone {
    pub fn ttl_seconds(&self) -> Option<u32> {
        self.ttl.trim().parse().ok()
    }

    pub fn set_ttl(&mut self, ttl: u32) {
        self.ttl = ttl.to_string();
    }
}

/// A DNS resource record as the API represents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Absent for records that do not exist yet.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    pub hostname: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string_or_number")]
    pub priority: Option<String>,
    pub destination: String,
    #[serde(default)]
    pub deleterecord: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// `responsedata` of `infoDnsRecords`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DnsRecordSet {
    #[serde(default)]
    pub dnsrecords: Vec<DnsRecord>,
}

/// The API is inconsistent about quoting numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
