//! Configuration management for netcup-ddns.

use crate::api::Credentials;
use crate::error::{DdnsError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// netcup customer number (or `$ENV_VAR`).
    pub customer_number: String,

    /// API key (or `$ENV_VAR`).
    pub api_key: String,

    /// API password (or `$ENV_VAR`).
    pub api_password: String,

    /// Domain whose zone is managed.
    pub domain: String,

    /// Lower the zone TTL to 300 seconds when it differs.
    #[serde(default)]
    pub change_ttl: bool,

    /// Location of the IP cache (default: `<temp dir>/ipcache`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<PathBuf>,

    #[serde(default)]
    pub ipv4: Ipv4Config,

    #[serde(default)]
    pub ipv6: Ipv6Config,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub containers: ContainerConfig,
}

/// A-record settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ipv4Config {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hosts to update, written comma-separated (`"@, www"`).
    #[serde(
        default = "default_hosts",
        deserialize_with = "deserialize_hosts",
        serialize_with = "serialize_hosts"
    )]
    pub hosts: Vec<String>,

    /// Ask this UPnP gateway for the external address first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

/// AAAA-record settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ipv6Config {
    #[serde(default)]
    pub enabled: bool,

    #[serde(
        default = "default_hosts",
        deserialize_with = "deserialize_hosts",
        serialize_with = "serialize_hosts"
    )]
    pub hosts: Vec<String>,

    /// Interface whose global addresses are considered.
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Drop candidates with an EUI-64 interface identifier.
    #[serde(default = "default_true")]
    pub exclude_privacy_extensions: bool,
}

/// Operator notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Mail warnings and errors to this address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_recipient: Option<String>,
}

/// Containers to restart after an address change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(default)]
    pub restart: bool,

    #[serde(default)]
    pub names: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_hosts() -> Vec<String> {
    vec!["@".to_string()]
}

fn default_interface() -> String {
    "eth0".to_string()
}

impl Default for Ipv4Config {
    fn default() -> Self {
        Self {
            enabled: true,
            hosts: default_hosts(),
            gateway: None,
        }
    }
}

impl Default for Ipv6Config {
    fn default() -> Self {
        Self {
            enabled: false,
            hosts: default_hosts(),
            interface: default_interface(),
            exclude_privacy_extensions: true,
        }
    }
}

/// Split a comma-separated host list, trimming entries and dropping empty ones.
pub fn parse_host_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_hosts<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hosts {
        List(String),
        Array(Vec<String>),
    }

    Ok(match Hosts::deserialize(deserializer)? {
        Hosts::List(list) => parse_host_list(&list),
        Hosts::Array(hosts) => hosts
            .iter()
            .flat_map(|entry| parse_host_list(entry))
            .collect(),
    })
}

fn serialize_hosts<S>(hosts: &[String], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hosts.join(", "))
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("netcup-ddns").join("config.toml"))
    }

    /// Find the config file: explicit path, else the first existing default location.
    pub fn locate(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(path) = explicit {
            return path;
        }

        let candidates = [
            dirs::config_dir().map(|p| p.join("netcup-ddns/config.toml")),
            Some(PathBuf::from("/etc/netcup-ddns/config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for candidate in candidates.iter().flatten() {
            if candidate.exists() {
                return candidate.clone();
            }
        }

        Self::default_path().unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// Load, resolve secrets and validate a configuration file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DdnsError::Config(format!(
                "Could not open config file at \"{}\". Please provide a valid config file",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.resolve_secrets()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Replace `$VAR` references in credentials with environment values.
    ///
    /// A reference to an unset variable is a configuration error.
    pub fn resolve_secrets(&mut self) -> Result<()> {
        self.customer_number = resolve_env(&self.customer_number)?;
        self.api_key = resolve_env(&self.api_key)?;
        self.api_password = resolve_env(&self.api_password)?;
        Ok(())
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("customer_number", &self.customer_number),
            ("api_key", &self.api_key),
            ("api_password", &self.api_password),
            ("domain", &self.domain),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(DdnsError::Config(format!("{} must not be empty", name)));
            }
        }

        if self.ipv4.enabled && self.ipv4.hosts.is_empty() {
            return Err(DdnsError::Config(
                "ipv4.hosts must name at least one host".to_string(),
            ));
        }
        if self.ipv6.enabled && self.ipv6.hosts.is_empty() {
            return Err(DdnsError::Config(
                "ipv6.hosts must name at least one host".to_string(),
            ));
        }
        if self.ipv6.enabled && self.ipv6.interface.trim().is_empty() {
            return Err(DdnsError::Config(
                "ipv6.interface must not be empty".to_string(),
            ));
        }
        if self.containers.restart && self.containers.names.is_empty() {
            return Err(DdnsError::Config(
                "containers.names must list at least one container".to_string(),
            ));
        }

        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            customer_number: self.customer_number.clone(),
            api_key: self.api_key.clone(),
            api_password: self.api_password.clone(),
        }
    }

    /// Generate example configuration.
    pub fn example() -> Self {
        Self {
            customer_number: "$NETCUP_CUSTOMER_NUMBER".to_string(),
            api_key: "$NETCUP_API_KEY".to_string(),
            api_password: "$NETCUP_API_PASSWORD".to_string(),
            domain: "example.com".to_string(),
            change_ttl: true,
            cache_file: None,
            ipv4: Ipv4Config {
                enabled: true,
                hosts: vec!["@".to_string(), "www".to_string()],
                gateway: None,
            },
            ipv6: Ipv6Config {
                enabled: false,
                hosts: default_hosts(),
                interface: default_interface(),
                exclude_privacy_extensions: true,
            },
            notify: NotifyConfig::default(),
            containers: ContainerConfig::default(),
        }
    }
}

/// Resolve environment variable references (values starting with $).
fn resolve_env(value: &str) -> Result<String> {
    match value.strip_prefix('$') {
        Some(var_name) => std::env::var(var_name).map_err(|_| {
            DdnsError::Config(format!(
                "Environment variable {} referenced in config file is not set",
                var_name
            ))
        }),
        None => Ok(value.to_string()),
    }
}
