//! Public IP detection.
//!
//! IPv4 comes from an external echo service (primary, then one fallback) or,
//! when a gateway is configured, from its UPnP WAN IP service. IPv6 comes from
//! the global addresses bound to a local interface. Every failure here is
//! logged and reported as `None`; callers decide what a missing address means.

pub mod gateway;
pub mod interface;


pub use interface::{AddressSource, InterfaceAddress, IpCommand, Lifetime};

use crate::address::{has_eui64_marker, is_public_ipv6, parse_public_ipv4};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

pub const DEFAULT_PRIMARY_IPV4: &str = "https://api.ipify.org";
pub const DEFAULT_FALLBACK_IPV4: &str = "https://ip4.seeip.org";

/// Resolves the host's current public addresses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublicIpResolver: Send + Sync {
    /// Current public IPv4 address, if any source produced a valid one.
    async fn resolve_ipv4(&self) -> Option<Ipv4Addr>;

    /// Current public IPv6 address bound to `interface`.
    async fn resolve_ipv6(
        &self,
        interface: &str,
        exclude_privacy_extensions: bool,
    ) -> Option<Ipv6Addr>;
}

/// IP detector with an echo-service fallback chain.
pub struct IpDetector<S = IpCommand> {
    client: reqwest::Client,
    primary: String,
    fallback: String,
    gateway_url: Option<String>,
    addresses: S,
}

impl IpDetector<IpCommand> {
    /// Create a detector using the default echo services and `ip` command.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| DdnsError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            primary: DEFAULT_PRIMARY_IPV4.to_string(),
            fallback: DEFAULT_FALLBACK_IPV4.to_string(),
            gateway_url: None,
            addresses: IpCommand::new(),
        })
    }
}

impl<S: AddressSource> IpDetector<S> {
    /// Use custom echo services.
    pub fn with_endpoints(mut self, primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.primary = primary.into();
        self.fallback = fallback.into();
        self
    }

    /// Ask the gateway at this UPnP control URL before the echo services.
    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = Some(url.into());
        self
    }

    /// Read interface addresses from another source.
    pub fn with_address_source<T: AddressSource>(self, addresses: T) -> IpDetector<T> {
        IpDetector {
            client: self.client,
            primary: self.primary,
            fallback: self.fallback,
            gateway_url: self.gateway_url,
            addresses,
        }
    }

    async fn from_gateway(&self, url: &str) -> Option<Ipv4Addr> {
        let body = match gateway::query(&self.client, url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Gateway query to {} failed: {}", url, e);
                return None;
            }
        };

        match gateway::extract_addresses(&body).as_slice() {
            [single] => parse_public_ipv4(single),
            other => {
                tracing::debug!("Gateway returned {} address tags", other.len());
                None
            }
        }
    }

    async fn from_echo_services(&self) -> Option<Ipv4Addr> {
        if let Some(ip) = self.try_endpoint(&self.primary).await {
            return Some(ip);
        }

        tracing::warn!(
            "{} didn't return a valid IPv4 address. Trying fallback API {}",
            self.primary,
            self.fallback
        );

        if let Some(ip) = self.try_endpoint(&self.fallback).await {
            return Some(ip);
        }

        tracing::warn!("{} didn't return a valid IPv4 address.", self.fallback);
        None
    }

    /// Try a single echo service; anything but a public IPv4 counts as a miss.
    async fn try_endpoint(&self, url: &str) -> Option<Ipv4Addr> {
        match self.fetch(url).await {
            Ok(text) => {
                let ip = parse_public_ipv4(&text);
                if ip.is_none() {
                    tracing::debug!("Rejected response {:?} from {}", text.trim(), url);
                }
                ip
            }
            Err(e) => {
                tracing::debug!("Service {} failed: {}", url, e);
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DdnsError::IpDetection(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl<S: AddressSource> PublicIpResolver for IpDetector<S> {
    async fn resolve_ipv4(&self) -> Option<Ipv4Addr> {
        if let Some(url) = &self.gateway_url {
            if let Some(ip) = self.from_gateway(url).await {
                tracing::debug!("Detected IPv4 {} from gateway {}", ip, url);
                return Some(ip);
            }
            tracing::warn!(
                "Can't get public IP from gateway at {}. Falling back to {}.",
                url,
                self.primary
            );
        }

        self.from_echo_services().await
    }

    async fn resolve_ipv6(
        &self,
        interface: &str,
        exclude_privacy_extensions: bool,
    ) -> Option<Ipv6Addr> {
        let addresses = match self.addresses.global_addresses(interface).await {
            Ok(addresses) => addresses,
            Err(e) => {
                tracing::warn!("Could not read IPv6 addresses of {}: {}", interface, e);
                return None;
            }
        };

        let candidates: Vec<InterfaceAddress> = addresses
            .into_iter()
            .filter(|a| is_public_ipv6(&a.address))
            .filter(|a| !(exclude_privacy_extensions && has_eui64_marker(&a.address)))
            .collect();

        match candidates.as_slice() {
            [] => {
                tracing::warn!("Device didn't return a valid IPv6 address.");
                None
            }
            [single] => Some(single.address),
            many => {
                tracing::debug!("{} IPv6 candidates on {}", many.len(), interface);
                interface::select_longest_valid(many)
            }
        }
    }
}
