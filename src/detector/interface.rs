//! IPv6 addresses bound to a local network interface.

use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use std::net::Ipv6Addr;

/// Remaining valid lifetime of an interface address.
///
/// Ordering is what address selection relies on: an unreadable lifetime ranks
/// below every finite one, and `forever` ranks above all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifetime {
    Unknown,
    Seconds(u64),
    Forever,
}

impl Lifetime {
    /// Parse an `ip` lifetime token such as `86385sec` or `forever`.
    pub fn parse(token: &str) -> Self {
        if token == "forever" {
            return Lifetime::Forever;
        }
        token
            .strip_suffix("sec")
            .and_then(|secs| secs.parse().ok())
            .map(Lifetime::Seconds)
            .unwrap_or(Lifetime::Unknown)
    }
}

/// A globally scoped address reported for an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub address: Ipv6Addr,
    pub valid_lifetime: Lifetime,
}

/// Source of the IPv6 addresses bound to an interface.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Global-scope addresses of `interface`, in the order the host lists them.
    async fn global_addresses(&self, interface: &str) -> Result<Vec<InterfaceAddress>>;
}

/// Reads addresses via `ip -6 addr show dev <interface> scope global`.
pub struct IpCommand {
    program: String,
}

impl IpCommand {
    pub fn new() -> Self {
        Self::with_program("ip")
    }

    /// Use a different `ip` binary (e.g. an absolute path).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for IpCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressSource for IpCommand {
    async fn global_addresses(&self, interface: &str) -> Result<Vec<InterfaceAddress>> {
        let output = tokio::process::Command::new(&self.program)
            .args(["-6", "addr", "show", "dev", interface, "scope", "global"])
            .output()
            .await?;

        if !output.status.success() {
            return Err(DdnsError::IpDetection(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(parse_ip_addr_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse the text output of `ip -6 addr show`.
///
/// Each `inet6` line is paired with the `valid_lft` token of the line that
/// follows it. Lines that do not parse are skipped.
pub fn parse_ip_addr_output(text: &str) -> Vec<InterfaceAddress> {
    let mut addresses = Vec::new();
    let mut pending: Option<Ipv6Addr> = None;

    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("inet6 ") {
            if let Some(address) = pending.take() {
                addresses.push(InterfaceAddress {
                    address,
                    valid_lifetime: Lifetime::Unknown,
                });
            }
            pending = rest
                .split_whitespace()
                .next()
                .and_then(|cidr| cidr.split('/').next())
                .and_then(|addr| addr.parse().ok());
        } else if let Some(rest) = line.strip_prefix("valid_lft ") {
            if let Some(address) = pending.take() {
                let token = rest.split_whitespace().next().unwrap_or_default();
                addresses.push(InterfaceAddress {
                    address,
                    valid_lifetime: Lifetime::parse(token),
                });
            }
        }
    }

    if let Some(address) = pending {
        addresses.push(InterfaceAddress {
            address,
            valid_lifetime: Lifetime::Unknown,
        });
    }

    addresses
}

/// Pick the candidate with the longest remaining lifetime; the first one wins ties.
pub fn select_longest_valid(candidates: &[InterfaceAddress]) -> Option<Ipv6Addr> {
    let mut best: Option<&InterfaceAddress> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.valid_lifetime <= current.valid_lifetime => {}
            _ => best = Some(candidate),
        }
    }
    best.map(|c| c.address)
}
