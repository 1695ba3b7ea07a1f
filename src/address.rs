//! Public address validation and record type mapping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Bit offset of the `ff:fe` filler inside a modified EUI-64 interface identifier.
const EUI64_MARKER_OFFSET: u32 = 88;
const EUI64_MARKER: u128 = 0xFFFE;

/// DNS record type managed by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    A,
    #[allow(clippy::upper_case_acronyms)]
    AAAA,
}

impl RecordType {
    /// Record type for an address: IPv6 maps to AAAA, everything else to A.
    pub fn for_ip(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V6(_) => RecordType::AAAA,
            IpAddr::V4(_) => RecordType::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
        }
    }

    /// Human label of the address family ("IPv4"/"IPv6").
    pub fn family(&self) -> &'static str {
        match self {
            RecordType::A => "IPv4",
            RecordType::AAAA => "IPv6",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an IPv4 address is outside every private and reserved range.
pub fn is_public_ipv4(ip: &Ipv4Addr) -> bool {
    let [first, second, ..] = ip.octets();

    let this_network = first == 0;
    let shared = first == 100 && (second & 0b1100_0000) == 64;
    let reserved = first >= 240;

    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || this_network
        || shared
        || reserved)
}

/// Whether an IPv6 address is outside every private and reserved range.
pub fn is_public_ipv6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];

    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    let site_local = (first & 0xffc0) == 0xfec0;

    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        || ip.to_ipv4_mapped().is_some()
        || unique_local
        || link_local
        || site_local)
}

/// Parse and validate a textual public IPv4 address.
pub fn parse_public_ipv4(text: &str) -> Option<Ipv4Addr> {
    text.trim()
        .parse::<Ipv4Addr>()
        .ok()
        .filter(is_public_ipv4)
}

/// Parse and validate a textual public IPv6 address.
pub fn parse_public_ipv6(text: &str) -> Option<Ipv6Addr> {
    text.trim()
        .parse::<Ipv6Addr>()
        .ok()
        .filter(is_public_ipv6)
}

/// Whether an IPv6 address carries the EUI-64 `ff:fe` marker.
///
/// The address is read as a 128-bit string; the marker counts only when its
/// first occurrence starts at bit 88, i.e. the middle of the interface
/// identifier. Candidates carrying it are dropped when privacy-extension
/// exclusion is enabled.
pub fn has_eui64_marker(ip: &Ipv6Addr) -> bool {
    let bits = u128::from(*ip);
    let first = (0..=112u32).find(|offset| (bits >> (112 - offset)) & 0xFFFF == EUI64_MARKER);
    first == Some(EUI64_MARKER_OFFSET)
}
