//! # netcup-ddns
//!
//! A dynamic DNS client for the netcup CCP DNS API.
//!
//! ## Features
//!
//! - Public IPv4 detection via echo services or a UPnP gateway
//! - Public IPv6 detection from a local interface, with lifetime-based selection
//! - Local IP cache: the API is only contacted when an address changed
//! - A/AAAA record creation and update for any number of hosts
//! - Automatic re-login on expired sessions and bounded transport retry
//! - Optional zone TTL management, mail notification and container restart
//!
//! ## Usage
//!
//! ```bash
//! # Run once with the default config file
//! netcup-ddns
//!
//! # Only print warnings and errors (for cron)
//! netcup-ddns --quiet
//!
//! # Set a specific address
//! netcup-ddns -4 203.0.113.5
//!
//! # Print an example config
//! netcup-ddns --print-config
//! ```

pub mod address;
pub mod api;
pub mod cache;
pub mod config;
pub mod containers;
pub mod detector;
pub mod error;
pub mod logging;
pub mod notify;
pub mod reconcile;
pub mod updater;

#[cfg(test)]
mod testutil;

pub use api::{ApiClient, HttpTransport};
pub use cache::IpCache;
pub use config::Config;
pub use detector::IpDetector;
pub use error::{DdnsError, Result};
pub use updater::{RunConfig, RunOutcome, Updater};
