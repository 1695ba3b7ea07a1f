//! Local cache of the last published address pair.
//!
//! File format:
//!
//! ```json
//! { "ipv4": "203.0.113.5", "ipv6": "", "timestamp": "2026-10-14 09:30:00" }
//! ```
//!
//! An empty string marks a family without a known address.

use crate::error::Result;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = "ipcache";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Last observed address pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpCacheEntry {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub observed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    ipv4: String,
    #[serde(default)]
    ipv6: String,
    #[serde(default)]
    timestamp: String,
}

impl From<CacheFile> for IpCacheEntry {
    fn from(file: CacheFile) -> Self {
        Self {
            ipv4: file.ipv4.parse().ok(),
            ipv6: file.ipv6.parse().ok(),
            observed_at: NaiveDateTime::parse_from_str(&file.timestamp, TIMESTAMP_FORMAT).ok(),
        }
    }
}

/// The cache file at one well-known path.
#[derive(Debug, Clone)]
pub struct IpCache {
    path: PathBuf,
}

impl IpCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<temp dir>/ipcache`.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(CACHE_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache. Missing or unreadable files yield `None`.
    pub fn load(&self) -> Option<IpCacheEntry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No ip cache available");
                return None;
            }
            Err(e) => {
                tracing::warn!("Could not read IP cache {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<CacheFile>(&content) {
            Ok(file) => Some(file.into()),
            Err(e) => {
                tracing::warn!("Could not parse IP cache: {}", e);
                None
            }
        }
    }

    /// Overwrite the cache with a new pair stamped with the current local time.
    ///
    /// The file is written next to its final location and renamed into place.
    pub fn save(&self, ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>) -> Result<()> {
        let file = CacheFile {
            ipv4: ipv4.map(|ip| ip.to_string()).unwrap_or_default(),
            ipv6: ipv6.map(|ip| ip.to_string()).unwrap_or_default(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        };
        let content = serde_json::to_string(&file)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!("Wrote IP cache {}", self.path.display());
        Ok(())
    }

    /// Remove the cache so the next run starts from scratch.
    pub fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Cleared IP cache {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not clear IP cache {}: {}", self.path.display(), e),
        }
    }
}
