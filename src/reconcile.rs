//! Matching desired hostnames against the zone's record set.

use crate::address::RecordType;
use crate::api::{ApiClient, DnsRecord, Transport};
use crate::cache::IpCache;
use crate::error::{DdnsError, Result};
use std::net::IpAddr;

/// Destination of a record that does not exist yet.
pub const PLACEHOLDER_DESTINATION: &str = "newly created Record";

/// Desired state: every host in `hosts` points at `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationTarget {
    pub hosts: Vec<String>,
    pub record_type: RecordType,
    pub address: IpAddr,
}

impl ReconciliationTarget {
    pub fn new(hosts: Vec<String>, address: IpAddr) -> Self {
        Self {
            hosts,
            record_type: RecordType::for_ip(&address),
            address,
        }
    }
}

/// What has to happen for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPlan {
    Unchanged {
        hostname: String,
    },
    Update {
        /// The record with its new destination.
        record: DnsRecord,
        previous: String,
    },
}

/// Outcome counters of one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub unchanged: usize,
    pub updated: usize,
    pub failed: usize,
}

impl std::ops::AddAssign for ReconcileReport {
    fn add_assign(&mut self, other: Self) {
        self.unchanged += other.unchanged;
        self.updated += other.updated;
        self.failed += other.failed;
    }
}

/// Decide per host whether its record is current, needs an update or must be created.
///
/// Fails without planning anything if a host matches more than one record of
/// the target type.
pub fn plan(records: &[DnsRecord], target: &ReconciliationTarget) -> Result<Vec<HostPlan>> {
    let record_type = target.record_type.as_str();
    let mut plans = Vec::with_capacity(target.hosts.len());

    for host in &target.hosts {
        let matches: Vec<&DnsRecord> = records
            .iter()
            .filter(|r| r.hostname == *host && r.record_type == record_type)
            .collect();

        let record = match matches.as_slice() {
            [] => {
                tracing::info!(
                    "{} record for host {} doesn't exist, creating necessary DNS record.",
                    record_type,
                    host
                );
                DnsRecord {
                    id: None,
                    hostname: host.clone(),
                    record_type: record_type.to_string(),
                    priority: None,
                    destination: PLACEHOLDER_DESTINATION.to_string(),
                    deleterecord: false,
                    state: None,
                }
            }
            [single] => (*single).clone(),
            many => {
                let err = DdnsError::AmbiguousRecord {
                    hostname: host.clone(),
                    record_type: record_type.to_string(),
                    count: many.len(),
                };
                tracing::error!("{}", err);
                return Err(err);
            }
        };

        if points_at(&record.destination, &target.address) {
            plans.push(HostPlan::Unchanged {
                hostname: host.clone(),
            });
        } else {
            let previous = record.destination.clone();
            let mut record = record;
            record.destination = target.address.to_string();
            plans.push(HostPlan::Update { record, previous });
        }
    }

    Ok(plans)
}

/// Plan and submit updates for `target`.
///
/// A rejected update clears the cache and moves on to the next host. Running
/// out of transport retries aborts.
pub async fn reconcile<T: Transport>(
    api: &mut ApiClient<T>,
    domain: &str,
    records: &[DnsRecord],
    target: &ReconciliationTarget,
    cache: &IpCache,
) -> Result<ReconcileReport> {
    let family = target.record_type.family();
    let mut report = ReconcileReport::default();

    for host_plan in plan(records, target)? {
        match host_plan {
            HostPlan::Unchanged { hostname } => {
                tracing::info!(
                    "{} for host {} address hasn't changed. Current {} address: {}",
                    family,
                    hostname,
                    family,
                    target.address
                );
                report.unchanged += 1;
            }
            HostPlan::Update { record, previous } => {
                tracing::info!(
                    "{} address for host {} has changed. Before: {}; Now: {}",
                    family,
                    record.hostname,
                    previous,
                    target.address
                );
                match api.update_records(domain, std::slice::from_ref(&record)).await {
                    Ok(()) => {
                        tracing::info!("{} address updated successfully!", family);
                        report.updated += 1;
                    }
                    Err(e @ DdnsError::TransportExhausted { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(
                            "Update of {} failed ({}); clearing IP cache for a full check next run.",
                            record.hostname,
                            e
                        );
                        cache.clear();
                        report.failed += 1;
                    }
                }
            }
        }
    }

    Ok(report)
}

/// Whether a record destination already names `address`.
fn points_at(destination: &str, address: &IpAddr) -> bool {
    destination
        .trim()
        .parse::<IpAddr>()
        .map(|current| current == *address)
        .unwrap_or(false)
}
