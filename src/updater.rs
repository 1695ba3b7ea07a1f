//! One update run: resolve, compare against the cache, reconcile if needed.

use crate::address::{parse_public_ipv4, parse_public_ipv6};
use crate::api::{ApiClient, DnsZone, Transport};
use crate::cache::IpCache;
use crate::config::Config;
use crate::detector::PublicIpResolver;
use crate::error::{DdnsError, Result};
use crate::reconcile::{reconcile, ReconcileReport, ReconciliationTarget};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Zone TTL applied when TTL management is enabled.
pub const TARGET_TTL: u32 = 300;

/// Settings of one enabled address family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyTarget<A> {
    pub hosts: Vec<String>,
    /// Address given on the command line; skips discovery.
    pub manual: Option<A>,
}

impl<A> FamilyTarget<A> {
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            hosts,
            manual: None,
        }
    }
}

/// Everything a run needs to know, fixed before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub domain: String,
    pub change_ttl: bool,
    /// `None` when the family is disabled.
    pub ipv4: Option<FamilyTarget<Ipv4Addr>>,
    pub ipv6: Option<FamilyTarget<Ipv6Addr>>,
    pub ipv6_interface: String,
    pub exclude_privacy_extensions: bool,
}

impl RunConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            domain: config.domain.clone(),
            change_ttl: config.change_ttl,
            ipv4: config
                .ipv4
                .enabled
                .then(|| FamilyTarget::new(config.ipv4.hosts.clone())),
            ipv6: config
                .ipv6
                .enabled
                .then(|| FamilyTarget::new(config.ipv6.hosts.clone())),
            ipv6_interface: config.ipv6.interface.clone(),
            exclude_privacy_extensions: config.ipv6.exclude_privacy_extensions,
        }
    }

    /// Use `raw` instead of discovering the IPv4 address.
    pub fn with_manual_ipv4(mut self, raw: &str) -> Result<Self> {
        let ip = parse_public_ipv4(raw).ok_or_else(|| {
            DdnsError::InvalidAddress(format!(
                "Manually provided IPv4 address \"{}\" is invalid.",
                raw
            ))
        })?;
        match self.ipv4.as_mut() {
            Some(family) => family.manual = Some(ip),
            None => tracing::warn!("IPv4 is disabled, ignoring manually provided address {}", ip),
        }
        Ok(self)
    }

    /// Use `raw` instead of discovering the IPv6 address.
    pub fn with_manual_ipv6(mut self, raw: &str) -> Result<Self> {
        let ip = parse_public_ipv6(raw).ok_or_else(|| {
            DdnsError::InvalidAddress(format!(
                "Manually provided IPv6 address \"{}\" is invalid.",
                raw
            ))
        })?;
        match self.ipv6.as_mut() {
            Some(family) => family.manual = Some(ip),
            None => tracing::warn!("IPv6 is disabled, ignoring manually provided address {}", ip),
        }
        Ok(self)
    }
}

/// What a run observed and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub ipv4_changed: bool,
    pub ipv6_changed: bool,
    pub report: ReconcileReport,
}

impl RunOutcome {
    /// Whether any family differed from the cache.
    pub fn changed(&self) -> bool {
        self.ipv4_changed || self.ipv6_changed
    }
}

/// Drives one run against a resolver, an API client and the cache.
pub struct Updater<R, T> {
    config: RunConfig,
    resolver: R,
    api: ApiClient<T>,
    cache: IpCache,
}

impl<R: PublicIpResolver, T: Transport> Updater<R, T> {
    pub fn new(config: RunConfig, resolver: R, api: ApiClient<T>, cache: IpCache) -> Self {
        Self {
            config,
            resolver,
            api,
            cache,
        }
    }

    /// Run once.
    ///
    /// The cache is read at the start and written at the end. Any fatal error
    /// after the API phase started clears it instead.
    pub async fn run(&mut self) -> Result<RunOutcome> {
        let cached = self.cache.load();
        let mut outcome = RunOutcome::default();
        let domain = self.config.domain.clone();

        if let Some(family) = self.config.ipv4.clone() {
            log_family_start("A", &family.hosts, &domain);
            outcome.ipv4 = match family.manual {
                Some(ip) => {
                    tracing::info!("Using manually provided IPv4 address \"{}\"", ip);
                    Some(ip)
                }
                None => self.resolver.resolve_ipv4().await,
            };
            outcome.ipv4_changed =
                has_changed("IPv4", cached.as_ref().map(|e| e.ipv4), outcome.ipv4);
        }

        if let Some(family) = self.config.ipv6.clone() {
            log_family_start("AAAA", &family.hosts, &domain);
            outcome.ipv6 = match family.manual {
                Some(ip) => {
                    tracing::info!("Using manually provided IPv6 address \"{}\"", ip);
                    Some(ip)
                }
                None => {
                    self.resolver
                        .resolve_ipv6(
                            &self.config.ipv6_interface,
                            self.config.exclude_privacy_extensions,
                        )
                        .await
                }
            };
            outcome.ipv6_changed =
                has_changed("IPv6", cached.as_ref().map(|e| e.ipv6), outcome.ipv6);
        }

        if !outcome.changed() {
            tracing::debug!("No address changed, skipping API");
            return Ok(outcome);
        }

        match self.apply(&mut outcome).await {
            // A rejected record update already cleared the cache; writing it
            // again would hide the failure from the next run.
            Ok(()) if outcome.report.failed > 0 => {
                tracing::warn!(
                    "{} record update(s) failed, IP cache not written.",
                    outcome.report.failed
                );
                Ok(outcome)
            }
            Ok(()) => {
                // A family that could not be resolved keeps its cached address.
                let ipv4 = outcome
                    .ipv4
                    .or_else(|| cached.as_ref().and_then(|e| e.ipv4));
                let ipv6 = outcome
                    .ipv6
                    .or_else(|| cached.as_ref().and_then(|e| e.ipv6));
                self.cache.save(ipv4, ipv6)?;
                Ok(outcome)
            }
            Err(e) => {
                self.cache.clear();
                Err(e)
            }
        }
    }

    async fn apply(&mut self, outcome: &mut RunOutcome) -> Result<()> {
        let domain = self.config.domain.clone();

        self.api.login().await?;
        let zone = self.api.info_zone(&domain).await?;
        let records = self.api.info_records(&domain).await?;
        self.manage_ttl(&domain, zone).await?;

        let mut targets = Vec::new();
        if let (true, Some(family), Some(ip)) =
            (outcome.ipv4_changed, &self.config.ipv4, outcome.ipv4)
        {
            targets.push(ReconciliationTarget::new(family.hosts.clone(), IpAddr::V4(ip)));
        }
        if let (true, Some(family), Some(ip)) =
            (outcome.ipv6_changed, &self.config.ipv6, outcome.ipv6)
        {
            targets.push(ReconciliationTarget::new(family.hosts.clone(), IpAddr::V6(ip)));
        }

        for target in &targets {
            outcome.report +=
                reconcile(&mut self.api, &domain, &records, target, &self.cache).await?;
        }

        self.api.logout().await?;
        Ok(())
    }

    async fn manage_ttl(&mut self, domain: &str, mut zone: DnsZone) -> Result<()> {
        let ttl = zone.ttl_seconds();

        if !self.config.change_ttl {
            if ttl.is_some_and(|ttl| ttl > TARGET_TTL) {
                tracing::info!(
                    "TTL is higher than {} seconds - this is not optimal for dynamic DNS, since DNS updates will take a long time. Ideally, change TTL to lower value. You may set change_ttl = true in the config file, in which case TTL will be set to {} seconds automatically.",
                    TARGET_TTL,
                    TARGET_TTL
                );
            }
            return Ok(());
        }

        if ttl == Some(TARGET_TTL) {
            return Ok(());
        }

        zone.set_ttl(TARGET_TTL);
        match self.api.update_zone(domain, &zone).await {
            Ok(()) => tracing::info!("Lowered TTL to {} seconds successfully.", TARGET_TTL),
            Err(e @ DdnsError::TransportExhausted { .. }) => return Err(e),
            Err(_) => tracing::error!("Failed to set TTL... Continuing."),
        }
        Ok(())
    }
}

fn log_family_start(record_type: &str, hosts: &[String], domain: &str) {
    tracing::info!(
        "Updating DNS records for host(s) '{}' ({} record) on domain {}",
        hosts.join(", "),
        record_type,
        domain
    );
}

/// Compare a resolved address against its cached value.
///
/// No resolved address never counts as a change. No cache always does.
fn has_changed<A>(family: &str, cached: Option<Option<A>>, current: Option<A>) -> bool
where
    A: PartialEq + fmt::Display,
{
    let Some(current) = current else {
        return false;
    };

    match cached {
        None => true,
        Some(Some(before)) if before == current => {
            tracing::info!(
                "{} address hasn't changed according to local IP cache. Current {} address: {}",
                family,
                family,
                current
            );
            false
        }
        Some(before) => {
            tracing::info!(
                "{} address has changed according to local IP cache. Before: {}; Now: {}",
                family,
                before.map(|ip| ip.to_string()).unwrap_or_default(),
                current
            );
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Credentials;
    use crate::detector::MockPublicIpResolver;
    use crate::logging::report_fatal;
    use crate::notify::NotifyLayer;
    use crate::testutil::{
        actions, failure, login_ok, records_ok, scripted, success, zone_ok, RecordingNotifier,
    };
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::time::Instant;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    const HOME_V4: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 5);

    fn credentials() -> Credentials {
        Credentials {
            customer_number: "12345".to_string(),
            api_key: "key".to_string(),
            api_password: "secret".to_string(),
        }
    }

    fn run_config(ipv4_hosts: &[&str], ipv6_hosts: Option<&[&str]>) -> RunConfig {
        let hosts = |hosts: &[&str]| hosts.iter().map(|h| h.to_string()).collect();
        RunConfig {
            domain: "example.com".to_string(),
            change_ttl: false,
            ipv4: Some(FamilyTarget::new(hosts(ipv4_hosts))),
            ipv6: ipv6_hosts.map(|h| FamilyTarget::new(hosts(h))),
            ipv6_interface: "eth0".to_string(),
            exclude_privacy_extensions: true,
        }
    }

    fn resolver(ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>) -> MockPublicIpResolver {
        let mut resolver = MockPublicIpResolver::new();
        resolver.expect_resolve_ipv4().returning(move || ipv4);
        resolver.expect_resolve_ipv6().returning(move |_, _| ipv6);
        resolver
    }

    fn a_record(id: &str, hostname: &str, destination: &str) -> Value {
        json!({"id": id, "hostname": hostname, "type": "A", "priority": "0",
               "destination": destination, "deleterecord": false, "state": "yes"})
    }

    fn refused() -> Result<Value> {
        Err(DdnsError::Network("connection refused".to_string()))
    }

    #[tokio::test]
    async fn test_cold_cache_creates_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        let (transport, log) = scripted(vec![
            login_ok("sess"),
            zone_ok("300"),
            records_ok(json!([a_record("1", "www", "198.51.100.1")])),
            success("updateDnsRecords", json!({})),
            success("logout", json!("")),
        ]);

        let mut updater = Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        );
        let outcome = updater.run().await.unwrap();

        assert!(outcome.ipv4_changed);
        assert_eq!(outcome.report.updated, 1);
        assert_eq!(
            actions(&log),
            vec!["login", "infoDnsZone", "infoDnsRecords", "updateDnsRecords", "logout"]
        );

        let update = &log.lock().unwrap()[3];
        let record = &update["param"]["dnsrecordset"]["dnsrecords"][0];
        assert_eq!(record["hostname"], "home");
        assert_eq!(record["type"], "A");
        assert_eq!(record["destination"], "203.0.113.5");

        assert_eq!(cache.load().unwrap().ipv4, Some(HOME_V4));
    }

    #[tokio::test]
    async fn test_unchanged_address_skips_api() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        cache.save(Some(HOME_V4), None).unwrap();
        let (transport, log) = scripted(vec![]);

        let mut updater = Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache,
        );
        let outcome = updater.run().await.unwrap();

        assert!(!outcome.changed());
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));

        let (transport, _log) = scripted(vec![
            login_ok("sess"),
            zone_ok("300"),
            records_ok(json!([a_record("1", "home", "198.51.100.1")])),
            success("updateDnsRecords", json!({})),
            success("logout", json!("")),
        ]);
        Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        )
        .run()
        .await
        .unwrap();

        let (transport, log) = scripted(vec![]);
        let outcome = Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache,
        )
        .run()
        .await
        .unwrap();

        assert!(!outcome.changed());
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undetected_address_is_no_change() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        let (transport, log) = scripted(vec![]);

        let outcome = Updater::new(
            run_config(&["home"], None),
            resolver(None, None),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        )
        .run()
        .await
        .unwrap();

        assert!(!outcome.changed());
        assert!(log.lock().unwrap().is_empty());
        assert!(cache.load().is_none());
    }

    #[tokio::test]
    async fn test_ambiguous_records_abort_without_update() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        let (transport, log) = scripted(vec![
            login_ok("sess"),
            zone_ok("300"),
            records_ok(json!([
                a_record("1", "home", "198.51.100.1"),
                a_record("2", "home", "198.51.100.2"),
            ])),
        ]);

        let result = Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        )
        .run()
        .await;

        assert!(matches!(result, Err(DdnsError::AmbiguousRecord { count: 2, .. })));
        assert!(!actions(&log).iter().any(|a| a == "updateDnsRecords"));
        assert!(cache.load().is_none());
    }

    #[tokio::test]
    async fn test_ambiguous_run_mails_one_error() {
        let recording = RecordingNotifier::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(NotifyLayer::new(recording.clone())),
        );

        let dir = tempfile::tempdir().unwrap();
        let (transport, _log) = scripted(vec![
            login_ok("sess"),
            zone_ok("300"),
            records_ok(json!([
                a_record("1", "home", "198.51.100.1"),
                a_record("2", "home", "198.51.100.2"),
            ])),
        ]);

        let err = Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            IpCache::new(dir.path().join("ipcache")),
        )
        .run()
        .await
        .unwrap_err();
        report_fatal(&err);

        assert_eq!(recording.count(Level::ERROR), 1);
        let (_, line) = recording
            .lines()
            .into_iter()
            .find(|(level, _)| *level == Level::ERROR)
            .unwrap();
        assert!(line.contains("Found 2 A records for host home"));
    }

    #[tokio::test]
    async fn test_rejected_login_mails_one_error() {
        let recording = RecordingNotifier::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(NotifyLayer::new(recording.clone())),
        );

        let dir = tempfile::tempdir().unwrap();
        let (transport, _log) = scripted(vec![failure("login", 4013, "Validation Error.")]);

        let err = Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            IpCache::new(dir.path().join("ipcache")),
        )
        .run()
        .await
        .unwrap_err();
        report_fatal(&err);

        assert_eq!(recording.count(Level::ERROR), 1);
    }

    #[test]
    fn test_unreported_error_is_logged_on_exit() {
        let recording = RecordingNotifier::default();
        let subscriber =
            tracing_subscriber::registry().with(NotifyLayer::new(recording.clone()));

        tracing::subscriber::with_default(subscriber, || {
            report_fatal(&DdnsError::Config("Domain is not set".to_string()));
        });

        let lines = recording.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.ends_with("Domain is not set. Exiting."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_transport_exhaustion_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        cache
            .save(Some(Ipv4Addr::new(198, 51, 100, 1)), None)
            .unwrap();
        let (transport, log) = scripted(vec![refused(), refused(), refused()]);

        let started = Instant::now();
        let result = Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        )
        .run()
        .await;

        assert!(matches!(
            result,
            Err(DdnsError::TransportExhausted { attempts: 3, .. })
        ));
        assert_eq!(actions(&log), vec!["login", "login", "login"]);
        assert_eq!(started.elapsed(), Duration::from_secs(60));
        assert!(cache.load().is_none());
    }

    #[tokio::test]
    async fn test_login_failure_clears_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        cache
            .save(Some(Ipv4Addr::new(198, 51, 100, 1)), None)
            .unwrap();
        let (transport, _log) = scripted(vec![failure("login", 4013, "Validation Error.")]);

        let result = Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        )
        .run()
        .await;

        assert!(result.unwrap_err().is_api());
        assert!(!cache.path().exists());
    }

    #[tokio::test]
    async fn test_ttl_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        let (transport, log) = scripted(vec![
            login_ok("sess"),
            zone_ok("86400"),
            records_ok(json!([a_record("1", "home", "198.51.100.1")])),
            failure("updateDnsZone", 4002, "Zone update rejected"),
            success("updateDnsRecords", json!({})),
            success("logout", json!("")),
        ]);

        let mut config = run_config(&["home"], None);
        config.change_ttl = true;
        let outcome = Updater::new(
            config,
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.report.updated, 1);
        assert_eq!(log.lock().unwrap()[3]["param"]["dnszone"]["ttl"], "300");
        assert_eq!(cache.load().unwrap().ipv4, Some(HOME_V4));
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        let (transport, log) = scripted(vec![
            login_ok("sess"),
            zone_ok("300"),
            records_ok(json!([])),
            failure("updateDnsRecords", 5029, "Invalid destination"),
            success("logout", json!("")),
        ]);

        let outcome = Updater::new(
            run_config(&["home"], None),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.report.failed, 1);
        assert_eq!(actions(&log).last().map(String::as_str), Some("logout"));
        assert!(!cache.path().exists());
    }

    #[tokio::test]
    async fn test_only_changed_family_is_reconciled() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        cache
            .save(Some(HOME_V4), Some("2a01:4f8::1".parse().unwrap()))
            .unwrap();
        let new_v6: Ipv6Addr = "2a01:4f8::2".parse().unwrap();

        let (transport, log) = scripted(vec![
            login_ok("sess"),
            zone_ok("300"),
            records_ok(json!([
                a_record("1", "home", "203.0.113.5"),
                {"id": "2", "hostname": "home", "type": "AAAA", "priority": "0",
                 "destination": "2a01:4f8::1", "deleterecord": false, "state": "yes"}
            ])),
            success("updateDnsRecords", json!({})),
            success("logout", json!("")),
        ]);

        let outcome = Updater::new(
            run_config(&["home"], Some(&["home"])),
            resolver(Some(HOME_V4), Some(new_v6)),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        )
        .run()
        .await
        .unwrap();

        assert!(!outcome.ipv4_changed);
        assert!(outcome.ipv6_changed);
        let record = log.lock().unwrap()[3]["param"]["dnsrecordset"]["dnsrecords"][0].clone();
        assert_eq!(record["id"], "2");
        assert_eq!(record["type"], "AAAA");
        assert_eq!(record["destination"], "2a01:4f8::2");

        let entry = cache.load().unwrap();
        assert_eq!(entry.ipv4, Some(HOME_V4));
        assert_eq!(entry.ipv6, Some(new_v6));
    }

    #[tokio::test]
    async fn test_unresolved_family_keeps_cached_address() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        let old_v6: Ipv6Addr = "2a01:4f8::1".parse().unwrap();
        cache
            .save(Some(Ipv4Addr::new(198, 51, 100, 1)), Some(old_v6))
            .unwrap();

        let (transport, _log) = scripted(vec![
            login_ok("sess"),
            zone_ok("300"),
            records_ok(json!([a_record("1", "home", "198.51.100.1")])),
            success("updateDnsRecords", json!({})),
            success("logout", json!("")),
        ]);

        let outcome = Updater::new(
            run_config(&["home"], Some(&["home"])),
            resolver(Some(HOME_V4), None),
            ApiClient::new(transport, credentials()),
            cache.clone(),
        )
        .run()
        .await
        .unwrap();

        assert!(outcome.ipv4_changed);
        assert!(!outcome.ipv6_changed);
        let entry = cache.load().unwrap();
        assert_eq!(entry.ipv4, Some(HOME_V4));
        assert_eq!(entry.ipv6, Some(old_v6));
    }

    #[tokio::test]
    async fn test_manual_address_skips_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IpCache::new(dir.path().join("ipcache"));
        cache.save(Some(HOME_V4), None).unwrap();

        let mut resolver = MockPublicIpResolver::new();
        resolver.expect_resolve_ipv4().times(0);
        let (transport, _log) = scripted(vec![]);

        let config = run_config(&["home"], None)
            .with_manual_ipv4(" 203.0.113.5 ")
            .unwrap();
        let outcome = Updater::new(
            config,
            resolver,
            ApiClient::new(transport, credentials()),
            cache,
        )
        .run()
        .await
        .unwrap();

        assert_eq!(outcome.ipv4, Some(HOME_V4));
        assert!(!outcome.changed());
    }

    #[test]
    fn test_manual_address_must_be_public() {
        assert!(matches!(
            run_config(&["home"], None).with_manual_ipv4("192.168.1.10"),
            Err(DdnsError::InvalidAddress(_))
        ));
        assert!(matches!(
            run_config(&["home"], None).with_manual_ipv6("fe80::1"),
            Err(DdnsError::InvalidAddress(_))
        ));
        assert!(run_config(&["home"], None)
            .with_manual_ipv6("2a01:4f8::1")
            .is_ok());
    }

    #[test]
    fn test_cache_comparison() {
        let ip = Some(HOME_V4);
        assert!(has_changed("IPv4", None, ip));
        assert!(has_changed("IPv4", Some(None), ip));
        assert!(has_changed("IPv4", Some(Some(Ipv4Addr::new(198, 51, 100, 1))), ip));
        assert!(!has_changed("IPv4", Some(ip), ip));
        assert!(!has_changed::<Ipv4Addr>("IPv4", None, None));
    }
}
