use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tlsprobe_domain::config::AutoDiscoverConfig;
use tlsprobe_domain::{HostScannerConfig, Provenance, ProvenanceMint, TlsCheckerConfig};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::host_scanner::HostScanner;
use crate::pool::WorkerPool;
use crate::ports::{
    AutoDiscoverDeps, AutoDiscoverFactory, AutoDiscoverHandle, EndpointLabels, MetricsSinkPort,
    ProviderError, TlsCheckerRegistrar, TlsHandshakerPort,
};

/// Live set of everything this service is probing, plus the DNS
/// auto-discover loops and config-reload machinery keeping it up to date.
///
/// Not a process-wide singleton: callers construct one explicitly (tests
/// build isolated registries with their own creator registry) and thread
/// it through the rest of the wiring.
pub struct Registry {
    host_scanners: RwLock<HashMap<String, Arc<HostScanner>>>,
    tls_checkers: RwLock<HashMap<String, TlsCheckerConfig>>,
    auto_discovers: RwLock<HashMap<String, Arc<dyn AutoDiscoverHandle>>>,
    creators: HashMap<String, Arc<dyn AutoDiscoverFactory>>,
    scanner_pool: Arc<WorkerPool>,
    max_collect_connections: usize,
    handshaker: Arc<dyn TlsHandshakerPort>,
    cancel: CancellationToken,
    provenance_mint: ProvenanceMint,
}

impl Registry {
    pub fn new(
        max_connections: usize,
        max_collect_connections: usize,
        handshaker: Arc<dyn TlsHandshakerPort>,
        creators: HashMap<String, Arc<dyn AutoDiscoverFactory>>,
    ) -> Self {
        Self {
            host_scanners: RwLock::new(HashMap::new()),
            tls_checkers: RwLock::new(HashMap::new()),
            auto_discovers: RwLock::new(HashMap::new()),
            creators,
            scanner_pool: Arc::new(WorkerPool::new(max_connections)),
            max_collect_connections,
            handshaker,
            cancel: CancellationToken::new(),
            provenance_mint: ProvenanceMint::new(),
        }
    }

    pub fn mint_provenance(&self) -> Provenance {
        self.provenance_mint.mint()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Starts scanning `config` under `provenance`. The config's key covers
    /// only `host` and the effective SNI, so two configs can collide on key
    /// while differing in timeout, retries, or skip-verify — in that case
    /// the existing scanner is stopped and replaced rather than left stale.
    /// An exact duplicate of a config already running is a no-op.
    pub async fn update_host_scanner(
        self: &Arc<Self>,
        config: HostScannerConfig,
        provenance: Provenance,
        registrar: Arc<dyn TlsCheckerRegistrar>,
    ) {
        let key = config.key();
        let existing = self.host_scanners.read().await.get(&key).cloned();
        if let Some(existing) = existing {
            if existing.config() == &config {
                return;
            }
            existing.stop().await;
            self.host_scanners.write().await.remove(&key);
        }
        let scanner = Arc::new(HostScanner::new(
            config,
            provenance,
            self.scanner_pool.clone(),
            &self.cancel,
            self.handshaker.clone(),
            registrar,
        ));
        self.host_scanners
            .write()
            .await
            .insert(key, scanner.clone());
        let spawned = scanner.clone();
        tokio::spawn(async move { spawned.scan().await });
    }

    pub async fn remove_host_scanner(&self, key: &str) {
        let scanner = self.host_scanners.write().await.remove(key);
        if let Some(scanner) = scanner {
            scanner.stop().await;
        }
    }

    pub async fn update_auto_discover(
        self: &Arc<Self>,
        config: AutoDiscoverConfig,
        self_registrar: Arc<dyn TlsCheckerRegistrar>,
    ) -> Result<(), ProviderError> {
        let key = config.key();
        let existing = self.auto_discovers.read().await.get(&key).cloned();
        if let Some(existing) = existing {
            if existing.config() == &config {
                return Ok(());
            }
            existing.stop();
            self.auto_discovers.write().await.remove(&key);
        }
        let factory = self.creators.get(&config.provider_type).cloned().ok_or_else(|| {
            ProviderError::Request(format!("unknown auto-discover type: {}", config.provider_type))
        })?;
        let provenance = self.mint_provenance();
        let deps = AutoDiscoverDeps {
            provenance,
            registry: Arc::clone(self),
            registrar: self_registrar,
        };
        let handle = factory.create(config, deps).await?;
        self.auto_discovers.write().await.insert(key, handle);
        Ok(())
    }

    pub async fn remove_auto_discover(&self, key: &str) {
        let handle = self.auto_discovers.write().await.remove(key);
        if let Some(handle) = handle {
            handle.stop();
        }
    }

    /// Two-phase reconcile: first ensure every entity in `config` is
    /// running under `provenance`, then remove anything still owned by
    /// `provenance` that `config` no longer lists.
    pub async fn reconcile_config(
        self: &Arc<Self>,
        config: &tlsprobe_domain::config::RootConfig,
        provenance: Provenance,
        self_registrar: Arc<dyn TlsCheckerRegistrar>,
    ) {
        let mut wanted_scanners = std::collections::HashSet::new();
        for hs in &config.host_scanners {
            wanted_scanners.insert(hs.key());
            self.update_host_scanner(hs.clone(), provenance, self_registrar.clone())
                .await;
        }

        let mut wanted_checkers = std::collections::HashSet::new();
        for tc in &config.tls_checkers {
            let checker = TlsCheckerConfig::new(
                tc.host.clone(),
                tc.port,
                tc.tls_options.clone(),
                provenance,
            );
            wanted_checkers.insert(checker.key());
            self.update_tls_checker(checker).await;
        }

        let mut wanted_discovers = std::collections::HashSet::new();
        for ad in &config.auto_discovers {
            wanted_discovers.insert(ad.key());
            if let Err(err) = self.update_auto_discover(ad.clone(), self_registrar.clone()).await {
                warn!(name = %ad.name, %err, "failed to start auto-discover provider");
            }
        }

        let stale_scanners: Vec<String> = {
            let scanners = self.host_scanners.read().await;
            scanners
                .iter()
                .filter(|(k, s)| s.owner() == provenance && !wanted_scanners.contains(*k))
                .map(|(k, _)| k.clone())
                .collect()
        };
        for key in stale_scanners {
            self.remove_host_scanner(&key).await;
        }

        let stale_checkers: Vec<String> = {
            let checkers = self.tls_checkers.read().await;
            checkers
                .iter()
                .filter(|(k, c)| c.provenance == provenance && !wanted_checkers.contains(*k))
                .map(|(k, _)| k.clone())
                .collect()
        };
        for key in stale_checkers {
            self.remove_tls_checker(&key).await;
        }

        let stale_discovers: Vec<String> = {
            let discovers = self.auto_discovers.read().await;
            discovers
                .iter()
                .filter(|(k, _)| !wanted_discovers.contains(*k))
                .map(|(k, _)| k.clone())
                .collect()
        };
        for key in stale_discovers {
            self.remove_auto_discover(&key).await;
        }

        info!(
            scanners = wanted_scanners.len(),
            checkers = wanted_checkers.len(),
            discovers = wanted_discovers.len(),
            "config reconciled"
        );
    }

    /// Runs one full metrics scrape: host-scanner port gauges, then every
    /// TLS checker handshake, fanned out over a fresh bounded pool.
    pub async fn collect(&self, sink: Arc<dyn MetricsSinkPort>) {
        for scanner in self.host_scanners.read().await.values() {
            scanner.collect_ports(sink.as_ref()).await;
        }

        let pool = WorkerPool::new(self.max_collect_connections);
        let checkers: Vec<TlsCheckerConfig> = self.tls_checkers.read().await.values().cloned().collect();
        for checker in checkers {
            let handshaker = self.handshaker.clone();
            let sink = sink.clone();
            pool.submit(async move {
                let addr = format!("{}:{}", checker.host, checker.port);
                let labels = EndpointLabels {
                    host: checker.host.clone(),
                    port: checker.port,
                    domain: checker.tls_options.sni(&checker.host).to_string(),
                };
                let timeout = std::time::Duration::from_millis(checker.tls_options.timeout_ms.max(1));
                match tokio::time::timeout(timeout, tokio::net::TcpStream::connect(&addr)).await {
                    Ok(Ok(stream)) => {
                        match handshaker
                            .handshake(stream, &checker.host, &checker.tls_options)
                            .await
                        {
                            Ok(info) => {
                                sink.observe_tls_checker(&labels, true, None);
                                sink.observe_tls_checker_validity(&labels, info.not_before, info.not_after);
                                sink.observe_tls_checker_info(&labels, &info.dns_names);
                            }
                            Err(err) => {
                                sink.observe_tls_checker(&labels, false, Some(&err.message()));
                            }
                        }
                    }
                    Ok(Err(e)) => sink.observe_tls_checker(&labels, false, Some(&e.to_string())),
                    Err(_) => sink.observe_tls_checker(&labels, false, Some("dial timeout")),
                }
            })
            .await;
        }
        pool.wait().await;
    }
}

#[async_trait]
impl TlsCheckerRegistrar for Registry {
    async fn update_tls_checker(&self, config: TlsCheckerConfig) {
        self.tls_checkers.write().await.insert(config.key(), config);
    }

    async fn remove_tls_checker(&self, key: &str) {
        // The lock is held for the whole remove, not released beforehand —
        // closes a race where a concurrent update could resurrect the
        // entry right after it was read out but before it was deleted.
        let mut checkers = self.tls_checkers.write().await;
        checkers.remove(key);
    }
}
