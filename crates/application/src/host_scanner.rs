use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tlsprobe_domain::{classify, HostScannerConfig, ProbeError, Provenance, TlsCheckerConfig};
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::pool::WorkerPool;
use crate::ports::{EndpointLabels, MetricsSinkPort, TlsCheckerRegistrar, TlsHandshakerPort};

const FIRST_PORT: u16 = 10;

/// Full-range TCP port scanner for a single host, probing every open port
/// for a TLS handshake and tracking the ones that answer as TLS checkers.
pub struct HostScanner {
    config: HostScannerConfig,
    provenance: Provenance,
    pool: Arc<WorkerPool>,
    cancel: CancellationToken,
    handshaker: Arc<dyn TlsHandshakerPort>,
    registrar: Arc<dyn TlsCheckerRegistrar>,
    ports: Arc<RwLock<HashMap<u16, TlsCheckerConfig>>>,
}

impl HostScanner {
    pub fn new(
        config: HostScannerConfig,
        provenance: Provenance,
        pool: Arc<WorkerPool>,
        parent_cancel: &CancellationToken,
        handshaker: Arc<dyn TlsHandshakerPort>,
        registrar: Arc<dyn TlsCheckerRegistrar>,
    ) -> Self {
        Self {
            config,
            provenance,
            pool,
            cancel: parent_cancel.child_token(),
            handshaker,
            registrar,
            ports: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &HostScannerConfig {
        &self.config
    }

    pub fn owner(&self) -> Provenance {
        self.provenance
    }

    /// Scans every port from 10 to 65535, submitting one probe per port to
    /// the shared scanner pool. Returns once every port has been submitted
    /// (not once every probe has finished — callers that need that should
    /// `pool.wait()` afterwards).
    #[instrument(skip(self), fields(host = %self.config.host))]
    pub async fn scan(self: &Arc<Self>) {
        for port in FIRST_PORT..=u16::MAX {
            if self.cancel.is_cancelled() {
                debug!(port, "host scanner cancelled, stopping scan");
                return;
            }
            let this = Arc::clone(self);
            self.pool.submit(async move { this.check(port).await }).await;
            if port == u16::MAX {
                break;
            }
        }
    }

    async fn check(&self, port: u16) {
        let addr = format!("{}:{}", self.config.host, port);
        let opts = &self.config.tls_options;
        let timeout = Duration::from_millis(opts.timeout_ms.max(1));

        let mut attempt = 0;
        let stream = loop {
            match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
                Ok(Ok(stream)) => break stream,
                Ok(Err(e)) => {
                    let err = ProbeError::Dial(e.to_string());
                    attempt += 1;
                    if attempt > opts.retry_times || !classify::should_continue_retrying_tcp(&err) {
                        return;
                    }
                }
                Err(_) => {
                    let err = ProbeError::Dial(format!("dial tcp {addr}: i/o timeout"));
                    attempt += 1;
                    if attempt > opts.retry_times || !classify::should_continue_retrying_tcp(&err) {
                        return;
                    }
                }
            }
        };

        let result = self
            .handshaker
            .handshake(stream, &self.config.host, opts)
            .await;

        if let Err(err) = &result {
            if classify::is_unconnected(err) {
                return;
            }
        }

        let keep = classify::should_keep_checking_tls(result.as_ref().err());
        if !keep {
            return;
        }

        let checker = TlsCheckerConfig::new(
            self.config.host.clone(),
            port,
            opts.clone(),
            self.provenance,
        );
        self.ports.write().await.insert(port, checker.clone());
        self.registrar.update_tls_checker(checker).await;
    }

    /// Every currently-open port this scanner has found, for the
    /// `host_scanner_port` gauge.
    pub async fn collect_ports(&self, sink: &dyn MetricsSinkPort) {
        let ports = self.ports.read().await;
        for port in ports.keys() {
            sink.observe_host_scanner_port(&EndpointLabels {
                host: self.config.host.clone(),
                port: *port,
                domain: self.config.tls_options.sni(&self.config.host).to_string(),
            });
        }
    }

    /// Cancels the scan and unregisters every TLS checker this scanner has
    /// ever discovered.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let mut ports = self.ports.write().await;
        for (_, checker) in ports.drain() {
            self.registrar.remove_tls_checker(&checker.key()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tlsprobe_domain::TlsOptions;
    use tokio::net::TcpListener;

    use crate::ports::HandshakeInfo;

    struct NullHandshaker;

    #[async_trait]
    impl TlsHandshakerPort for NullHandshaker {
        async fn handshake(
            &self,
            _stream: TcpStream,
            _host: &str,
            _opts: &TlsOptions,
        ) -> Result<HandshakeInfo, ProbeError> {
            Ok(HandshakeInfo {
                dns_names: vec![],
                not_before: 0,
                not_after: 0,
            })
        }
    }

    #[derive(Default)]
    struct RecordingRegistrar {
        updates: Mutex<Vec<String>>,
        removals: AtomicUsize,
    }

    #[async_trait]
    impl TlsCheckerRegistrar for RecordingRegistrar {
        async fn update_tls_checker(&self, config: TlsCheckerConfig) {
            self.updates.lock().unwrap().push(config.key());
        }

        async fn remove_tls_checker(&self, _key: &str) {
            self.removals.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn check_registers_a_listening_port_as_tls_checker() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let registrar = Arc::new(RecordingRegistrar::default());
        let mint = tlsprobe_domain::ProvenanceMint::new();
        let scanner = Arc::new(HostScanner::new(
            HostScannerConfig::new("127.0.0.1", TlsOptions::default()),
            mint.mint(),
            Arc::new(WorkerPool::new(4)),
            &CancellationToken::new(),
            Arc::new(NullHandshaker),
            registrar.clone(),
        ));

        scanner.check(port).await;
        assert_eq!(registrar.updates.lock().unwrap().len(), 1);
    }
}
