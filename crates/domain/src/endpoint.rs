use crate::Provenance;
use serde::{Deserialize, Serialize};

fn default_timeout_ms() -> u64 {
    3000
}

/// Parameters for a single TLS handshake attempt.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TlsOptions {
    /// SNI / expected certificate subject. Empty means "use the dialed host".
    #[serde(default)]
    pub domain: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub insecure_skip_verify: bool,

    #[serde(default)]
    pub retry_times: u32,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            domain: String::new(),
            timeout_ms: default_timeout_ms(),
            insecure_skip_verify: false,
            retry_times: 0,
        }
    }
}

impl TlsOptions {
    /// The name to present over SNI and validate against: falls back to
    /// `host` when `domain` was never set.
    pub fn sni<'a>(&'a self, host: &'a str) -> &'a str {
        if self.domain.is_empty() {
            host
        } else {
            &self.domain
        }
    }
}

/// A host to be fully port-scanned for TLS-speaking services.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HostScannerConfig {
    pub host: String,
    #[serde(default)]
    pub tls_options: TlsOptions,
}

impl HostScannerConfig {
    pub fn new(host: impl Into<String>, tls_options: TlsOptions) -> Self {
        Self {
            host: host.into(),
            tls_options,
        }
    }

    pub fn key(&self) -> String {
        format!(
            "HostScanner Host: {}, domain: {}",
            self.host,
            self.tls_options.sni(&self.host)
        )
    }
}

/// A single `host:port` pair known to terminate TLS, checked on every scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct TlsCheckerConfig {
    pub host: String,
    pub port: u16,
    pub tls_options: TlsOptions,
    pub provenance: Provenance,
}

impl TlsCheckerConfig {
    pub fn new(host: impl Into<String>, port: u16, tls_options: TlsOptions, provenance: Provenance) -> Self {
        Self {
            host: host.into(),
            port,
            tls_options,
            provenance,
        }
    }

    pub fn key(&self) -> String {
        format!(
            "TLSChecker addr: {}:{}, domain: {}",
            self.host,
            self.port,
            self.tls_options.sni(&self.host)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sni_falls_back_to_host() {
        let opts = TlsOptions::default();
        assert_eq!(opts.sni("example.com"), "example.com");
        let opts = TlsOptions {
            domain: "sni.example.com".into(),
            ..Default::default()
        };
        assert_eq!(opts.sni("example.com"), "sni.example.com");
    }

    #[test]
    fn keys_are_stable_for_equal_configs() {
        let a = HostScannerConfig::new("a.example.com", TlsOptions::default());
        let b = HostScannerConfig::new("a.example.com", TlsOptions::default());
        assert_eq!(a.key(), b.key());
    }
}
