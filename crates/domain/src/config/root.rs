use serde::{Deserialize, Serialize};

use super::auto_discover::AutoDiscoverConfig;
use super::errors::ConfigError;
use crate::endpoint::{HostScannerConfig, TlsOptions};

fn default_listen_addr() -> String {
    "0.0.0.0:9115".to_string()
}

fn default_max_connections() -> usize {
    100
}

fn default_max_collect_connections() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RootConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_max_collect_connections")]
    pub max_collect_connections: usize,

    #[serde(default, rename = "auto_discover")]
    pub auto_discovers: Vec<AutoDiscoverConfig>,

    #[serde(default, rename = "host_scanners_config")]
    pub host_scanners: Vec<HostScannerConfig>,

    #[serde(default, rename = "tls_checkers")]
    pub tls_checkers: Vec<TlsCheckerEntry>,
}

/// A statically-configured TLS checker, as distinct from one discovered by
/// a host scanner or a DNS auto-discover loop.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TlsCheckerEntry {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub tls_options: TlsOptions,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_connections: default_max_connections(),
            max_collect_connections: default_max_collect_connections(),
            auto_discovers: Vec::new(),
            host_scanners: Vec::new(),
            tls_checkers: Vec::new(),
        }
    }
}

impl RootConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        let config: RootConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "invalid listen_addr: {}",
                self.listen_addr
            )));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "max_connections must be greater than 0".to_string(),
            ));
        }
        if self.max_collect_connections == 0 {
            return Err(ConfigError::Validation(
                "max_collect_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RootConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_max_connections() {
        let mut cfg = RootConfig::default();
        cfg.max_connections = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_minimal_toml() {
        let toml_src = r#"
            listen_addr = "127.0.0.1:9115"

            [[auto_discover]]
            name = "prod-alidns"
            type = "AliDNS"

            [[host_scanners_config]]
            host = "edge.example.com"

            [[tls_checkers]]
            host = "api.example.com"
            port = 443
        "#;
        let cfg: RootConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(cfg.auto_discovers.len(), 1);
        assert_eq!(cfg.auto_discovers[0].enumeration_interval_secs, 300);
        assert_eq!(cfg.host_scanners.len(), 1);
        assert_eq!(cfg.tls_checkers[0].port, 443);
    }
}
