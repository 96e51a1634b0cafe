use async_trait::async_trait;
use tlsprobe_domain::TlsCheckerConfig;

/// Narrow view of the registry that a running [`crate::host_scanner::HostScanner`]
/// needs: the ability to add and remove TLS checkers it discovers, without
/// depending on the registry's full surface (which would create a cycle —
/// the registry owns host scanners).
#[async_trait]
pub trait TlsCheckerRegistrar: Send + Sync {
    async fn update_tls_checker(&self, config: TlsCheckerConfig);
    async fn remove_tls_checker(&self, key: &str);
}
