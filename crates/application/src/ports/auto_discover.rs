use std::sync::Arc;

use async_trait::async_trait;
use tlsprobe_domain::config::AutoDiscoverConfig;
use tlsprobe_domain::Provenance;

use super::dns_provider_api::ProviderError;
use super::tls_checker_registrar::TlsCheckerRegistrar;

/// Handle to a running DNS auto-discover loop, held by the registry so it
/// can be stopped when the owning config entry is removed or replaced.
pub trait AutoDiscoverHandle: Send + Sync {
    fn stop(&self);
    fn config(&self) -> &AutoDiscoverConfig;
}

/// Dependencies a provider factory needs to build a running loop: the
/// registry it reports discovered hosts into, the registrar it reports
/// discovered TLS checkers through, and the provenance token that marks
/// everything it creates as owned by this auto-discover entry.
pub struct AutoDiscoverDeps {
    pub provenance: Provenance,
    pub registry: Arc<crate::Registry>,
    pub registrar: Arc<dyn TlsCheckerRegistrar>,
}

/// Constructs a concrete [`AutoDiscoverHandle`] (and spawns its background
/// task) from a config entry. One factory is registered per provider type
/// string (`"AliDNS"`, `"DNSPod"`, ...).
#[async_trait]
pub trait AutoDiscoverFactory: Send + Sync {
    async fn create(
        &self,
        config: AutoDiscoverConfig,
        deps: AutoDiscoverDeps,
    ) -> Result<Arc<dyn AutoDiscoverHandle>, ProviderError>;
}
