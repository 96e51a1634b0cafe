mod auto_discover;
mod dns_provider_api;
mod metrics_sink;
mod tls_checker_registrar;
mod tls_handshaker;

pub use auto_discover::{AutoDiscoverDeps, AutoDiscoverFactory, AutoDiscoverHandle};
pub use dns_provider_api::{DnsProviderApiPort, Page, ProviderDomain, ProviderError, ProviderRecord};
pub use metrics_sink::{EndpointLabels, MetricsSinkPort};
pub use tls_checker_registrar::TlsCheckerRegistrar;
pub use tls_handshaker::{HandshakeInfo, TlsHandshakerPort};
