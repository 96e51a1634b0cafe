/// Labels shared by every metric this service emits for a single endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointLabels {
    pub host: String,
    pub port: u16,
    pub domain: String,
}

/// Sink the registry's `collect()` pass writes observations into. One
/// instance is built per scrape; implementations in infrastructure back it
/// with a `prometheus-client` registry.
pub trait MetricsSinkPort: Send + Sync {
    fn observe_host_scanner_port(&self, labels: &EndpointLabels);

    fn observe_tls_checker(&self, labels: &EndpointLabels, success: bool, error: Option<&str>);

    fn observe_tls_checker_validity(&self, labels: &EndpointLabels, not_before: i64, not_after: i64);

    /// Certificate identity, reported separately from the numeric validity
    /// gauges since Prometheus gauges can't carry a variable-length label
    /// list cleanly alongside a timestamp value.
    fn observe_tls_checker_info(&self, labels: &EndpointLabels, dns_names: &[String]);
}
