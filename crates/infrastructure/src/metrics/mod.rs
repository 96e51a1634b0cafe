use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use tlsprobe_application::ports::{EndpointLabels, MetricsSinkPort};

/// Labels shared by every gauge this sink registers. `port` is carried as a
/// string rather than an integer label: `prometheus-client`'s label-value
/// impls cover strings and a handful of integer widths, and a string keeps
/// this sink from depending on which of those widths the registered crate
/// version happens to support.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
struct CoreLabels {
    host: String,
    port: String,
    domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
struct TlsCheckerLabels {
    host: String,
    port: String,
    domain: String,
    error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
struct TlsCheckerInfoLabels {
    host: String,
    port: String,
    domain: String,
    cert_dns_names: String,
}

/// Backs [`MetricsSinkPort`] with a `prometheus-client` [`Registry`]. One
/// instance is built fresh per scrape (mirrors the registry's own
/// scrape-pool-per-call discipline) so stale series from a prior topology
/// never linger into a new render.
pub struct PrometheusMetricsSink {
    registry: Registry,
    host_scanner_port: Family<CoreLabels, Gauge>,
    tls_checker: Family<TlsCheckerLabels, Gauge>,
    tls_checker_not_before: Family<CoreLabels, Gauge>,
    tls_checker_not_after: Family<CoreLabels, Gauge>,
    tls_checker_info: Family<TlsCheckerInfoLabels, Gauge>,
}

impl PrometheusMetricsSink {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let host_scanner_port = Family::<CoreLabels, Gauge>::default();
        registry.register(
            "host_scanner_port",
            "Open TLS-capable port discovered by a host scanner",
            host_scanner_port.clone(),
        );

        let tls_checker = Family::<TlsCheckerLabels, Gauge>::default();
        registry.register(
            "tls_checker",
            "1 if the TLS handshake succeeded on the last scrape, 0 otherwise",
            tls_checker.clone(),
        );

        let tls_checker_not_before = Family::<CoreLabels, Gauge>::default();
        registry.register(
            "tls_checker_not_before",
            "Leaf certificate validity start, UNIX seconds",
            tls_checker_not_before.clone(),
        );

        let tls_checker_not_after = Family::<CoreLabels, Gauge>::default();
        registry.register(
            "tls_checker_not_after",
            "Leaf certificate validity end, UNIX seconds",
            tls_checker_not_after.clone(),
        );

        let tls_checker_info = Family::<TlsCheckerInfoLabels, Gauge>::default();
        registry.register(
            "tls_checker_info",
            "Certificate identity of the last successful handshake",
            tls_checker_info.clone(),
        );

        Self {
            registry,
            host_scanner_port,
            tls_checker,
            tls_checker_not_before,
            tls_checker_not_after,
            tls_checker_info,
        }
    }

    /// Renders every registered family as OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        prometheus_client::encoding::text::encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}

impl Default for PrometheusMetricsSink {
    fn default() -> Self {
        Self::new()
    }
}

fn core_labels(labels: &EndpointLabels) -> CoreLabels {
    CoreLabels {
        host: labels.host.clone(),
        port: labels.port.to_string(),
        domain: labels.domain.clone(),
    }
}

impl MetricsSinkPort for PrometheusMetricsSink {
    fn observe_host_scanner_port(&self, labels: &EndpointLabels) {
        self.host_scanner_port.get_or_create(&core_labels(labels)).set(1);
    }

    fn observe_tls_checker(&self, labels: &EndpointLabels, success: bool, error: Option<&str>) {
        let key = TlsCheckerLabels {
            host: labels.host.clone(),
            port: labels.port.to_string(),
            domain: labels.domain.clone(),
            error: error.unwrap_or("").to_string(),
        };
        self.tls_checker.get_or_create(&key).set(if success { 1 } else { 0 });
    }

    fn observe_tls_checker_validity(&self, labels: &EndpointLabels, not_before: i64, not_after: i64) {
        let key = core_labels(labels);
        self.tls_checker_not_before.get_or_create(&key).set(not_before);
        self.tls_checker_not_after.get_or_create(&key).set(not_after);
    }

    fn observe_tls_checker_info(&self, labels: &EndpointLabels, dns_names: &[String]) {
        let key = TlsCheckerInfoLabels {
            host: labels.host.clone(),
            port: labels.port.to_string(),
            domain: labels.domain.clone(),
            cert_dns_names: dns_names.join(","),
        };
        self.tls_checker_info.get_or_create(&key).set(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_observed_series() {
        let sink = PrometheusMetricsSink::new();
        let labels = EndpointLabels {
            host: "example.com".into(),
            port: 443,
            domain: "example.com".into(),
        };
        sink.observe_host_scanner_port(&labels);
        sink.observe_tls_checker(&labels, true, None);
        sink.observe_tls_checker_validity(&labels, 1_700_000_000, 1_900_000_000);
        sink.observe_tls_checker_info(&labels, &["example.com".to_string()]);

        let text = sink.render().unwrap();
        assert!(text.contains("host_scanner_port"));
        assert!(text.contains("tls_checker"));
        assert!(text.contains("tls_checker_not_before"));
        assert!(text.contains("tls_checker_not_after"));
        assert!(text.contains("tls_checker_info"));
    }

    #[test]
    fn failed_handshake_is_zero_with_error_label() {
        let sink = PrometheusMetricsSink::new();
        let labels = EndpointLabels {
            host: "dead.example.com".into(),
            port: 8443,
            domain: "dead.example.com".into(),
        };
        sink.observe_tls_checker(&labels, false, Some("connection refused"));
        let text = sink.render().unwrap();
        assert!(text.contains("connection refused"));
        assert!(text.contains("tls_checker{") || text.contains("tls_checker_total{"));
    }
}
