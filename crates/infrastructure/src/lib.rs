//! Concrete adapters for the probe engine's ports: the `rustls` handshaker,
//! the cloud DNS provider SDK clients, the config file watcher, and the
//! `prometheus-client` metrics sink.
pub mod config_watch;
pub mod dns_providers;
pub mod metrics;
pub mod tls;

pub use tls::RustlsTlsHandshaker;
