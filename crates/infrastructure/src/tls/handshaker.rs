use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use tlsprobe_application::ports::{HandshakeInfo, TlsHandshakerPort};
use tlsprobe_domain::{ProbeError, TlsOptions};
use tokio::net::TcpStream;

use super::danger::NoCertificateVerification;

static SECURE_CONFIG: LazyLock<Arc<rustls::ClientConfig>> = LazyLock::new(|| {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    Arc::new(
        rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth(),
    )
});

static INSECURE_CONFIG: LazyLock<Arc<rustls::ClientConfig>> = LazyLock::new(|| {
    let provider = rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()));
    let mut config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(NoCertificateVerification::new(provider)))
        .with_no_client_auth();
    config.enable_sni = true;
    Arc::new(config)
});

/// Performs the actual TLS handshake (C2) against an already-connected TCP
/// stream, selecting the secure or insecure `rustls` config per-endpoint.
pub struct RustlsTlsHandshaker;

impl RustlsTlsHandshaker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustlsTlsHandshaker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TlsHandshakerPort for RustlsTlsHandshaker {
    async fn handshake(
        &self,
        stream: TcpStream,
        host: &str,
        opts: &TlsOptions,
    ) -> Result<HandshakeInfo, ProbeError> {
        let config = if opts.insecure_skip_verify {
            INSECURE_CONFIG.clone()
        } else {
            SECURE_CONFIG.clone()
        };
        let connector = tokio_rustls::TlsConnector::from(config);
        let sni = opts.sni(host).to_string();
        let server_name = ServerName::try_from(sni)
            .map_err(|e| ProbeError::Handshake(format!("invalid server name: {e}")))?;

        let timeout = Duration::from_millis(opts.timeout_ms.max(1));
        let tls_stream = tokio::time::timeout(timeout, connector.connect(server_name, stream))
            .await
            .map_err(|_| ProbeError::Handshake("context deadline exceeded".to_string()))?
            .map_err(classify_rustls_error)?;

        let (_, conn) = tls_stream.get_ref();
        let leaf = conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| ProbeError::Handshake("peer presented no certificate".to_string()))?;

        super::cert::parse_leaf(leaf.as_ref())
            .map_err(|e| ProbeError::Handshake(format!("failed to parse leaf certificate: {e}")))
    }
}

fn classify_rustls_error(err: std::io::Error) -> ProbeError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        ProbeError::Eof
    } else {
        ProbeError::Handshake(err.to_string())
    }
}
