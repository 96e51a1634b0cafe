use async_trait::async_trait;
use tlsprobe_domain::{ProbeError, TlsOptions};
use tokio::net::TcpStream;

/// Certificate fields pulled off the leaf certificate presented during a
/// successful handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeInfo {
    pub dns_names: Vec<String>,
    pub not_before: i64,
    pub not_after: i64,
}

/// Port for performing a TLS handshake over an already-connected TCP
/// stream. Concrete implementations live in the infrastructure layer,
/// where the TLS library lives.
#[async_trait]
pub trait TlsHandshakerPort: Send + Sync {
    async fn handshake(
        &self,
        stream: TcpStream,
        host: &str,
        opts: &TlsOptions,
    ) -> Result<HandshakeInfo, ProbeError>;
}
