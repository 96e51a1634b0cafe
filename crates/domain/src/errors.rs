use thiserror::Error;

/// Structural failures: malformed input that no retry will fix.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("FQDN too short: {0:?}")]
    FqdnTooShort(String),

    #[error("unsupported DNS record type: {0}")]
    UnsupportedRecordType(String),

    #[error("unknown auto-discover provider type: {0}")]
    UnknownProviderType(String),

    #[error("invalid host address: {0}")]
    InvalidHostAddress(String),
}

/// Transient and endpoint-level failures raised while probing a single
/// TLS endpoint. Classification functions in [`crate::classify`] decide
/// how each variant is handled by the caller.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("dial error: {0}")]
    Dial(String),

    #[error("tls handshake error: {0}")]
    Handshake(String),

    #[error("connection closed before handshake completed")]
    Eof,
}

impl ProbeError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}
