//! Pure domain types for the TLS probe service: no I/O, no async runtime.
pub mod classify;
pub mod config;
pub mod dns;
pub mod endpoint;
pub mod errors;
pub mod provenance;

pub use dns::{Record, RecordType};
pub use endpoint::{HostScannerConfig, TlsCheckerConfig, TlsOptions};
pub use errors::{DomainError, ProbeError};
pub use provenance::{Provenance, ProvenanceMint};
