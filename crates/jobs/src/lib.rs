//! Background drivers: periodic jobs that own an `Arc<Self>` across ticks
//! and stop cooperatively via a [`tokio_util::sync::CancellationToken`].
pub mod dns_provider_loop;

pub use dns_provider_loop::DnsProviderLoop;
