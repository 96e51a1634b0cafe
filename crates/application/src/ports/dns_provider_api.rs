use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider API request failed: {0}")]
    Request(String),

    #[error("provider API returned malformed data: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDomain {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRecord {
    pub name: String,
    pub record_type: String,
    pub value: String,
}

/// One page of a paginated provider API listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total item count the provider reports for the whole listing, when
    /// it tells us (some providers only signal end-of-pages by returning a
    /// short page instead).
    pub total: Option<u32>,
}

/// Port implemented by each concrete cloud DNS SDK adapter (AliDNS, DNSPod,
/// ...). `page_num` is 1-based, matching every provider this was modeled
/// on.
#[async_trait]
pub trait DnsProviderApiPort: Send + Sync {
    async fn list_domains(&self, page_num: u32, page_size: u32) -> Result<Page<ProviderDomain>, ProviderError>;

    async fn list_records(
        &self,
        domain: &str,
        page_num: u32,
        page_size: u32,
    ) -> Result<Page<ProviderRecord>, ProviderError>;
}
