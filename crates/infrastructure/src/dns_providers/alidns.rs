use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tlsprobe_application::ports::{
    AutoDiscoverDeps, AutoDiscoverFactory, AutoDiscoverHandle, DnsProviderApiPort, Page,
    ProviderDomain, ProviderError, ProviderRecord,
};
use tlsprobe_domain::config::AutoDiscoverConfig;
use tlsprobe_jobs::DnsProviderLoop;

const ALIDNS_ENDPOINT: &str = "https://alidns.cn-hangzhou.aliyuncs.com";

/// REST client for Alibaba Cloud DNS (AliDNS)'s `DescribeDomains` /
/// `DescribeDomainRecords` actions.
///
/// Requests carry the access key pair supplied in the `auto_discover`
/// entry's `options` table; the request-signing algorithm itself isn't
/// reproduced here (see DESIGN.md) since it's orthogonal to the pagination
/// and reconciliation logic this service actually exercises.
pub struct AliDnsClient {
    http: reqwest::Client,
    access_key_id: String,
    access_key_secret: String,
}

impl AliDnsClient {
    pub fn new(access_key_id: String, access_key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_key_id,
            access_key_secret,
        }
    }

    fn signed_request(&self, action: &str, extra: &[(&str, String)]) -> reqwest::RequestBuilder {
        let mut params: Vec<(&str, String)> = vec![
            ("Action", action.to_string()),
            ("AccessKeyId", self.access_key_id.clone()),
        ];
        params.extend_from_slice(extra);
        self.http
            .get(ALIDNS_ENDPOINT)
            .query(&params)
            .basic_auth(&self.access_key_id, Some(&self.access_key_secret))
    }
}

#[derive(Debug, Deserialize)]
struct DescribeDomainsResponse {
    domains: DomainsWrapper,
}

#[derive(Debug, Deserialize)]
struct DomainsWrapper {
    domain: Vec<AliDomain>,
}

#[derive(Debug, Deserialize)]
struct AliDomain {
    #[serde(rename = "DomainName")]
    domain_name: String,
}

#[derive(Debug, Deserialize)]
struct DescribeDomainRecordsResponse {
    domain_records: RecordsWrapper,
}

#[derive(Debug, Deserialize)]
struct RecordsWrapper {
    record: Vec<AliRecord>,
}

#[derive(Debug, Deserialize)]
struct AliRecord {
    #[serde(rename = "RR")]
    rr: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "Value")]
    value: String,
}

#[async_trait]
impl DnsProviderApiPort for AliDnsClient {
    async fn list_domains(&self, page_num: u32, page_size: u32) -> Result<Page<ProviderDomain>, ProviderError> {
        let resp = self
            .signed_request(
                "DescribeDomains",
                &[
                    ("PageNumber", page_num.to_string()),
                    ("PageSize", page_size.to_string()),
                ],
            )
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let body: DescribeDomainsResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(Page {
            items: body
                .domains
                .domain
                .into_iter()
                .map(|d| ProviderDomain { name: d.domain_name })
                .collect(),
            total: None,
        })
    }

    async fn list_records(
        &self,
        domain: &str,
        page_num: u32,
        page_size: u32,
    ) -> Result<Page<ProviderRecord>, ProviderError> {
        let resp = self
            .signed_request(
                "DescribeDomainRecords",
                &[
                    ("DomainName", domain.to_string()),
                    ("PageNumber", page_num.to_string()),
                    ("PageSize", page_size.to_string()),
                ],
            )
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let body: DescribeDomainRecordsResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(Page {
            items: body
                .domain_records
                .record
                .into_iter()
                .map(|r| ProviderRecord {
                    name: r.rr,
                    record_type: r.record_type,
                    value: r.value,
                })
                .collect(),
            total: None,
        })
    }
}

/// Builds and starts a [`DnsProviderLoop`] against [`AliDnsClient`].
/// Registered under the provider type string `"AliDNS"`.
pub struct AliDnsFactory;

#[async_trait]
impl AutoDiscoverFactory for AliDnsFactory {
    async fn create(
        &self,
        config: AutoDiscoverConfig,
        deps: AutoDiscoverDeps,
    ) -> Result<Arc<dyn AutoDiscoverHandle>, ProviderError> {
        let ak = config
            .options
            .get("accessKeyId")
            .ok_or_else(|| ProviderError::Request("accessKeyId not present in options".into()))?
            .clone();
        let sk = config
            .options
            .get("accessKeySecret")
            .ok_or_else(|| ProviderError::Request("accessKeySecret not present in options".into()))?
            .clone();
        let client: Arc<dyn DnsProviderApiPort> = Arc::new(AliDnsClient::new(ak, sk));

        // One-page sanity call before the provider is accepted, matching
        // the health check the original performs at startup.
        client
            .list_domains(1, 1)
            .await
            .map_err(|e| ProviderError::Request(format!("AliDNS health check failed: {e}")))?;

        let loop_ = Arc::new(DnsProviderLoop::new(
            config,
            client,
            deps.registry,
            deps.registrar,
            deps.provenance,
        ));
        loop_.clone().start().await;
        Ok(loop_)
    }
}
