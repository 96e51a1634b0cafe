use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tlsprobe_application::ports::{
    AutoDiscoverDeps, AutoDiscoverFactory, AutoDiscoverHandle, DnsProviderApiPort, Page,
    ProviderDomain, ProviderError, ProviderRecord,
};
use tlsprobe_domain::config::AutoDiscoverConfig;
use tlsprobe_jobs::DnsProviderLoop;

const DNSPOD_ENDPOINT: &str = "https://dnspod.tencentcloudapi.com";

/// REST client for Tencent Cloud DNSPod's `DescribeDomainList` /
/// `DescribeRecordList` actions.
///
/// Only enabled domains are surfaced, matching the original's filter on
/// `Status == "ENABLE"`. As with [`super::alidns::AliDnsClient`], the
/// request-signing algorithm is left out (see DESIGN.md); pagination is
/// handled entirely by `tlsprobe_jobs::DnsProviderLoop`, which always
/// passes the caller a 1-based page number straight through rather than
/// recomputing an offset here.
pub struct DnsPodClient {
    http: reqwest::Client,
    secret_id: String,
    secret_key: String,
}

impl DnsPodClient {
    pub fn new(secret_id: String, secret_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_id,
            secret_key,
        }
    }

    fn request(&self, action: &str, extra: &[(&str, String)]) -> reqwest::RequestBuilder {
        let mut params: Vec<(&str, String)> = vec![
            ("Action", action.to_string()),
            ("SecretId", self.secret_id.clone()),
        ];
        params.extend_from_slice(extra);
        self.http
            .get(DNSPOD_ENDPOINT)
            .query(&params)
            .basic_auth(&self.secret_id, Some(&self.secret_key))
    }
}

#[derive(Debug, Deserialize)]
struct DescribeDomainListResponse {
    #[serde(rename = "Response")]
    response: DomainListPayload,
}

#[derive(Debug, Deserialize)]
struct DomainListPayload {
    #[serde(rename = "DomainList")]
    domain_list: Vec<DnsPodDomain>,
    #[serde(rename = "DomainCountInfo")]
    domain_count_info: Option<DomainCountInfo>,
}

#[derive(Debug, Deserialize)]
struct DomainCountInfo {
    #[serde(rename = "DomainTotal")]
    domain_total: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DnsPodDomain {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Debug, Deserialize)]
struct DescribeRecordListResponse {
    #[serde(rename = "Response")]
    response: RecordListPayload,
}

#[derive(Debug, Deserialize)]
struct RecordListPayload {
    #[serde(rename = "RecordList")]
    record_list: Vec<DnsPodRecord>,
    #[serde(rename = "RecordCountInfo")]
    record_count_info: Option<RecordCountInfo>,
}

#[derive(Debug, Deserialize)]
struct RecordCountInfo {
    #[serde(rename = "TotalCount")]
    total_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DnsPodRecord {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "Value")]
    value: String,
}

#[async_trait]
impl DnsProviderApiPort for DnsPodClient {
    async fn list_domains(&self, page_num: u32, page_size: u32) -> Result<Page<ProviderDomain>, ProviderError> {
        let offset = (page_num - 1) * page_size;
        let resp = self
            .request(
                "DescribeDomainList",
                &[("Limit", page_size.to_string()), ("Offset", offset.to_string())],
            )
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let body: DescribeDomainListResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(Page {
            items: body
                .response
                .domain_list
                .into_iter()
                .filter(|d| d.status == "ENABLE")
                .map(|d| ProviderDomain { name: d.name })
                .collect(),
            total: body.response.domain_count_info.and_then(|i| i.domain_total),
        })
    }

    async fn list_records(
        &self,
        domain: &str,
        page_num: u32,
        page_size: u32,
    ) -> Result<Page<ProviderRecord>, ProviderError> {
        let offset = (page_num - 1) * page_size;
        let resp = self
            .request(
                "DescribeRecordList",
                &[
                    ("Domain", domain.to_string()),
                    ("Limit", page_size.to_string()),
                    ("Offset", offset.to_string()),
                ],
            )
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let body: DescribeRecordListResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(Page {
            items: body
                .response
                .record_list
                .into_iter()
                .map(|r| ProviderRecord {
                    name: r.name,
                    record_type: r.record_type,
                    value: r.value,
                })
                .collect(),
            total: body.response.record_count_info.and_then(|i| i.total_count),
        })
    }
}

/// Builds and starts a [`DnsProviderLoop`] against [`DnsPodClient`].
/// Registered under the provider type string `"DNSPod"`.
pub struct DnsPodFactory;

#[async_trait]
impl AutoDiscoverFactory for DnsPodFactory {
    async fn create(
        &self,
        config: AutoDiscoverConfig,
        deps: AutoDiscoverDeps,
    ) -> Result<Arc<dyn AutoDiscoverHandle>, ProviderError> {
        let secret_id = config
            .options
            .get("secretId")
            .ok_or_else(|| ProviderError::Request("secretId not present in options".into()))?
            .clone();
        let secret_key = config
            .options
            .get("secretKey")
            .ok_or_else(|| ProviderError::Request("secretKey not present in options".into()))?
            .clone();
        let client: Arc<dyn DnsProviderApiPort> = Arc::new(DnsPodClient::new(secret_id, secret_key));

        client
            .list_domains(1, 1)
            .await
            .map_err(|e| ProviderError::Request(format!("DNSPod health check failed: {e}")))?;

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
