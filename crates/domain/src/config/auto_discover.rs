use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_enumeration_interval_secs() -> u64 {
    300
}

fn default_domain_page_size() -> u32 {
    10
}

fn default_record_page_size() -> u32 {
    20
}

/// Configuration for one DNS auto-discover provider instance. `options`
/// carries provider-specific credentials/settings (access keys, etc.) and
/// is handed to the matching provider factory (looked up by `provider_type`
/// in the creator registry built at startup) unparsed — the factory knows
/// its own shape.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AutoDiscoverConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
    #[serde(default = "default_enumeration_interval_secs")]
    pub enumeration_interval_secs: u64,
    #[serde(default = "default_domain_page_size")]
    pub domain_page_size: u32,
    #[serde(default = "default_record_page_size")]
    pub record_page_size: u32,
}

impl AutoDiscoverConfig {
    pub fn key(&self) -> String {
        format!("AutoDiscover name: {}, type: {}", self.name, self.provider_type)
    }
}
