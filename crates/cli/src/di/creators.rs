use std::collections::HashMap;
use std::sync::Arc;

use tlsprobe_application::ports::AutoDiscoverFactory;
use tlsprobe_infrastructure::dns_providers::{AliDnsFactory, DnsPodFactory};

/// The process-wide creator registry: every DNS auto-discover provider type
/// this build knows how to start, keyed by the string a config's
/// `auto_discover[].type` names. Registered once at startup and handed to
/// [`tlsprobe_application::Registry::new`] rather than kept as a global, so
/// tests can build registries with a different (or empty) set of creators.
pub fn build() -> HashMap<String, Arc<dyn AutoDiscoverFactory>> {
    let mut creators: HashMap<String, Arc<dyn AutoDiscoverFactory>> = HashMap::new();
    creators.insert("AliDNS".to_string(), Arc::new(AliDnsFactory));
    creators.insert("DNSPod".to_string(), Arc::new(DnsPodFactory));
    creators
}
