use std::collections::HashMap;

use super::record_type::RecordType;
use crate::errors::DomainError;

const WILDCARD_SENTINEL_PREFIX: &str = "fakename2222replacewildcard";

/// One node of the label-reversed DNS record trie. The root represents
/// the empty label; each level down corresponds to one more label read
/// right-to-left off a fully-qualified domain name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// This node's own label (e.g. "www"). Empty at the root.
    pub label: String,
    /// Dot-joined path of labels from the root down to this node's parent,
    /// i.e. the zone this record was inserted under.
    pub domain: String,
    pub rtype: Option<RecordType>,
    pub value: Vec<String>,
    pub children: HashMap<String, Record>,
}

impl Record {
    pub fn new_root() -> Self {
        Self::default()
    }

    /// Inserts a value for `fqdn`, creating intermediate nodes as needed.
    /// A repeated insert for the same fqdn appends to `value` and
    /// overwrites `rtype` with the latest one seen.
    pub fn add(&mut self, fqdn: &str, rtype: RecordType, value: String) -> Result<(), DomainError> {
        let mut labels: Vec<&str> = fqdn.split('.').collect();
        if labels.last() == Some(&"") {
            labels.pop();
        }
        if labels.is_empty() {
            return Err(DomainError::FqdnTooShort(fqdn.to_string()));
        }

        let mut node = self;
        let mut domain_so_far = String::new();
        for label in labels.into_iter().rev() {
            node = node
                .children
                .entry(label.to_string())
                .or_insert_with(|| Record {
                    label: label.to_string(),
                    domain: domain_so_far.clone(),
                    ..Default::default()
                });
            domain_so_far = if domain_so_far.is_empty() {
                label.to_string()
            } else {
                format!("{label}.{domain_so_far}")
            };
        }
        node.rtype = Some(rtype);
        node.value.push(value);
        Ok(())
    }

    /// Walks the same path `add` would and returns the node at the end, if
    /// every label along the way exists.
    pub fn search(&self, fqdn: &str) -> Option<&Record> {
        let mut labels: Vec<&str> = fqdn.split('.').collect();
        if labels.last() == Some(&"") {
            labels.pop();
        }
        let mut node = self;
        for label in labels.into_iter().rev() {
            node = node.children.get(label)?;
        }
        Some(node)
    }

    /// Every node reachable from `self` (inclusive) that carries a
    /// non-empty value, collected depth-first.
    pub fn real_records(&self) -> Vec<&Record> {
        let mut out = Vec::new();
        self.collect_real_records(&mut out);
        out
    }

    fn collect_real_records<'a>(&'a self, out: &mut Vec<&'a Record>) {
        if !self.value.is_empty() {
            out.push(self);
        }
        for child in self.children.values() {
            child.collect_real_records(out);
        }
    }

    /// The fully-qualified name a record label resolves to under `domain`,
    /// handling the `@` (zone apex) and `*` (wildcard) sentinels the same
    /// way the DNS providers this trie models report them.
    pub fn fqdn(&self) -> String {
        if self.label == "@" {
            self.domain.clone()
        } else if self.label == "*" {
            format!("{WILDCARD_SENTINEL_PREFIX}.{}", self.domain)
        } else if self.domain.is_empty() {
            self.label.clone()
        } else {
            format!("{}.{}", self.label, self.domain)
        }
    }

    /// Diffs `old` against `new` and returns every record from `old` whose
    /// subtree is stale in `new` — either the whole branch vanished, or a
    /// leaf that used to carry values no longer has any.
    pub fn should_refresh<'a>(old: &'a Record, new: &Record) -> Vec<&'a Record> {
        let mut stale = Vec::new();
        diff_into(old, Some(new), &mut stale);
        stale
    }
}

fn diff_into<'a>(old: &'a Record, new: Option<&Record>, stale: &mut Vec<&'a Record>) {
    let Some(new) = new else {
        stale.extend(old.real_records());
        return;
    };
    if !old.value.is_empty() && new.value.is_empty() {
        stale.push(old);
    }
    for (label, old_child) in &old.children {
        diff_into(old_child, new.children.get(label), stale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_search_round_trips() {
        let mut root = Record::new_root();
        root.add("www.example.com.", RecordType::A, "1.2.3.4".into())
            .unwrap();
        let found = root.search("www.example.com").unwrap();
        assert_eq!(found.value, vec!["1.2.3.4".to_string()]);
        assert_eq!(found.rtype, Some(RecordType::A));
    }

    #[test]
    fn add_rejects_empty_fqdn() {
        let mut root = Record::new_root();
        assert!(root.add(".", RecordType::A, "1.2.3.4".into()).is_err());
    }

    #[test]
    fn search_missing_label_is_none() {
        let mut root = Record::new_root();
        root.add("www.example.com", RecordType::A, "1.2.3.4".into())
            .unwrap();
        assert!(root.search("api.example.com").is_none());
    }

    #[test]
    fn fqdn_handles_apex_and_wildcard_sentinels() {
        let mut root = Record::new_root();
        root.add("example.com", RecordType::A, "1.1.1.1".into())
            .unwrap();
        root.add("*.example.com", RecordType::A, "1.1.1.2".into())
            .unwrap();
        let apex = root
            .search("example.com")
            .unwrap()
            .children
            .values()
            .find(|_| true);
        // Apex itself: label "com" -> "example" chain ends at node with label "example"
        let example_node = root.children.get("com").unwrap().children.get("example").unwrap();
        assert_eq!(example_node.fqdn(), "example.com");
        let wildcard_node = example_node.children.get("*").unwrap();
        assert_eq!(wildcard_node.fqdn(), "fakename2222replacewildcard.example.com");
        let _ = apex;
    }

    #[test]
    fn should_refresh_is_empty_for_identical_tries() {
        let mut root = Record::new_root();
        root.add("www.example.com", RecordType::A, "1.2.3.4".into())
            .unwrap();
        let other = root.clone();
        assert!(Record::should_refresh(&root, &other).is_empty());
    }

    #[test]
    fn should_refresh_flags_records_dropped_entirely() {
        let mut old = Record::new_root();
        old.add("www.example.com", RecordType::A, "1.2.3.4".into())
            .unwrap();
        old.add("api.example.com", RecordType::A, "5.6.7.8".into())
            .unwrap();
        let mut new = Record::new_root();
        new.add("www.example.com", RecordType::A, "1.2.3.4".into())
            .unwrap();
        let stale = Record::should_refresh(&old, &new);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].value, vec!["5.6.7.8".to_string()]);
    }

    #[test]
    fn should_refresh_handles_nested_subdomains() {
        let mut old = Record::new_root();
        old.add("a.b.example.com", RecordType::A, "9.9.9.9".into())
            .unwrap();
        let new = Record::new_root();
        let stale = Record::should_refresh(&old, &new);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].value, vec!["9.9.9.9".to_string()]);
    }
}
