use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque handle identifying which owner created a registry entry
/// (a DNS auto-discover loop, or the config-file reloader).
///
/// Equality only — two provenances are either the same owner or they
/// aren't. Deliberately not stringly-typed: display names collide far
/// more easily than the things they label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Provenance(u64);

/// Mints fresh, distinct [`Provenance`] values. One per process; owned
/// explicitly by whatever constructs the registry rather than living as
/// a global, so tests can mint their own isolated provenances.
#[derive(Debug, Default)]
pub struct ProvenanceMint {
    next: AtomicU64,
}

impl ProvenanceMint {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    pub fn mint(&self) -> Provenance {
        Provenance(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_are_distinct_and_comparable() {
        let mint = ProvenanceMint::new();
        let a = mint.mint();
        let b = mint.mint();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }
}
