use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tlsprobe_application::Registry;

/// Shared state handed to every Axum handler: the live registry `/metrics`
/// scrapes, and a readiness flag `/health` reports on.
///
/// `ready` flips to `true` once the initial config load and reconcile has
/// run; before that a scrape would just observe an empty registry, which is
/// indistinguishable from "nothing is configured" — `/health` lets a
/// orchestrator tell the two apart during startup.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    ready: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
