use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

/// Watches a config file for writes and invokes `on_change` on the calling
/// Tokio runtime whenever one is observed. Editors that replace the file
/// (write-new-then-rename) show up as a `Create` event for the same path,
/// so both are treated as "the file changed".
pub struct ConfigFileWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigFileWatcher {
    pub fn watch<F>(path: impl AsRef<Path>, on_change: F) -> notify::Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let path: PathBuf = path.as_ref().to_path_buf();
        let on_change = Arc::new(on_change);
        let handle = tokio::runtime::Handle::current();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    warn!(%err, "config file watcher error");
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            debug!(?event.paths, "config file change observed");
            let on_change = on_change.clone();
            handle.spawn_blocking(move || on_change());
        })?;

        // Watching the parent directory (not the file itself) survives
        // editors that replace the file via rename instead of writing
        // in place, which would otherwise orphan an inode-based watch.
        let watch_target = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        watcher.watch(watch_target, RecursiveMode::NonRecursive)?;

        Ok(Self { _watcher: watcher })
    }
}
