//! Vault watcher
//!
//! Turns file-system events for notes into change signals. Debouncing is
//! left to the signal loop.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::signals::ChangeSignals;
use crate::store::{FileStore, ItemId};

/// Keeps the underlying watcher alive; dropping it stops watching
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl VaultWatcher {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub fn watch_vault(root: &Path, signals: ChangeSignals) -> notify::Result<VaultWatcher> {
    // Events carry canonical paths
    let root = root.canonicalize().map_err(notify::Error::io)?;
    let resolver = FileStore::new(root.clone());

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let event = match res {
            Ok(e) => e,
            Err(e) => {
                log::warn!("[watcher] Watch error: {}", e);
                return;
            }
        };
        for id in changed_notes(&resolver, &event) {
            signals.signal(id);
        }
    })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    log::info!("[watcher] Watching {}", root.display());

    Ok(VaultWatcher {
        _watcher: watcher,
        root,
    })
}

fn changed_notes(resolver: &FileStore, event: &Event) -> Vec<ItemId> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => {}
        _ => return Vec::new(),
    }
    event
        .paths
        .iter()
        .filter_map(|path| resolver.id_for(path))
        .collect()
}
