//! Subscription registry over the store tree.
//!
//! Components register interest in a subtree and get back an explicit handle
//! they own and must release at teardown; there is no ambient/global
//! unsubscribe. The runtime drives `poll`, which snapshots every watched
//! subtree and emits a change event whenever a snapshot differs from the
//! cached one. Events for a given subtree are emitted in the order the store
//! produced them; no ordering is promised across subtrees.

use crate::store::StoreBackend;
use log::warn;
use serde_json::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WatchHandle(u64);

#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub handle: WatchHandle,
    pub path: String,
    pub value: Value,
}

struct Watch {
    id: u64,
    path: String,
    /// Last snapshot delivered; `None` until the first successful read, so
    /// the initial snapshot (including null for a missing subtree) is always
    /// emitted once.
    last: Option<Value>,
}

#[derive(Default)]
pub struct WatchHub {
    next_id: u64,
    watches: Vec<Watch>,
}

impl WatchHub {
    pub fn new() -> Self {
        WatchHub::default()
    }

    pub fn subscribe(&mut self, path: &str) -> WatchHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.watches.push(Watch {
            id,
            path: path.to_string(),
            last: None,
        });
        WatchHandle(id)
    }

    /// Release a subscription. Returns false when the handle was already
    /// released (double release is harmless but indicates a wiring bug).
    pub fn unsubscribe(&mut self, handle: WatchHandle) -> bool {
        let before = self.watches.len();
        self.watches.retain(|w| w.id != handle.0);
        self.watches.len() != before
    }

    pub fn active_count(&self) -> usize {
        self.watches.len()
    }

    /// Snapshot every watched subtree and emit events for changed ones.
    /// A failed read is logged and skipped; the watch stays registered and
    /// the next poll retries. Read failures are never fatal.
    pub fn poll(&mut self, store: &dyn StoreBackend) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        for watch in &mut self.watches {
            let value = match store.read(&watch.path) {
                Ok(v) => v,
                Err(e) => {
                    warn!("watch {}: read failed: {}", watch.path, e);
                    continue;
                }
            };
            if watch.last.as_ref() != Some(&value) {
                events.push(ChangeEvent {
                    handle: WatchHandle(watch.id),
                    path: watch.path.clone(),
                    value: value.clone(),
                });
                watch.last = Some(value);
            }
        }
        events
    }
}
