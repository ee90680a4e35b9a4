use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::warn;

/// What just happened to the store. Delivered to every subscriber after the
/// state change is visible through the store's accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    LoadStarted,
    Loaded { count: usize },
    LoadFailed { message: String },
    /// A load finished after the collection was cleared or a newer load began;
    /// its result was dropped.
    LoadDiscarded,
    CreateStarted,
    Created { id: String },
    CreateFailed { message: String },
    Removed { id: String },
    RemoveFailed { message: String },
    Cleared,
    Reset,
}

pub(crate) type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct ListenerSet {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener)>>,
}

impl ListenerSet {
    pub(crate) fn add(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, listener));
        Subscription {
            id,
            listeners: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) {
        self.lock().retain(|(entry_id, _)| *entry_id != id);
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Call every listener with `event`.
    ///
    /// Iterates over a copy of the list, so listeners may subscribe or
    /// unsubscribe from inside the callback. A panicking listener is logged
    /// and skipped; the rest still run.
    pub(crate) fn notify(&self, event: &StoreEvent) {
        let current: Vec<(u64, Listener)> = self.lock().clone();
        for (id, listener) in current {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(listener = id, ?event, "store listener panicked");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Listener)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`CollectionStore::subscribe`](super::CollectionStore::subscribe).
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to stop receiving events.
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerSet>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(set) = self.listeners.upgrade() {
            set.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
