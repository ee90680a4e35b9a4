//! The in-memory photo collection shared by every consumer.
//!
//! [`CollectionStore`] is the only thing that mutates the record list. Readers
//! take a [`Snapshot`], which stays the same allocation until the list changes,
//! so a consumer can skip recomputation with [`Snapshot::same_as`].
//!
//! Ordering guarantees around the collaborator calls:
//! - concurrent `load`s for the same user share one fetch;
//! - a `load` resolving after `clear`/`reset`, or after a newer `load` started,
//!   is discarded;
//! - records created while a `load` is in flight survive that load even if the
//!   fetched list predates them.

mod listeners;

use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::PhotoBackend;
use crate::domain::{PhotoRecord, PhotoUpload, Session};
use crate::error::{Error, Result};
use listeners::ListenerSet;
pub use listeners::{StoreEvent, Subscription};

/// Immutable view of the collection at one point in time, most recent first.
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<[PhotoRecord]>);

impl Snapshot {
    /// True when both snapshots are the identical allocation, i.e. nothing
    /// changed between the two reads.
    pub fn same_as(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn records(&self) -> &[PhotoRecord] {
        &self.0
    }
}

impl Deref for Snapshot {
    type Target = [PhotoRecord];

    fn deref(&self) -> &[PhotoRecord] {
        &self.0
    }
}

/// Result of a finished fetch, shared with callers that joined it.
type LoadOutcome = std::result::Result<usize, String>;

struct InFlightLoad {
    user_id: String,
    seq: u64,
    done: watch::Receiver<Option<LoadOutcome>>,
}

struct State {
    records: Arc<[PhotoRecord]>,
    /// Loads, creates and removes currently awaiting the backend.
    pending: usize,
    error: Option<String>,
    /// Bumped by `clear`/`reset`; loads started under an older value are stale.
    generation: u64,
    /// Bumped by every fetch that starts; only the newest may apply.
    load_seq: u64,
    in_flight: Option<InFlightLoad>,
    /// Records created since the in-flight load started, oldest first.
    created_during_load: Vec<PhotoRecord>,
}

impl State {
    fn set_records(&mut self, records: Vec<PhotoRecord>) {
        self.records = records.into();
    }
}

struct Shared {
    backend: Arc<dyn PhotoBackend>,
    state: Mutex<State>,
    listeners: Arc<ListenerSet>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a backend call as pending for as long as it lives, including when
/// the awaiting future is dropped part-way.
struct PendingGuard<'a> {
    shared: &'a Shared,
    load_seq: Option<u64>,
}

impl<'a> PendingGuard<'a> {
    /// Caller must already have counted the operation in `state.pending`.
    fn new(shared: &'a Shared, load_seq: Option<u64>) -> Self {
        Self { shared, load_seq }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.pending = state.pending.saturating_sub(1);
        if let Some(seq) = self.load_seq {
            if state.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
                state.in_flight = None;
            }
        }
    }
}

/// Cheaply cloneable handle to one shared photo collection.
#[derive(Clone)]
pub struct CollectionStore {
    shared: Arc<Shared>,
}

impl CollectionStore {
    pub fn new(backend: Arc<dyn PhotoBackend>) -> Self {
        Self::with_records(backend, Vec::new())
    }

    /// Start from a known list (most recent first) instead of an empty one.
    pub fn with_records(backend: Arc<dyn PhotoBackend>, records: Vec<PhotoRecord>) -> Self {
        let state = State {
            records: records.into(),
            pending: 0,
            error: None,
            generation: 0,
            load_seq: 0,
            in_flight: None,
            created_during_load: Vec::new(),
        };
        Self {
            shared: Arc::new(Shared {
                backend,
                state: Mutex::new(state),
                listeners: Arc::new(ListenerSet::default()),
            }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.shared.lock().records.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.shared.lock().pending > 0
    }

    /// Message from the last failed backend call, until the next load.
    pub fn error(&self) -> Option<String> {
        self.shared.lock().error.clone()
    }

    pub fn get(&self, id: &str) -> Option<PhotoRecord> {
        self.shared.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register `listener` to be called after every state change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.shared.listeners.add(Arc::new(listener))
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.listeners.len()
    }

    fn notify(&self, event: StoreEvent) {
        self.shared.listeners.notify(&event);
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Replace the collection with the backend's authoritative list for `session`.
    ///
    /// Returns the number of records held once the load settles. On failure
    /// the collection is emptied and the message is kept in [`error`](Self::error).
    /// A caller arriving while a fetch for the same user is in flight waits
    /// for that fetch instead of starting its own.
    pub async fn load(&self, session: &Session) -> Result<usize> {
        let joined = {
            let state = self.shared.lock();
            state
                .in_flight
                .as_ref()
                .filter(|f| f.user_id == session.user_id)
                .map(|f| f.done.clone())
        };
        if let Some(done) = joined {
            debug!(user = %session.user_id, "joining in-flight load");
            return wait_for_load(done).await;
        }

        let (done_tx, done_rx) = watch::channel(None);
        let (seq, generation) = {
            let mut state = self.shared.lock();
            state.load_seq += 1;
            let seq = state.load_seq;
            state.pending += 1;
            state.error = None;
            state.created_during_load.clear();
            state.in_flight = Some(InFlightLoad {
                user_id: session.user_id.clone(),
                seq,
                done: done_rx,
            });
            (seq, state.generation)
        };
        let guard = PendingGuard::new(&self.shared, Some(seq));
        self.notify(StoreEvent::LoadStarted);

        let fetched = self.shared.backend.fetch_photos(session).await;

        let (outcome, event) = {
            let mut state = self.shared.lock();
            if state.generation != generation || state.load_seq != seq {
                debug!(user = %session.user_id, seq, "discarding stale load");
                (Ok(state.records.len()), StoreEvent::LoadDiscarded)
            } else {
                match fetched {
                    Ok(raw) => {
                        let mut records: Vec<PhotoRecord> =
                            raw.into_iter().map(PhotoRecord::from).collect();
                        for created in std::mem::take(&mut state.created_during_load) {
                            if !records.iter().any(|r| r.id == created.id) {
                                records.insert(0, created);
                            }
                        }
                        let count = records.len();
                        state.set_records(records);
                        state.error = None;
                        info!(user = %session.user_id, count, "loaded photos");
                        (Ok(count), StoreEvent::Loaded { count })
                    }
                    Err(e) => {
                        let message = e.to_string();
                        warn!(user = %session.user_id, error = %message, "photo load failed");
                        state.set_records(Vec::new());
                        state.created_during_load.clear();
                        state.error = Some(message.clone());
                        (Err(message.clone()), StoreEvent::LoadFailed { message })
                    }
                }
            }
        };
        drop(guard);
        done_tx.send_replace(Some(outcome.clone()));
        self.notify(event);

        outcome.map_err(Error::LoadFailure)
    }

    /// Hand `upload` to the backend and prepend the record it returns.
    ///
    /// A failed upload leaves the collection untouched and is returned as
    /// [`Error::CreateFailure`]. If the collection was cleared while the
    /// upload was in progress the record is returned but not inserted.
    pub async fn create(&self, session: &Session, upload: PhotoUpload) -> Result<PhotoRecord> {
        let generation = {
            let mut state = self.shared.lock();
            state.pending += 1;
            state.generation
        };
        let guard = PendingGuard::new(&self.shared, None);
        self.notify(StoreEvent::CreateStarted);

        let file_name = upload.file_name.clone();
        let response = self.shared.backend.upload_photo(session, upload).await;

        let result = {
            let mut state = self.shared.lock();
            match response {
                Ok(raw) => {
                    let record = PhotoRecord::from(raw);
                    if state.generation == generation {
                        // a load that finished meanwhile may already hold it
                        let records: Vec<PhotoRecord> =
                            if state.records.iter().any(|r| r.id == record.id) {
                                state
                                    .records
                                    .iter()
                                    .map(|r| if r.id == record.id { record.clone() } else { r.clone() })
                                    .collect()
                            } else {
                                std::iter::once(record.clone())
                                    .chain(state.records.iter().cloned())
                                    .collect()
                            };
                        state.set_records(records);
                        if state.in_flight.is_some() {
                            state.created_during_load.push(record.clone());
                        }
                        info!(id = %record.id, file = %file_name, "created photo");
                    } else {
                        debug!(id = %record.id, "collection cleared during upload; not inserting");
                    }
                    Ok(record)
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "photo upload failed");
                    state.error = Some(e.to_string());
                    Err(e)
                }
            }
        };
        drop(guard);

        match result {
            Ok(record) => {
                self.notify(StoreEvent::Created {
                    id: record.id.clone(),
                });
                Ok(record)
            }
            Err(e) => {
                self.notify(StoreEvent::CreateFailed {
                    message: e.to_string(),
                });
                Err(Error::CreateFailure(e))
            }
        }
    }

    /// Delete a record through the backend, then drop it from the collection.
    pub async fn remove(&self, session: &Session, id: &str) -> Result<()> {
        {
            let mut state = self.shared.lock();
            if !state.records.iter().any(|r| r.id == id) {
                return Err(Error::RecordNotFound(id.to_string()));
            }
            state.pending += 1;
        }
        let guard = PendingGuard::new(&self.shared, None);

        let response = self.shared.backend.delete_photo(session, id).await;

        let event = {
            let mut state = self.shared.lock();
            match &response {
                Ok(()) => {
                    if state.records.iter().any(|r| r.id == id) {
                        let remaining: Vec<PhotoRecord> =
                            state.records.iter().filter(|r| r.id != id).cloned().collect();
                        state.set_records(remaining);
                    }
                    state.created_during_load.retain(|r| r.id != id);
                    StoreEvent::Removed { id: id.to_string() }
                }
                Err(e) => {
                    warn!(id, error = %e, "photo delete failed");
                    state.error = Some(e.to_string());
                    StoreEvent::RemoveFailed {
                        message: e.to_string(),
                    }
                }
            }
        };
        drop(guard);
        self.notify(event);

        response.map_err(Error::RemoveFailure)
    }

    /// Drop every record. In-flight loads will discard their results, and a
    /// later `load` starts a fresh fetch instead of joining one of them.
    pub fn clear(&self) {
        {
            let mut state = self.shared.lock();
            self.empty_locked(&mut state);
        }
        self.notify(StoreEvent::Cleared);
    }

    /// Return to the initial empty state for a new session: records and the
    /// error message are dropped and in-flight loads are invalidated.
    pub fn reset(&self) {
        {
            let mut state = self.shared.lock();
            self.empty_locked(&mut state);
            state.error = None;
        }
        self.notify(StoreEvent::Reset);
    }

    fn empty_locked(&self, state: &mut State) {
        state.generation += 1;
        // a stale fetch must not be joined by loads started after this point
        state.in_flight = None;
        state.created_during_load.clear();
        if !state.records.is_empty() {
            state.set_records(Vec::new());
        }
    }
}

async fn wait_for_load(mut done: watch::Receiver<Option<LoadOutcome>>) -> Result<usize> {
    loop {
        if let Some(outcome) = done.borrow_and_update().clone() {
            return outcome.map_err(Error::LoadFailure);
        }
        if done.changed().await.is_err() {
            // the leading load was dropped before it finished
            if let Some(outcome) = done.borrow().clone() {
                return outcome.map_err(Error::LoadFailure);
            }
            return Err(Error::LoadFailure("load was cancelled".to_string()));
        }
    }
}
