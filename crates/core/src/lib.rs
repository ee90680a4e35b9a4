pub mod backend;
pub mod domain;
pub mod error;
pub mod exif;
pub mod hasher;
pub mod index;
pub mod query;
pub mod search;
pub mod settings;
pub mod store;
pub mod timestamp;

use std::sync::Arc;
use std::time::Duration;

use backend::{LibraryBackend, PhotoBackend};
use index::{FacetIndex, IndexLimits, TagEntry};
use query::{debounce, DebouncedQuery, QueryInput, QueryLayer, QueryView, DEFAULT_DEBOUNCE};
use settings::Settings;
use store::CollectionStore;

pub use domain::{PhotoRecord, PhotoUpload, Session};
pub use error::{Error, Result};

/// The main entry point: one collection store plus the query and index
/// views derived from it.
pub struct Shelf {
    store: CollectionStore,
    queries: QueryLayer,
    limits: IndexLimits,
    debounce: Duration,
}

impl Shelf {
    pub fn new(backend: Arc<dyn PhotoBackend>, limits: IndexLimits) -> Self {
        Self {
            store: CollectionStore::new(backend),
            queries: QueryLayer::new(),
            limits,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Quiet period used by [`query_channel`](Self::query_channel).
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// A shelf over the local library directory named in `settings`.
    pub fn open(settings: &Settings) -> Self {
        let backend = LibraryBackend::new(settings.library_dir.clone());
        Self::new(Arc::new(backend), settings.limits).with_debounce(settings.debounce_window())
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn limits(&self) -> &IndexLimits {
        &self.limits
    }

    pub fn debounce_window(&self) -> Duration {
        self.debounce
    }

    /// A debounced query channel using this shelf's quiet period. Feed typed
    /// text and facet selections into the [`QueryInput`]; pass each settled
    /// value from the [`DebouncedQuery`] to [`view`](Self::view).
    ///
    /// Must be called from within a tokio runtime.
    pub fn query_channel(&self) -> (QueryInput, DebouncedQuery) {
        debounce(self.debounce)
    }

    /// Filtered, month-grouped view of the current collection.
    pub fn view(&self, query: &str) -> Arc<QueryView> {
        self.queries.view(&self.store.snapshot(), query)
    }

    /// Time buckets, locations, cameras and tags over the records matching `query`.
    pub fn facets(&self, query: &str) -> FacetIndex {
        let view = self.view(query);
        FacetIndex::build(&view.records, &self.limits)
    }

    /// Tags across the whole collection whose names contain `partial`,
    /// for completing a query being typed.
    pub fn tag_suggestions(&self, partial: &str) -> Vec<TagEntry> {
        index::suggest_tags(&self.store.snapshot(), partial, self.limits.tags)
    }
}
