//! Fake record stores for failure injection and call counting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tabula_core::store::EntityQuery;
use tabula_core::{Record, RecordStore, StoreError};
use tabula_store::MemoryStore;

/// Store whose operations fail on demand, delegating otherwise.
pub struct FailingStore<S = MemoryStore> {
    inner: S,
    fail_query: bool,
    fail_resolve: bool,
    error: StoreError,
}

impl FailingStore {
    /// Every call fails with [`StoreError::Unavailable`].
    pub fn down() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_query: true,
            fail_resolve: true,
            error: StoreError::Unavailable("connection refused".into()),
        }
    }
}

impl<S: RecordStore> FailingStore<S> {
    /// Queries succeed; display-name resolution times out.
    pub fn resolves_fail(inner: S) -> Self {
        Self {
            inner,
            fail_query: false,
            fail_resolve: true,
            error: StoreError::Timeout(250),
        }
    }
}

impl<S: RecordStore> RecordStore for FailingStore<S> {
    fn query(&self, query: &EntityQuery) -> Result<Vec<Record>, StoreError> {
        if self.fail_query {
            return Err(self.error.clone());
        }
        self.inner.query(query)
    }

    fn resolve_display_name(&self, entity: &str, id: &str) -> Result<Option<String>, StoreError> {
        if self.fail_resolve {
            return Err(self.error.clone());
        }
        self.inner.resolve_display_name(entity, id)
    }
}

/// Delegating store that records every query and counts resolutions.
pub struct CountingStore<S = MemoryStore> {
    inner: S,
    queries: Mutex<Vec<EntityQuery>>,
    resolves: AtomicUsize,
}

impl<S: RecordStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            queries: Mutex::new(Vec::new()),
            resolves: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> Vec<EntityQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn resolve_count(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }
}

impl<S: RecordStore> RecordStore for CountingStore<S> {
    fn query(&self, query: &EntityQuery) -> Result<Vec<Record>, StoreError> {
        self.queries.lock().unwrap().push(query.clone());
        self.inner.query(query)
    }

    fn resolve_display_name(&self, entity: &str, id: &str) -> Result<Option<String>, StoreError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_display_name(entity, id)
    }
}
