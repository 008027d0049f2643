//! In-process index used by tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use imgvec_core::traits::VectorIndex;
use imgvec_core::{EmbeddingVector, IngestionRecord, StoreUnavailableError, UpsertResult, VectorRecord};

#[derive(Default)]
pub struct InMemoryIndex {
    rows: RwLock<HashMap<(String, String), IngestionRecord>>,
    upsert_calls: AtomicUsize,
    outage: RwLock<Option<String>>,
}

impl InMemoryIndex {
    pub fn new() -> Self { Self::default() }

    /// Number of `upsert` calls received, successful or not.
    pub fn upsert_calls(&self) -> usize { self.upsert_calls.load(Ordering::SeqCst) }

    pub fn len(&self) -> usize { self.read_rows().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// While set, every call fails with `StoreUnavailableError::Transport`.
    pub fn set_outage(&self, reason: Option<&str>) {
        *self.outage.write().unwrap_or_else(PoisonError::into_inner) = reason.map(str::to_string);
    }

    // A panicking writer leaves the map whole (each insert is a single
    // HashMap call), so a poisoned lock still guards consistent data.
    fn read_rows(&self) -> RwLockReadGuard<'_, HashMap<(String, String), IngestionRecord>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_rows(&self) -> RwLockWriteGuard<'_, HashMap<(String, String), IngestionRecord>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_outage(&self) -> Result<(), StoreUnavailableError> {
        match self.outage.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(reason) => Err(StoreUnavailableError::Transport(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<UpsertResult, StoreUnavailableError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_outage()?;
        let mut rows = self.write_rows();
        for r in records {
            let record = IngestionRecord {
                id: r.id.clone(),
                vector: EmbeddingVector::new(r.values.clone()),
                namespace: namespace.to_string(),
                metadata: r.metadata.clone(),
            };
            rows.insert((namespace.to_string(), r.id.clone()), record);
        }
        Ok(UpsertResult { upserted_count: records.len() })
    }

    async fn fetch(&self, namespace: &str, id: &str) -> Result<Option<IngestionRecord>, StoreUnavailableError> {
        self.check_outage()?;
        Ok(self.read_rows().get(&(namespace.to_string(), id.to_string())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisoned_lock_still_reports_stored_rows() {
        let index = InMemoryIndex::new();
        index.write_rows().insert(("".into(), "a".into()), IngestionRecord {
            id: "a".into(),
            vector: EmbeddingVector::new(vec![0.0; 4]),
            namespace: String::new(),
            metadata: Default::default(),
        });

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = index.rows.write().unwrap();
            panic!("writer died");
        }));
        assert!(poisoned.is_err());
        assert!(index.rows.is_poisoned());

        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }
}
