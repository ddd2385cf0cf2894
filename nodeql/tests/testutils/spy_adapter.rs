//! Spy adapter: delegates to an in-memory store while recording which
//! adapter methods execution actually touched

use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

use nodeql::plan::Page;
use nodeql::schema::SchemaChange;
use nodeql::{ExecutionAdapter, ExecutionError, FetchSet, MemoryAdapter, Record};

#[derive(Default)]
pub struct SpyAdapter {
    pub inner: MemoryAdapter,
    pub fetch_by_id_calls: AtomicUsize,
    pub fetch_many_calls: AtomicUsize,
    pub reverse_relation_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
    pub apply_calls: AtomicUsize,
}

impl SpyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_calls(&self) -> usize {
        self.fetch_by_id_calls.load(Ordering::SeqCst)
            + self.fetch_many_calls.load(Ordering::SeqCst)
            + self.reverse_relation_calls.load(Ordering::SeqCst)
            + self.count_calls.load(Ordering::SeqCst)
            + self.apply_calls.load(Ordering::SeqCst)
    }
}

impl ExecutionAdapter for SpyAdapter {
    fn fetch_by_id(&self, type_name: &str, id: &str) -> Result<Option<Record>, ExecutionError> {
        self.fetch_by_id_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_by_id(type_name, id)
    }

    fn fetch_many(
        &self,
        type_name: &str,
        filter: Option<&Value>,
        page: &Page,
    ) -> Result<FetchSet, ExecutionError> {
        self.fetch_many_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_many(type_name, filter, page)
    }

    fn fetch_by_reverse_relation(
        &self,
        type_name: &str,
        field_name: &str,
        owner_id: &str,
        page: &Page,
    ) -> Result<FetchSet, ExecutionError> {
        self.reverse_relation_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .fetch_by_reverse_relation(type_name, field_name, owner_id, page)
    }

    fn count(&self, type_name: &str, filter: Option<&Value>) -> Result<u64, ExecutionError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.count(type_name, filter)
    }

    fn apply_schema_change(&self, change: &SchemaChange) -> Result<(), ExecutionError> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.apply_schema_change(change)
    }
}
