// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution adapter trait definition
//!
//! This module defines the trait that storage backends implement. The
//! adapter returns raw records; projection into the requested selection
//! shape is owned by the plan executor, never by the backend.
//!
//! Record layout contract: a record is a flat JSON object. A to-one
//! relation field stores the target record's id as a string; connection
//! membership is stored on the *target* side, in the connection's reverse
//! field. Absent columns project as null.

use serde_json::Value;

use super::error::ExecutionError;
use crate::plan::Page;
use crate::schema::SchemaChange;

/// A raw stored record
pub type Record = serde_json::Map<String, Value>;

/// A fetched window of records plus the total cardinality of the
/// unwindowed set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchSet {
    pub records: Vec<Record>,
    pub total_count: u64,
}

/// Storage boundary for plan execution
///
/// Implementations must be safe to share across threads: nested relation
/// fetches within one plan, and plans within one query, may be executed
/// concurrently.
pub trait ExecutionAdapter: Send + Sync {
    /// Fetch one record of `type_name` by primary identifier
    ///
    /// # Returns
    /// * `Ok(Some(record))` when the record exists
    /// * `Ok(None)` when it does not - absence is not an error
    fn fetch_by_id(&self, type_name: &str, id: &str) -> Result<Option<Record>, ExecutionError>;

    /// Fetch a filtered, paginated window of records of `type_name`
    ///
    /// `total_count` must reflect the filtered set before windowing.
    fn fetch_many(
        &self,
        type_name: &str,
        filter: Option<&Value>,
        page: &Page,
    ) -> Result<FetchSet, ExecutionError>;

    /// Fetch the records of `type_name` whose `field_name` column holds
    /// `owner_id` - the target side of a connection traversal
    fn fetch_by_reverse_relation(
        &self,
        type_name: &str,
        field_name: &str,
        owner_id: &str,
        page: &Page,
    ) -> Result<FetchSet, ExecutionError>;

    /// Cardinality of the filtered set, without materializing records
    ///
    /// The default asks `fetch_many` for a zero-record window; backends
    /// that can answer from an index should override this.
    fn count(&self, type_name: &str, filter: Option<&Value>) -> Result<u64, ExecutionError> {
        self.fetch_many(type_name, filter, &Page::cardinality_only())
            .map(|set| set.total_count)
    }

    /// Persist a schema change
    ///
    /// The core has already validated the change against the post-mutation
    /// schema shape; the adapter only persists it (and may still refuse,
    /// e.g. on a storage fault).
    fn apply_schema_change(&self, change: &SchemaChange) -> Result<(), ExecutionError>;
}
