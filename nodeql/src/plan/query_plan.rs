// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query plan representation
//!
//! Plans are backend-agnostic and self-contained: they own copies of every
//! name and snapshot they need and hold no reference back into the schema.
//! One plan is produced per top-level call; plans within a multi-call query
//! are independent of each other, so an adapter may execute them
//! concurrently as long as results keep their declared positions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::SchemaChange;

/// Pagination window for set-returning plan nodes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Page {
    /// The whole set, unwindowed
    pub fn everything() -> Self {
        Self::default()
    }

    /// A window that materializes no records, for cardinality-only fetches
    pub fn cardinality_only() -> Self {
        Self {
            limit: Some(0),
            offset: None,
        }
    }
}

/// A compiled plan for one top-level call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum QueryPlan {
    /// Fetch exactly one record by primary identifier and project it
    FetchById {
        type_name: String,
        id: String,
        projection: Projection,
    },

    /// Fetch a filtered, paginated record set - or only its cardinality
    FetchSet {
        type_name: String,
        filter: Option<Value>,
        page: Page,
        projection: SetProjection,
    },

    /// Return schema metadata captured at compile time; reads no records
    Introspect { document: Value },

    /// Apply a schema change and report before/after snapshots
    MutateSchema {
        change: SchemaChange,
        /// One record per schema element the change touches
        changes: Vec<ChangeRecord>,
        projection: MutationProjection,
    },
}

/// Projection of a single record into the requested selection shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Projection {
    pub fields: Vec<FieldProjection>,
}

/// One projected output field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldProjection {
    pub name: String,
    pub node: ProjectionNode,
}

/// How an output field is produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ProjectionNode {
    /// Copy the record's stored column value
    Column,

    /// Follow a to-one reference; the record stores the target id
    ToOne {
        type_name: String,
        projection: Projection,
    },

    /// Traverse a connection through the target type's reverse field
    Connection {
        type_name: String,
        reverse_field: String,
        page: Page,
        projection: SetProjection,
    },
}

/// Projection of a record set or connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetProjection {
    /// Project the total cardinality
    pub count: bool,
    /// Project the records themselves
    pub nodes: Option<Projection>,
}

impl SetProjection {
    /// Whether only the cardinality was requested; such a fetch must not
    /// materialize record bodies
    pub fn count_only(&self) -> bool {
        self.count && self.nodes.is_none()
    }
}

/// Before/after snapshot for one schema element touched by a mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRecord {
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Projection of a mutation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationProjection {
    pub success: bool,
    pub changes: Option<ChangesProjection>,
}

/// Projection of the `changes` connection of a mutation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangesProjection {
    pub count: bool,
    pub nodes: Option<ChangeNodeProjection>,
}

/// Projection of one change node. An empty key list projects the whole
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeNodeProjection {
    pub old_value: Option<Vec<String>>,
    pub new_value: Option<Vec<String>>,
}
