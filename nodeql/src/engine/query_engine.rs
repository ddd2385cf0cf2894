// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query Engine - orchestration for NodeQL query execution
//!
//! The engine owns the current schema snapshot and coordinates the query
//! pipeline: parse, compile against the snapshot, execute each plan in
//! declared order, and - for accepted schema mutations - swap in the new
//! snapshot. Snapshots are immutable; compilations in flight keep reading
//! the snapshot they started with. Schema mutations serialize on a single
//! writer lock and are revalidated against whatever snapshot is current at
//! commit time, since two concurrent mutations are not independently
//! composable.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::ast::parse_query;
use crate::exec::{execute_plan, ExecutionAdapter, ExecutionError};
use crate::plan::{CompilerOptions, QueryCompiler, QueryPlan};
use crate::schema::{validate, BuiltinRegistry, Schema, SchemaChange};
use crate::session::CallerIdentity;

use super::QueryError;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Bound on nested-selection compilation depth
    pub max_depth: usize,
    /// Types the schema must contain, now and after every mutation
    pub required_types: Vec<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_depth: 32,
            required_types: Vec::new(),
        }
    }
}

/// Result of one executed query: one value per top-level call, in declared
/// order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub results: Vec<CallResult>,
}

/// The value a single call produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallResult {
    pub call: String,
    pub value: Value,
}

impl QueryResponse {
    /// The value of the only call in a single-call query
    pub fn single(&self) -> Option<&Value> {
        match self.results.as_slice() {
            [only] => Some(&only.value),
            _ => None,
        }
    }

    /// The value of the first call named `call`
    pub fn value(&self, call: &str) -> Option<&Value> {
        self.results
            .iter()
            .find(|result| result.call == call)
            .map(|result| &result.value)
    }
}

/// Query Engine - the main entry point for executing queries
pub struct QueryEngine {
    schema: RwLock<Arc<Schema>>,
    registry: BuiltinRegistry,
    adapter: Arc<dyn ExecutionAdapter>,
    options: EngineOptions,
}

impl QueryEngine {
    /// Create an engine over a schema and an execution adapter. The schema
    /// is validated upfront; an invalid schema is refused with the full
    /// violation list.
    pub fn new(schema: Schema, adapter: Arc<dyn ExecutionAdapter>) -> Result<Self, QueryError> {
        Self::with_options(schema, adapter, EngineOptions::default())
    }

    pub fn with_options(
        schema: Schema,
        adapter: Arc<dyn ExecutionAdapter>,
        options: EngineOptions,
    ) -> Result<Self, QueryError> {
        let registry = BuiltinRegistry::new();
        let violations = validate(&schema, &registry, &options.required_types);
        if !violations.is_empty() {
            return Err(QueryError::Validation(violations));
        }

        log::info!("query engine ready with {} type(s)", schema.types().len());
        Ok(Self {
            schema: RwLock::new(Arc::new(schema)),
            registry,
            adapter,
            options,
        })
    }

    /// The current schema snapshot
    pub fn schema(&self) -> Arc<Schema> {
        self.schema.read().clone()
    }

    /// Execute a query under the given identity
    ///
    /// The whole query is compiled before anything executes; a compile
    /// failure in any call means no adapter method is ever invoked.
    pub fn execute(
        &self,
        source: &str,
        identity: &CallerIdentity,
    ) -> Result<QueryResponse, QueryError> {
        let query = parse_query(source)?;
        let snapshot = self.schema();

        let compiler = QueryCompiler::with_options(
            &snapshot,
            &self.registry,
            CompilerOptions {
                max_depth: self.options.max_depth,
                required_types: self.options.required_types.clone(),
            },
        );
        let plans = compiler.compile(&query, identity)?;

        let mut results = Vec::with_capacity(plans.len());
        for (call, plan) in query.calls.iter().zip(plans.iter()) {
            let value = execute_plan(plan, self.adapter.as_ref())?;
            if let QueryPlan::MutateSchema { change, .. } = plan {
                self.commit_change(change)?;
            }
            results.push(CallResult {
                call: call.name.clone(),
                value,
            });
        }

        Ok(QueryResponse { results })
    }

    /// Swap in the post-mutation snapshot. Concurrent mutations serialize
    /// on the write lock; a change that no longer applies cleanly, or that
    /// would leave the current snapshot invalid, is refused.
    fn commit_change(&self, change: &SchemaChange) -> Result<(), QueryError> {
        let mut guard = self.schema.write();

        let applied = guard.apply_change(change).map_err(|conflict| {
            log::warn!("schema change no longer applies: {}", conflict);
            QueryError::Execution(ExecutionError::ChangeRejected(conflict.to_string()))
        })?;

        let violations = validate(&applied.schema, &self.registry, &self.options.required_types);
        if !violations.is_empty() {
            return Err(QueryError::Validation(violations));
        }

        *guard = Arc::new(applied.schema);
        log::info!("schema snapshot updated: {}", change);
        Ok(())
    }
}
