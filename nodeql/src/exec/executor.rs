// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Plan executor
//!
//! Drives an execution adapter over a compiled plan and assembles the
//! result value. The executor owns projection: adapters hand back raw
//! records, and only the columns a plan asks for reach the output. Results
//! occupy their declared positions; execution order itself carries no
//! semantics, so this implementation simply walks the plan depth-first.

use serde_json::{Map, Value};

use crate::plan::{
    ChangeRecord, MutationProjection, Page, Projection, ProjectionNode, QueryPlan, SetProjection,
};

use super::adapter::{ExecutionAdapter, FetchSet, Record};
use super::error::ExecutionError;

/// Execute one plan against an adapter
pub fn execute_plan(
    plan: &QueryPlan,
    adapter: &dyn ExecutionAdapter,
) -> Result<Value, ExecutionError> {
    match plan {
        QueryPlan::FetchById {
            type_name,
            id,
            projection,
        } => match adapter.fetch_by_id(type_name, id)? {
            Some(record) => project_record(type_name, &record, projection, adapter),
            None => Ok(Value::Null),
        },

        QueryPlan::FetchSet {
            type_name,
            filter,
            page,
            projection,
        } => {
            if projection.count_only() {
                // Cardinality alone; no record bodies move
                let count = adapter.count(type_name, filter.as_ref())?;
                let mut out = Map::new();
                out.insert("count".to_string(), count.into());
                Ok(Value::Object(out))
            } else {
                let set = adapter.fetch_many(type_name, filter.as_ref(), page)?;
                project_set(type_name, &set, projection, adapter)
            }
        }

        QueryPlan::Introspect { document } => Ok(document.clone()),

        QueryPlan::MutateSchema {
            change,
            changes,
            projection,
        } => {
            adapter.apply_schema_change(change)?;
            log::info!("schema change persisted: {}", change);
            Ok(mutation_result(changes, projection))
        }
    }
}

fn project_record(
    type_name: &str,
    record: &Record,
    projection: &Projection,
    adapter: &dyn ExecutionAdapter,
) -> Result<Value, ExecutionError> {
    let mut out = Map::new();

    for field in &projection.fields {
        let value = match &field.node {
            ProjectionNode::Column => record.get(&field.name).cloned().unwrap_or(Value::Null),

            ProjectionNode::ToOne {
                type_name: target,
                projection,
            } => match record.get(&field.name) {
                None | Some(Value::Null) => Value::Null,
                Some(Value::String(target_id)) => match adapter.fetch_by_id(target, target_id)? {
                    Some(target_record) => {
                        project_record(target, &target_record, projection, adapter)?
                    }
                    None => Value::Null,
                },
                Some(_) => {
                    return Err(ExecutionError::MalformedReference {
                        type_name: type_name.to_string(),
                        column: field.name.clone(),
                    });
                }
            },

            ProjectionNode::Connection {
                type_name: target,
                reverse_field,
                page,
                projection,
            } => {
                let owner_id = record_id(type_name, record)?;
                let window = if projection.count_only() {
                    Page::cardinality_only()
                } else {
                    page.clone()
                };
                let set =
                    adapter.fetch_by_reverse_relation(target, reverse_field, owner_id, &window)?;
                project_set(target, &set, projection, adapter)?
            }
        };

        out.insert(field.name.clone(), value);
    }

    Ok(Value::Object(out))
}

fn project_set(
    type_name: &str,
    set: &FetchSet,
    projection: &SetProjection,
    adapter: &dyn ExecutionAdapter,
) -> Result<Value, ExecutionError> {
    let mut out = Map::new();

    if projection.count {
        out.insert("count".to_string(), set.total_count.into());
    }
    if let Some(node_projection) = &projection.nodes {
        let nodes: Result<Vec<Value>, ExecutionError> = set
            .records
            .iter()
            .map(|record| project_record(type_name, record, node_projection, adapter))
            .collect();
        out.insert("nodes".to_string(), Value::Array(nodes?));
    }

    Ok(Value::Object(out))
}

fn record_id<'a>(type_name: &str, record: &'a Record) -> Result<&'a str, ExecutionError> {
    record
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ExecutionError::MissingId(type_name.to_string()))
}

fn mutation_result(changes: &[ChangeRecord], projection: &MutationProjection) -> Value {
    let mut out = Map::new();

    if projection.success {
        out.insert("success".to_string(), Value::Bool(true));
    }

    if let Some(changes_projection) = &projection.changes {
        let mut connection = Map::new();
        if changes_projection.count {
            connection.insert("count".to_string(), (changes.len() as u64).into());
        }
        if let Some(node_projection) = &changes_projection.nodes {
            let nodes: Vec<Value> = changes
                .iter()
                .map(|change| {
                    let mut node = Map::new();
                    if let Some(keys) = &node_projection.old_value {
                        node.insert(
                            "oldValue".to_string(),
                            snapshot_value(change.old_value.as_ref(), keys),
                        );
                    }
                    if let Some(keys) = &node_projection.new_value {
                        node.insert(
                            "newValue".to_string(),
                            snapshot_value(change.new_value.as_ref(), keys),
                        );
                    }
                    Value::Object(node)
                })
                .collect();
            connection.insert("nodes".to_string(), Value::Array(nodes));
        }
        out.insert("changes".to_string(), Value::Object(connection));
    }

    Value::Object(out)
}

/// Project a change snapshot by the selected keys; an empty key list keeps
/// the whole snapshot, a missing snapshot side is null
fn snapshot_value(snapshot: Option<&Value>, keys: &[String]) -> Value {
    let Some(snapshot) = snapshot else {
        return Value::Null;
    };
    if keys.is_empty() {
        return snapshot.clone();
    }
    match snapshot {
        Value::Object(map) => {
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), map.get(key).cloned().unwrap_or(Value::Null));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}
