// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query compiler
//!
//! Walks a parsed call tree against a validated schema snapshot and
//! produces one self-contained plan per top-level call. All validation is
//! exhaustive and side-effect free: unknown names, incompatible selection
//! shapes, unauthorized mutations, and schema changes that would leave the
//! schema invalid are all rejected before any plan exists. The compiler
//! holds no state across calls; compilations against the same snapshot are
//! safe to run concurrently.

use log::debug;
use serde_json::Value;

use crate::ast::{Call, Query, Selection};
use crate::schema::introspection::{field_document, schema_document, type_document};
use crate::schema::registry::NODE_INTERFACE;
use crate::schema::{
    validate, BuiltinRegistry, FieldKind, Schema, SchemaChange, TypeDefinition,
};
use crate::schema::types::FieldDefinition;
use crate::session::CallerIdentity;

use super::error::{AuthorizationError, CompileError};
use super::query_plan::{
    ChangeNodeProjection, ChangeRecord, ChangesProjection, FieldProjection, MutationProjection,
    Page, Projection, ProjectionNode, QueryPlan, SetProjection,
};

/// Meta-selection names on connections
const META_COUNT: &str = "count";
const META_NODES: &str = "nodes";

/// Keys of a field snapshot document
const FIELD_META_KEYS: [&str; 8] = [
    "name",
    "type",
    "ofType",
    "nonNull",
    "unique",
    "reverseName",
    "description",
    "deprecationReason",
];

/// Keys of a type snapshot document
const TYPE_META_KEYS: [&str; 6] = [
    "name",
    "pluralName",
    "kind",
    "description",
    "interfaces",
    "fields",
];

/// The fixed table of available calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Node,
    Nodes,
    Schema,
    Type,
    CreateType,
    DeleteType,
    AddField,
    RemoveField,
}

impl CallKind {
    pub const ALL: [CallKind; 8] = [
        CallKind::Node,
        CallKind::Nodes,
        CallKind::Schema,
        CallKind::Type,
        CallKind::CreateType,
        CallKind::DeleteType,
        CallKind::AddField,
        CallKind::RemoveField,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CallKind::Node => "node",
            CallKind::Nodes => "nodes",
            CallKind::Schema => "schema",
            CallKind::Type => "type",
            CallKind::CreateType => "createType",
            CallKind::DeleteType => "deleteType",
            CallKind::AddField => "addField",
            CallKind::RemoveField => "removeField",
        }
    }

    /// Declared return kind, as surfaced by introspection
    pub fn returns(self) -> &'static str {
        match self {
            CallKind::Node => "node",
            CallKind::Nodes => "nodeConnection",
            CallKind::Schema => "schema",
            CallKind::Type => "type",
            CallKind::CreateType
            | CallKind::DeleteType
            | CallKind::AddField
            | CallKind::RemoveField => "mutationResult",
        }
    }

    pub fn lookup(name: &str) -> Option<CallKind> {
        CallKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            CallKind::CreateType | CallKind::DeleteType | CallKind::AddField | CallKind::RemoveField
        )
    }

    /// (name, return kind) rows for the schema introspection document
    pub fn table() -> Vec<(&'static str, &'static str)> {
        CallKind::ALL
            .into_iter()
            .map(|kind| (kind.name(), kind.returns()))
            .collect()
    }
}

/// Compiler configuration
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Bound on nested-selection recursion; cyclic schemas make the call
    /// tree's depth the only limit, so it must be finite
    pub max_depth: usize,
    /// Types a post-mutation schema must still contain
    pub required_types: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            max_depth: 32,
            required_types: Vec::new(),
        }
    }
}

/// Compiles call trees into query plans against one schema snapshot
pub struct QueryCompiler<'a> {
    schema: &'a Schema,
    registry: &'a BuiltinRegistry,
    options: CompilerOptions,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(schema: &'a Schema, registry: &'a BuiltinRegistry) -> Self {
        Self::with_options(schema, registry, CompilerOptions::default())
    }

    pub fn with_options(
        schema: &'a Schema,
        registry: &'a BuiltinRegistry,
        options: CompilerOptions,
    ) -> Self {
        Self {
            schema,
            registry,
            options,
        }
    }

    /// Compile every top-level call, in declared order. Any failure aborts
    /// the whole query with no plans produced.
    pub fn compile(
        &self,
        query: &Query,
        identity: &CallerIdentity,
    ) -> Result<Vec<QueryPlan>, CompileError> {
        debug!(
            "compiling {} call(s) for '{}'",
            query.calls.len(),
            identity.subject
        );
        query
            .calls
            .iter()
            .map(|call| self.compile_call(call, identity))
            .collect()
    }

    fn compile_call(
        &self,
        call: &Call,
        identity: &CallerIdentity,
    ) -> Result<QueryPlan, CompileError> {
        let kind = CallKind::lookup(&call.name).ok_or_else(|| CompileError::UnknownCall {
            name: call.name.clone(),
            location: call.location,
        })?;

        if kind.is_mutation() && !identity.is_admin {
            return Err(AuthorizationError {
                subject: identity.subject.clone(),
                call: call.name.clone(),
            }
            .into());
        }

        match kind {
            CallKind::Node => self.compile_node(call),
            CallKind::Nodes => self.compile_nodes(call),
            CallKind::Schema => self.compile_schema(call),
            CallKind::Type => self.compile_type(call),
            _ => self.compile_mutation(kind, call),
        }
    }

    // node(TypeName, id) { ... }
    fn compile_node(&self, call: &Call) -> Result<QueryPlan, CompileError> {
        let (type_name, id) = match call.arguments.as_slice() {
            [first, second] => match (first.as_identifier(), second.as_id()) {
                (Some(type_name), Some(id)) => (type_name, id),
                _ => return Err(bad_arguments(call, "a type name and an id")),
            },
            _ => return Err(bad_arguments(call, "a type name and an id")),
        };

        let ty = self.object_type(type_name)?;
        let projection = self.record_projection(ty, &call.selections, 0)?;

        Ok(QueryPlan::FetchById {
            type_name: ty.name.clone(),
            id: id.to_string(),
            projection,
        })
    }

    // nodes(TypeName [, limit [, offset]]) { count nodes { ... } }
    fn compile_nodes(&self, call: &Call) -> Result<QueryPlan, CompileError> {
        const EXPECTED: &str = "a type name and optional limit/offset integers";

        let (type_name, page) = match call.arguments.as_slice() {
            [first] => (first.as_identifier(), Page::everything()),
            [first, limit] => match limit.as_count() {
                Some(limit) => (
                    first.as_identifier(),
                    Page {
                        limit: Some(limit),
                        offset: None,
                    },
                ),
                None => return Err(bad_arguments(call, EXPECTED)),
            },
            [first, limit, offset] => match (limit.as_count(), offset.as_count()) {
                (Some(limit), Some(offset)) => (
                    first.as_identifier(),
                    Page {
                        limit: Some(limit),
                        offset: Some(offset),
                    },
                ),
                _ => return Err(bad_arguments(call, EXPECTED)),
            },
            _ => return Err(bad_arguments(call, EXPECTED)),
        };
        let Some(type_name) = type_name else {
            return Err(bad_arguments(call, EXPECTED));
        };

        let ty = self.object_type(type_name)?;
        let projection = self.set_projection(ty, &call.selections, 0)?;

        Ok(QueryPlan::FetchSet {
            type_name: ty.name.clone(),
            filter: None,
            page,
            projection,
        })
    }

    // schema() { types { ... } calls { ... } }
    fn compile_schema(&self, call: &Call) -> Result<QueryPlan, CompileError> {
        if !call.arguments.is_empty() {
            return Err(bad_arguments(call, "no arguments"));
        }
        let document = schema_document(self.schema, self.registry, &CallKind::table());
        let document = project_meta(document, &call.selections, "the schema")?;
        Ok(QueryPlan::Introspect { document })
    }

    // type(TypeName) { name fields { ... } }
    fn compile_type(&self, call: &Call) -> Result<QueryPlan, CompileError> {
        let type_name = match call.arguments.as_slice() {
            [only] => only
                .as_identifier()
                .ok_or_else(|| bad_arguments(call, "a type name"))?,
            _ => return Err(bad_arguments(call, "a type name")),
        };
        let ty = self.object_type(type_name)?;
        let document = project_meta(
            type_document(ty),
            &call.selections,
            &format!("type '{}'", ty.name),
        )?;
        Ok(QueryPlan::Introspect { document })
    }

    /// Schema mutations: build the delta, verify the post-mutation schema
    /// satisfies every invariant as if the change were already applied, and
    /// capture before/after snapshots for change reporting.
    fn compile_mutation(&self, kind: CallKind, call: &Call) -> Result<QueryPlan, CompileError> {
        let (change, snapshot_keys): (SchemaChange, Vec<&str>) = match kind {
            CallKind::CreateType => {
                let name = single_type_name(call)?;
                let ty = TypeDefinition::object(name, self.registry);
                (SchemaChange::CreateType(ty), TYPE_META_KEYS.to_vec())
            }
            CallKind::DeleteType => {
                let name = single_type_name(call)?;
                // Cascaded field snapshots share the projection, so both
                // key sets are legal here
                let keys = TYPE_META_KEYS
                    .iter()
                    .chain(FIELD_META_KEYS.iter())
                    .copied()
                    .collect();
                (SchemaChange::DeleteType(name.to_string()), keys)
            }
            CallKind::AddField => {
                let (type_name, field_name, field_type) = match call.arguments.as_slice() {
                    [first, second, third] => match (
                        first.as_identifier(),
                        second.as_identifier(),
                        third.as_identifier(),
                    ) {
                        (Some(a), Some(b), Some(c)) => (a, b, c),
                        _ => {
                            return Err(bad_arguments(
                                call,
                                "a type name, a field name, and a scalar field type",
                            ))
                        }
                    },
                    _ => {
                        return Err(bad_arguments(
                            call,
                            "a type name, a field name, and a scalar field type",
                        ))
                    }
                };
                if !self.registry.is_scalar(field_type) {
                    return Err(bad_arguments(call, "a scalar field type"));
                }
                (
                    SchemaChange::AddField {
                        type_name: type_name.to_string(),
                        field: FieldDefinition::scalar(field_name, field_type),
                    },
                    FIELD_META_KEYS.to_vec(),
                )
            }
            CallKind::RemoveField => {
                let (type_name, field_name) = match call.arguments.as_slice() {
                    [first, second] => match (first.as_identifier(), second.as_identifier()) {
                        (Some(a), Some(b)) => (a, b),
                        _ => return Err(bad_arguments(call, "a type name and a field name")),
                    },
                    _ => return Err(bad_arguments(call, "a type name and a field name")),
                };
                (
                    SchemaChange::RemoveField {
                        type_name: type_name.to_string(),
                        field_name: field_name.to_string(),
                    },
                    FIELD_META_KEYS.to_vec(),
                )
            }
            _ => unreachable!("non-mutation call kinds are dispatched earlier"),
        };

        // Validate against the post-mutation schema shape before accepting
        let applied = self
            .schema
            .apply_change(&change)
            .map_err(|conflict| CompileError::RejectedChange {
                reasons: vec![conflict.to_string()],
            })?;
        let violations = validate(&applied.schema, self.registry, &self.options.required_types);
        if !violations.is_empty() {
            return Err(CompileError::RejectedChange {
                reasons: violations.iter().map(ToString::to_string).collect(),
            });
        }

        let changes = self.change_records(&change, &applied.removed_fields);
        let projection = mutation_projection(&call.selections, &snapshot_keys)?;

        debug!("accepted schema change: {}", change);
        Ok(QueryPlan::MutateSchema {
            change,
            changes,
            projection,
        })
    }

    /// Before/after snapshots for every schema element a change touches.
    /// Field mutations produce exactly one record; deleteType adds one per
    /// cascade-invalidated relation field.
    fn change_records(
        &self,
        change: &SchemaChange,
        removed_fields: &[(String, FieldDefinition)],
    ) -> Vec<ChangeRecord> {
        match change {
            SchemaChange::CreateType(ty) => vec![ChangeRecord {
                old_value: None,
                new_value: Some(type_document(ty)),
            }],
            SchemaChange::DeleteType(name) => {
                let mut records = vec![ChangeRecord {
                    old_value: self.schema.get(name).map(type_document),
                    new_value: None,
                }];
                records.extend(removed_fields.iter().map(|(_, field)| ChangeRecord {
                    old_value: Some(field_document(field)),
                    new_value: None,
                }));
                records
            }
            SchemaChange::AddField { field, .. } => vec![ChangeRecord {
                old_value: None,
                new_value: Some(field_document(field)),
            }],
            SchemaChange::RemoveField {
                type_name,
                field_name,
            } => vec![ChangeRecord {
                old_value: self
                    .schema
                    .get(type_name)
                    .and_then(|ty| ty.field(field_name))
                    .map(field_document),
                new_value: None,
            }],
        }
    }

    /// Projection of a single record of `ty`. An empty selection block
    /// projects the type's stored columns (scalars and lists).
    fn record_projection(
        &self,
        ty: &TypeDefinition,
        selections: &[Selection],
        depth: usize,
    ) -> Result<Projection, CompileError> {
        if depth >= self.options.max_depth {
            return Err(CompileError::DepthExceeded(self.options.max_depth));
        }

        if selections.is_empty() {
            let fields = ty
                .fields
                .iter()
                .filter(|field| {
                    matches!(
                        field.kind(self.registry),
                        FieldKind::Scalar(_) | FieldKind::List(_)
                    )
                })
                .map(|field| FieldProjection {
                    name: field.name.clone(),
                    node: ProjectionNode::Column,
                })
                .collect();
            return Ok(Projection { fields });
        }

        let mut fields = Vec::with_capacity(selections.len());
        for selection in selections {
            let field = ty.field(&selection.name).ok_or_else(|| {
                CompileError::UnknownField {
                    type_name: ty.name.clone(),
                    field: selection.name.clone(),
                }
            })?;

            let node = match field.kind(self.registry) {
                FieldKind::Scalar(_) => {
                    require_flat(ty, field, "scalar", &selection.selections)?;
                    ProjectionNode::Column
                }
                FieldKind::List(_) => {
                    require_flat(ty, field, "list", &selection.selections)?;
                    ProjectionNode::Column
                }
                FieldKind::Reference(target_name) => {
                    let target = self.object_type(&target_name)?;
                    if target.implements(NODE_INTERFACE) {
                        ProjectionNode::ToOne {
                            type_name: target.name.clone(),
                            projection: self.record_projection(
                                target,
                                &selection.selections,
                                depth + 1,
                            )?,
                        }
                    } else {
                        // Non-Node references are stored inline
                        require_flat(ty, field, "inline reference", &selection.selections)?;
                        ProjectionNode::Column
                    }
                }
                FieldKind::Connection(target_name) => {
                    let target = self.object_type(&target_name)?;
                    let reverse_field = field.reverse_name.clone().ok_or_else(|| {
                        CompileError::BrokenRelation {
                            type_name: ty.name.clone(),
                            field: field.name.clone(),
                        }
                    })?;
                    ProjectionNode::Connection {
                        type_name: target.name.clone(),
                        reverse_field,
                        page: Page::everything(),
                        projection: self.set_projection(target, &selection.selections, depth + 1)?,
                    }
                }
            };

            fields.push(FieldProjection {
                name: selection.name.clone(),
                node,
            });
        }

        Ok(Projection { fields })
    }

    /// Projection of a record set. Only the `count` and `nodes`
    /// meta-selections are legal; an empty block projects `count` alone.
    fn set_projection(
        &self,
        ty: &TypeDefinition,
        selections: &[Selection],
        depth: usize,
    ) -> Result<SetProjection, CompileError> {
        if selections.is_empty() {
            return Ok(SetProjection {
                count: true,
                nodes: None,
            });
        }

        let mut count = false;
        let mut nodes = None;
        for selection in selections {
            match selection.name.as_str() {
                META_COUNT => {
                    if !selection.selections.is_empty() {
                        return Err(CompileError::InvalidSelection {
                            selection: META_COUNT.to_string(),
                            context: "a cardinality aggregate".to_string(),
                        });
                    }
                    count = true;
                }
                META_NODES => {
                    nodes = Some(self.record_projection(ty, &selection.selections, depth + 1)?);
                }
                other => {
                    return Err(CompileError::InvalidSelection {
                        selection: other.to_string(),
                        context: format!("a connection of {}", ty.name),
                    });
                }
            }
        }

        Ok(SetProjection { count, nodes })
    }

    fn object_type(&self, name: &str) -> Result<&'a TypeDefinition, CompileError> {
        self.schema
            .get(name)
            .ok_or_else(|| CompileError::UnknownType(name.to_string()))
    }
}

fn bad_arguments(call: &Call, expected: &'static str) -> CompileError {
    CompileError::BadArguments {
        call: call.name.clone(),
        expected,
    }
}

fn single_type_name(call: &Call) -> Result<&str, CompileError> {
    match call.arguments.as_slice() {
        [only] => only
            .as_identifier()
            .ok_or_else(|| bad_arguments(call, "a type name")),
        _ => Err(bad_arguments(call, "a type name")),
    }
}

fn require_flat(
    ty: &TypeDefinition,
    field: &FieldDefinition,
    kind: &'static str,
    selections: &[Selection],
) -> Result<(), CompileError> {
    if selections.is_empty() {
        Ok(())
    } else {
        Err(CompileError::FlatField {
            type_name: ty.name.clone(),
            field: field.name.clone(),
            kind,
        })
    }
}

/// Project an introspection document by the requested selections,
/// validating every selection name against the document's fixed keys.
/// Arrays distribute the selection over their elements; an empty selection
/// block keeps the whole subtree.
fn project_meta(
    document: Value,
    selections: &[Selection],
    context: &str,
) -> Result<Value, CompileError> {
    if selections.is_empty() {
        return Ok(document);
    }

    match document {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for selection in selections {
                let Some(value) = map.get(&selection.name) else {
                    return Err(CompileError::InvalidSelection {
                        selection: selection.name.clone(),
                        context: context.to_string(),
                    });
                };
                let projected = project_meta(
                    value.clone(),
                    &selection.selections,
                    &format!("'{}'", selection.name),
                )?;
                out.insert(selection.name.clone(), projected);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let projected: Result<Vec<Value>, CompileError> = items
                .into_iter()
                .map(|item| project_meta(item, selections, context))
                .collect();
            Ok(Value::Array(projected?))
        }
        _ => Err(CompileError::InvalidSelection {
            selection: selections[0].name.clone(),
            context: context.to_string(),
        }),
    }
}

/// Projection of a mutation result: `success` and the `changes` connection
fn mutation_projection(
    selections: &[Selection],
    snapshot_keys: &[&str],
) -> Result<MutationProjection, CompileError> {
    if selections.is_empty() {
        return Ok(MutationProjection {
            success: true,
            changes: None,
        });
    }

    let mut success = false;
    let mut changes = None;
    for selection in selections {
        match selection.name.as_str() {
            "success" => {
                if !selection.selections.is_empty() {
                    return Err(CompileError::InvalidSelection {
                        selection: "success".to_string(),
                        context: "a mutation result".to_string(),
                    });
                }
                success = true;
            }
            "changes" => {
                changes = Some(changes_projection(&selection.selections, snapshot_keys)?);
            }
            other => {
                return Err(CompileError::InvalidSelection {
                    selection: other.to_string(),
                    context: "a mutation result".to_string(),
                });
            }
        }
    }

    Ok(MutationProjection { success, changes })
}

fn changes_projection(
    selections: &[Selection],
    snapshot_keys: &[&str],
) -> Result<ChangesProjection, CompileError> {
    if selections.is_empty() {
        return Ok(ChangesProjection {
            count: true,
            nodes: None,
        });
    }

    let mut count = false;
    let mut nodes = None;
    for selection in selections {
        match selection.name.as_str() {
            META_COUNT => count = true,
            META_NODES => {
                nodes = Some(change_node_projection(&selection.selections, snapshot_keys)?);
            }
            other => {
                return Err(CompileError::InvalidSelection {
                    selection: other.to_string(),
                    context: "a changes connection".to_string(),
                });
            }
        }
    }

    Ok(ChangesProjection { count, nodes })
}

fn change_node_projection(
    selections: &[Selection],
    snapshot_keys: &[&str],
) -> Result<ChangeNodeProjection, CompileError> {
    let mut old_value = None;
    let mut new_value = None;

    for selection in selections {
        let keys = snapshot_projection(&selection.selections, snapshot_keys)?;
        match selection.name.as_str() {
            "oldValue" => old_value = Some(keys),
            "newValue" => new_value = Some(keys),
            other => {
                return Err(CompileError::InvalidSelection {
                    selection: other.to_string(),
                    context: "a change node".to_string(),
                });
            }
        }
    }

    Ok(ChangeNodeProjection {
        old_value,
        new_value,
    })
}

fn snapshot_projection(
    selections: &[Selection],
    snapshot_keys: &[&str],
) -> Result<Vec<String>, CompileError> {
    let mut keys = Vec::with_capacity(selections.len());
    for selection in selections {
        if !snapshot_keys.contains(&selection.name.as_str()) {
            return Err(CompileError::InvalidSelection {
                selection: selection.name.clone(),
                context: "a change snapshot".to_string(),
            });
        }
        if !selection.selections.is_empty() {
            return Err(CompileError::InvalidSelection {
                selection: selection.name.clone(),
                context: "a change snapshot field".to_string(),
            });
        }
        keys.push(selection.name.clone());
    }
    Ok(keys)
}
