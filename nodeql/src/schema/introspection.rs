// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Introspection documents
//!
//! Builders that project schema metadata into plain JSON documents. Every
//! document carries its full fixed key set (absent values as null), so the
//! compiler can validate meta-selections against the keys alone and the
//! executor can project by key without consulting the schema again.

use serde_json::{json, Value};

use super::registry::{BuiltinRegistry, SCALAR_TYPES};
use super::types::{FieldDefinition, Schema, TypeDefinition};

/// Metadata document for one field
pub fn field_document(field: &FieldDefinition) -> Value {
    json!({
        "name": field.name,
        "type": field.field_type,
        "ofType": field.of_type,
        "nonNull": field.non_null,
        "unique": field.unique,
        "reverseName": field.reverse_name,
        "description": field.description,
        "deprecationReason": field.deprecation_reason,
    })
}

/// Metadata document for one type
pub fn type_document(ty: &TypeDefinition) -> Value {
    let fields: Vec<Value> = ty.fields.iter().map(field_document).collect();
    json!({
        "name": ty.name,
        "pluralName": ty.plural(),
        "kind": "object",
        "description": ty.description,
        "interfaces": ty.interfaces,
        "fields": fields,
    })
}

/// Metadata document for the whole schema, including the fixed call table
/// (call name and declared return kind)
pub fn schema_document(
    schema: &Schema,
    registry: &BuiltinRegistry,
    calls: &[(&str, &str)],
) -> Value {
    let types: Vec<Value> = schema.types().iter().map(type_document).collect();
    let interfaces: Vec<&str> = registry.interface_names().collect();
    let calls: Vec<Value> = calls
        .iter()
        .map(|(name, returns)| json!({ "name": name, "returns": returns }))
        .collect();

    json!({
        "types": types,
        "interfaces": interfaces,
        "scalars": SCALAR_TYPES,
        "calls": calls,
    })
}
