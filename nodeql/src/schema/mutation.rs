// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Schema change deltas
//!
//! A mutation call never edits the live schema; it compiles into a
//! `SchemaChange` describing the intended delta. Applying a change produces
//! a brand-new snapshot, leaving the original untouched, so concurrent
//! compilations against the old snapshot stay safe. Whoever owns the
//! current snapshot (the engine, or an external schema store) is
//! responsible for serializing appliers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::types::{FieldDefinition, Schema, TypeDefinition};

/// Delta produced by one schema-mutating call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SchemaChange {
    CreateType(TypeDefinition),
    DeleteType(String),
    AddField {
        type_name: String,
        field: FieldDefinition,
    },
    RemoveField {
        type_name: String,
        field_name: String,
    },
}

impl fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaChange::CreateType(ty) => write!(f, "createType {}", ty.name),
            SchemaChange::DeleteType(name) => write!(f, "deleteType {}", name),
            SchemaChange::AddField { type_name, field } => {
                write!(f, "addField {}.{}", type_name, field.name)
            }
            SchemaChange::RemoveField {
                type_name,
                field_name,
            } => write!(f, "removeField {}.{}", type_name, field_name),
        }
    }
}

/// Structural conflicts detected while applying a change
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaChangeError {
    #[error("type '{0}' already exists")]
    TypeExists(String),

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("type '{type_name}' already has a field '{field}'")]
    FieldExists { type_name: String, field: String },

    #[error("type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },
}

/// The outcome of applying a change: the new snapshot plus any relation
/// fields invalidated by a cascading type deletion, as (owner type, field)
#[derive(Debug, Clone)]
pub struct AppliedChange {
    pub schema: Schema,
    pub removed_fields: Vec<(String, FieldDefinition)>,
}

impl Schema {
    /// Apply a change to this snapshot, producing a new one. Deleting a
    /// type cascade-invalidates every field in other types that references
    /// it (directly or through a wrapper).
    pub fn apply_change(&self, change: &SchemaChange) -> Result<AppliedChange, SchemaChangeError> {
        let mut next = self.clone();
        let mut removed_fields = Vec::new();

        match change {
            SchemaChange::CreateType(ty) => {
                if next.contains(&ty.name) {
                    return Err(SchemaChangeError::TypeExists(ty.name.clone()));
                }
                next.types_mut().push(ty.clone());
            }
            SchemaChange::DeleteType(name) => {
                if !next.contains(name) {
                    return Err(SchemaChangeError::UnknownType(name.clone()));
                }
                next.types_mut().retain(|ty| &ty.name != name);
                for ty in next.types_mut() {
                    let owner = ty.name.clone();
                    ty.fields.retain(|field| {
                        let references_deleted = field.field_type == *name
                            || field.of_type.as_deref() == Some(name.as_str());
                        if references_deleted {
                            removed_fields.push((owner.clone(), field.clone()));
                        }
                        !references_deleted
                    });
                }
            }
            SchemaChange::AddField { type_name, field } => {
                let ty = find_type_mut(&mut next, type_name)?;
                if ty.field(&field.name).is_some() {
                    return Err(SchemaChangeError::FieldExists {
                        type_name: type_name.clone(),
                        field: field.name.clone(),
                    });
                }
                ty.fields.push(field.clone());
            }
            SchemaChange::RemoveField {
                type_name,
                field_name,
            } => {
                let ty = find_type_mut(&mut next, type_name)?;
                if ty.field(field_name).is_none() {
                    return Err(SchemaChangeError::UnknownField {
                        type_name: type_name.clone(),
                        field: field_name.clone(),
                    });
                }
                ty.fields.retain(|field| &field.name != field_name);
            }
        }

        log::debug!("applied schema change: {}", change);
        Ok(AppliedChange {
            schema: next,
            removed_fields,
        })
    }
}

fn find_type_mut<'a>(
    schema: &'a mut Schema,
    name: &str,
) -> Result<&'a mut TypeDefinition, SchemaChangeError> {
    schema
        .types_mut()
        .iter_mut()
        .find(|ty| ty.name == name)
        .ok_or_else(|| SchemaChangeError::UnknownType(name.to_string()))
}
