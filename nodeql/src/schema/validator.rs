// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Schema validator
//!
//! Validation runs as an ordered pipeline of stages. Each stage collects
//! every violation it can detect independently; if a stage produces any
//! error the remaining stages are skipped, since their checks compound
//! unpredictably on a broken base (a duplicate type name makes every
//! by-name lookup ambiguous). The validator borrows the schema read-only
//! and never mutates it.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::registry::{BuiltinRegistry, NODE_INTERFACE, RESERVED_TYPE_PREFIX};
use super::types::{FieldDefinition, Schema, TypeDefinition, CONNECTION_MARKER, LIST_MARKER};

static TYPE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Z][A-Za-z0-9]*$").expect("type name pattern"));
static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z][A-Za-z0-9]*$").expect("field name pattern"));

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("duplicate type name '{0}'")]
    DuplicateTypeName(String),

    #[error("type name '{0}' uses the reserved prefix '{RESERVED_TYPE_PREFIX}'")]
    ReservedTypeName(String),

    #[error("plural name '{plural}' of type '{type_name}' uses the reserved prefix '{RESERVED_TYPE_PREFIX}'")]
    ReservedPluralName { type_name: String, plural: String },

    #[error("duplicate plural name '{0}'")]
    DuplicatePluralName(String),

    #[error("plural name '{plural}' of type '{type_name}' collides with type '{other}'")]
    PluralCollidesWithType {
        type_name: String,
        plural: String,
        other: String,
    },

    #[error("required type '{0}' is missing")]
    MissingRequiredType(String),

    #[error("type name '{0}' must be a capitalized identifier")]
    BadTypeName(String),

    #[error("type '{type_name}' implements unknown interface '{interface}'")]
    UnknownInterface { type_name: String, interface: String },

    #[error("type '{0}' declares no fields")]
    EmptyType(String),

    #[error("type '{type_name}' declares duplicate field '{field}'")]
    DuplicateField { type_name: String, field: String },

    #[error("field name '{field}' of type '{type_name}' must be a lowercase identifier")]
    BadFieldName { type_name: String, field: String },

    #[error("type '{type_name}' is missing field '{field}' required by interface '{interface}'")]
    MissingInterfaceField {
        type_name: String,
        interface: String,
        field: String,
    },

    #[error("field '{field}' of type '{type_name}' does not match the definition required by interface '{interface}'")]
    InterfaceFieldMismatch {
        type_name: String,
        interface: String,
        field: String,
    },

    #[error("field '{field}' of type '{type_name}' has unknown type '{field_type}'")]
    UnknownFieldType {
        type_name: String,
        field: String,
        field_type: String,
    },

    #[error("wrapper field '{field}' of type '{type_name}' must declare ofType")]
    MissingOfType { type_name: String, field: String },

    #[error("field '{field}' of type '{type_name}' is not a wrapper and must not declare ofType")]
    UnexpectedOfType { type_name: String, field: String },

    #[error("connection field '{field}' of type '{type_name}' must contain a Node type, got '{target}'")]
    BadConnectionTarget {
        type_name: String,
        field: String,
        target: String,
    },

    #[error("list field '{field}' of type '{type_name}' cannot contain Node type '{target}'")]
    BadListTarget {
        type_name: String,
        field: String,
        target: String,
    },

    #[error("relation field '{field}' of type '{type_name}' must declare reverseName")]
    MissingReverseName { type_name: String, field: String },

    #[error("relation field '{field}' of type '{type_name}' points at missing field '{reverse}' of type '{target}'")]
    DanglingReverseName {
        type_name: String,
        field: String,
        target: String,
        reverse: String,
    },

    #[error("relation field '{field}' of type '{type_name}' is not mutual: '{target}.{reverse}' does not point back")]
    NonMutualReverse {
        type_name: String,
        field: String,
        target: String,
        reverse: String,
    },

    #[error("inverse field '{target}.{reverse}' of relation '{type_name}.{field}' must be {expected}")]
    BadReverseShape {
        type_name: String,
        field: String,
        target: String,
        reverse: String,
        expected: String,
    },

    #[error("field '{field}' of type '{type_name}' cannot be unique: unique is only valid on scalar fields")]
    UniqueOnNonScalar { type_name: String, field: String },

    #[error("field '{field}' of type '{type_name}' shadows a built-in field")]
    ShadowsBuiltin { type_name: String, field: String },
}

type Stage = fn(&Schema, &BuiltinRegistry, &[String]) -> Vec<ValidationError>;

/// Validate a schema against the registry and the caller's required-type
/// list. Returns an empty list on success; otherwise every violation the
/// first failing stage detected.
pub fn validate(
    schema: &Schema,
    registry: &BuiltinRegistry,
    required_types: &[String],
) -> Vec<ValidationError> {
    let stages: &[Stage] = &[
        stage_unique_names,
        stage_required_types,
        stage_type_structure,
        stage_interface_completeness,
        stage_field_validity,
    ];

    for stage in stages {
        let errors = stage(schema, registry, required_types);
        if !errors.is_empty() {
            log::debug!("schema validation failed with {} violation(s)", errors.len());
            return errors;
        }
    }
    Vec::new()
}

/// Stage 1: type and plural names are unique and unreserved
fn stage_unique_names(
    schema: &Schema,
    _registry: &BuiltinRegistry,
    _required: &[String],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen_names: Vec<&str> = Vec::new();
    for ty in schema.types() {
        if seen_names.contains(&ty.name.as_str()) {
            errors.push(ValidationError::DuplicateTypeName(ty.name.clone()));
        }
        seen_names.push(&ty.name);

        if ty.name.starts_with(RESERVED_TYPE_PREFIX) {
            errors.push(ValidationError::ReservedTypeName(ty.name.clone()));
        }
        if ty.plural().starts_with(RESERVED_TYPE_PREFIX) {
            errors.push(ValidationError::ReservedPluralName {
                type_name: ty.name.clone(),
                plural: ty.plural(),
            });
        }
    }

    let mut seen_plurals: Vec<String> = Vec::new();
    for ty in schema.types() {
        let plural = ty.plural();
        if seen_plurals.contains(&plural) {
            errors.push(ValidationError::DuplicatePluralName(plural.clone()));
        }
        if let Some(other) = schema.types().iter().find(|other| other.name == plural) {
            errors.push(ValidationError::PluralCollidesWithType {
                type_name: ty.name.clone(),
                plural: plural.clone(),
                other: other.name.clone(),
            });
        }
        seen_plurals.push(plural);
    }

    errors
}

/// Stage 2: every required type is present
fn stage_required_types(
    schema: &Schema,
    _registry: &BuiltinRegistry,
    required: &[String],
) -> Vec<ValidationError> {
    required
        .iter()
        .filter(|name| !schema.contains(name))
        .map(|name| ValidationError::MissingRequiredType(name.clone()))
        .collect()
}

/// Stage 3: per-type structural validity
fn stage_type_structure(
    schema: &Schema,
    registry: &BuiltinRegistry,
    _required: &[String],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for ty in schema.types() {
        if !TYPE_NAME_RE.is_match(&ty.name) {
            errors.push(ValidationError::BadTypeName(ty.name.clone()));
        }

        for interface in &ty.interfaces {
            if registry.interface(interface).is_none() {
                errors.push(ValidationError::UnknownInterface {
                    type_name: ty.name.clone(),
                    interface: interface.clone(),
                });
            }
        }

        if ty.fields.is_empty() {
            errors.push(ValidationError::EmptyType(ty.name.clone()));
        }

        let mut seen_fields: Vec<&str> = Vec::new();
        for field in &ty.fields {
            if seen_fields.contains(&field.name.as_str()) {
                errors.push(ValidationError::DuplicateField {
                    type_name: ty.name.clone(),
                    field: field.name.clone(),
                });
            }
            seen_fields.push(&field.name);

            if !FIELD_NAME_RE.is_match(&field.name) {
                errors.push(ValidationError::BadFieldName {
                    type_name: ty.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
    }

    errors
}

/// Stage 4: every type carries every field its interfaces mandate, with an
/// identical definition (type, nullability, uniqueness)
fn stage_interface_completeness(
    schema: &Schema,
    registry: &BuiltinRegistry,
    _required: &[String],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for ty in schema.types() {
        for interface in &ty.interfaces {
            let Some(mandated) = registry.interface(interface) else {
                continue; // unknown interfaces failed stage 3
            };
            for required_field in mandated {
                match ty.field(&required_field.name) {
                    None => errors.push(ValidationError::MissingInterfaceField {
                        type_name: ty.name.clone(),
                        interface: interface.clone(),
                        field: required_field.name.clone(),
                    }),
                    Some(field) if !same_shape(field, required_field) => {
                        errors.push(ValidationError::InterfaceFieldMismatch {
                            type_name: ty.name.clone(),
                            interface: interface.clone(),
                            field: field.name.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }
    }

    errors
}

/// Stage 5: per-field validity (type references, wrapper consistency,
/// reverse-field consistency, uniqueness, builtin shadowing)
fn stage_field_validity(
    schema: &Schema,
    registry: &BuiltinRegistry,
    _required: &[String],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for ty in schema.types() {
        for field in &ty.fields {
            check_field(schema, registry, ty, field, &mut errors);
        }
    }

    errors
}

fn check_field(
    schema: &Schema,
    registry: &BuiltinRegistry,
    ty: &TypeDefinition,
    field: &FieldDefinition,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(builtin) = registry.default_field(&field.name) {
        if !same_shape(field, builtin) {
            errors.push(ValidationError::ShadowsBuiltin {
                type_name: ty.name.clone(),
                field: field.name.clone(),
            });
            // A shadowed builtin already has the wrong shape; the checks
            // below would only repeat that with less precision.
            return;
        }
    }

    match field.field_type.as_str() {
        CONNECTION_MARKER => {
            if field.unique {
                errors.push(unique_on_non_scalar(ty, field));
            }
            let Some(target_name) = field.of_type.as_deref() else {
                errors.push(ValidationError::MissingOfType {
                    type_name: ty.name.clone(),
                    field: field.name.clone(),
                });
                return;
            };
            match schema.get(target_name) {
                None => errors.push(unknown_field_type(ty, field, target_name)),
                Some(target) if !target.implements(NODE_INTERFACE) => {
                    errors.push(ValidationError::BadConnectionTarget {
                        type_name: ty.name.clone(),
                        field: field.name.clone(),
                        target: target_name.to_string(),
                    });
                }
                Some(target) => check_reverse(ty, field, target, true, errors),
            }
        }
        LIST_MARKER => {
            if field.unique {
                errors.push(unique_on_non_scalar(ty, field));
            }
            let Some(element) = field.of_type.as_deref() else {
                errors.push(ValidationError::MissingOfType {
                    type_name: ty.name.clone(),
                    field: field.name.clone(),
                });
                return;
            };
            if registry.is_scalar(element) {
                return;
            }
            match schema.get(element) {
                None => errors.push(unknown_field_type(ty, field, element)),
                Some(target) if target.implements(NODE_INTERFACE) => {
                    errors.push(ValidationError::BadListTarget {
                        type_name: ty.name.clone(),
                        field: field.name.clone(),
                        target: element.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        scalar if registry.is_scalar(scalar) => {
            if field.of_type.is_some() {
                errors.push(ValidationError::UnexpectedOfType {
                    type_name: ty.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        other => {
            if field.of_type.is_some() {
                errors.push(ValidationError::UnexpectedOfType {
                    type_name: ty.name.clone(),
                    field: field.name.clone(),
                });
            }
            if field.unique {
                errors.push(unique_on_non_scalar(ty, field));
            }
            match schema.get(other) {
                None => errors.push(unknown_field_type(ty, field, other)),
                Some(target) if target.implements(NODE_INTERFACE) => {
                    check_reverse(ty, field, target, false, errors);
                }
                // A non-Node reference is stored inline and needs no inverse
                Some(_) => {}
            }
        }
    }
}

/// Reverse-field consistency for a relation field whose target implements
/// Node. A to-one relation's inverse is a Connection of the origin type; a
/// connection's inverse is a to-one reference to the origin type.
fn check_reverse(
    ty: &TypeDefinition,
    field: &FieldDefinition,
    target: &TypeDefinition,
    field_is_connection: bool,
    errors: &mut Vec<ValidationError>,
) {
    let Some(reverse) = field.reverse_name.as_deref() else {
        errors.push(ValidationError::MissingReverseName {
            type_name: ty.name.clone(),
            field: field.name.clone(),
        });
        return;
    };

    let Some(inverse) = target.field(reverse) else {
        errors.push(ValidationError::DanglingReverseName {
            type_name: ty.name.clone(),
            field: field.name.clone(),
            target: target.name.clone(),
            reverse: reverse.to_string(),
        });
        return;
    };

    if inverse.reverse_name.as_deref() != Some(field.name.as_str()) {
        errors.push(ValidationError::NonMutualReverse {
            type_name: ty.name.clone(),
            field: field.name.clone(),
            target: target.name.clone(),
            reverse: reverse.to_string(),
        });
        return;
    }

    let inverse_matches = if field_is_connection {
        inverse.field_type == ty.name && inverse.of_type.is_none()
    } else {
        inverse.field_type == CONNECTION_MARKER && inverse.of_type.as_deref() == Some(ty.name.as_str())
    };

    if !inverse_matches {
        let expected = if field_is_connection {
            format!("a {} reference", ty.name)
        } else {
            format!("a Connection of {}", ty.name)
        };
        errors.push(ValidationError::BadReverseShape {
            type_name: ty.name.clone(),
            field: field.name.clone(),
            target: target.name.clone(),
            reverse: reverse.to_string(),
            expected,
        });
    }
}

/// Field identity as interfaces and builtins see it: declared type,
/// nullability, uniqueness
fn same_shape(a: &FieldDefinition, b: &FieldDefinition) -> bool {
    a.field_type == b.field_type
        && a.of_type == b.of_type
        && a.non_null == b.non_null
        && a.unique == b.unique
}

fn unique_on_non_scalar(ty: &TypeDefinition, field: &FieldDefinition) -> ValidationError {
    ValidationError::UniqueOnNonScalar {
        type_name: ty.name.clone(),
        field: field.name.clone(),
    }
}

fn unknown_field_type(
    ty: &TypeDefinition,
    field: &FieldDefinition,
    field_type: &str,
) -> ValidationError {
    ValidationError::UnknownFieldType {
        type_name: ty.name.clone(),
        field: field.name.clone(),
        field_type: field_type.to_string(),
    }
}
