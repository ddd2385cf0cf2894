// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Schema module - type definitions, builtin registry, validation, mutation
//
// The schema model is an immutable snapshot: the validator borrows it
// read-only, the compiler borrows it read-only, and mutations produce a new
// snapshot via `Schema::apply_change` rather than editing in place.

pub mod introspection;
pub mod mutation;
pub mod registry;
pub mod types;
pub mod validator;

pub use mutation::{AppliedChange, SchemaChange, SchemaChangeError};
pub use registry::BuiltinRegistry;
pub use types::{FieldDefinition, FieldKind, ListElement, Schema, TypeDefinition, TypeKind};
pub use validator::{validate, ValidationError};
