// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Builtin registry: scalar names and mandatory fields
//!
//! Static tables of the built-in scalar type names, the default fields every
//! object type carries, and the fields each built-in interface mandates.
//! The registry is built once and passed explicitly into the validator and
//! compiler; nothing reads it as ambient global state.

use std::collections::BTreeMap;

use super::types::FieldDefinition;

/// The identifier-bearing capability interface
pub const NODE_INTERFACE: &str = "Node";

/// Prefix reserved for internal type and plural names
pub const RESERVED_TYPE_PREFIX: &str = "NodeQL";

/// Built-in scalar type names
pub const SCALAR_TYPES: [&str; 6] = ["id", "string", "integer", "number", "boolean", "datetime"];

/// Immutable lookup tables for built-in scalars and mandatory fields
#[derive(Debug, Clone)]
pub struct BuiltinRegistry {
    default_fields: Vec<FieldDefinition>,
    interfaces: BTreeMap<String, Vec<FieldDefinition>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let id_field = FieldDefinition::scalar("id", "id").non_null().unique();

        let mut interfaces = BTreeMap::new();
        interfaces.insert(NODE_INTERFACE.to_string(), vec![id_field.clone()]);

        Self {
            default_fields: vec![id_field],
            interfaces,
        }
    }

    /// Whether `name` is a built-in scalar type
    pub fn is_scalar(&self, name: &str) -> bool {
        SCALAR_TYPES.contains(&name)
    }

    /// The default fields materialized into every object type
    pub fn default_fields(&self) -> &[FieldDefinition] {
        &self.default_fields
    }

    /// The built-in definition reserved under `name`, if any
    pub fn default_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.default_fields.iter().find(|field| field.name == name)
    }

    /// The fields mandated by interface `name`, if the interface exists
    pub fn interface(&self, name: &str) -> Option<&[FieldDefinition]> {
        self.interfaces.get(name).map(|fields| fields.as_slice())
    }

    /// Names of the built-in interfaces
    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(|name| name.as_str())
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_lookup() {
        let registry = BuiltinRegistry::new();
        assert!(registry.is_scalar("string"));
        assert!(registry.is_scalar("id"));
        assert!(!registry.is_scalar("User"));
        assert!(!registry.is_scalar("Connection"));
    }

    #[test]
    fn test_node_interface_mandates_id() {
        let registry = BuiltinRegistry::new();
        let fields = registry.interface(NODE_INTERFACE).expect("Node missing");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "id");
        assert!(fields[0].unique);
        assert!(fields[0].non_null);
    }

    #[test]
    fn test_default_field_is_reserved() {
        let registry = BuiltinRegistry::new();
        assert!(registry.default_field("id").is_some());
        assert!(registry.default_field("handle").is_none());
    }
}
