// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Core schema type definitions
//
// A Schema owns an ordered set of named object types; each type owns its
// fields. Field declarations keep the raw textual type (`field_type` plus
// the auxiliary `of_type` for wrapper markers) so a deserialized schema can
// be validated before anything trusts it; `FieldDefinition::kind` classifies
// the declaration into a closed variant for exhaustive compiler dispatch.

use serde::{Deserialize, Serialize};

use super::registry::BuiltinRegistry;

/// Wrapper marker for connection fields (paginated sets of Node records)
pub const CONNECTION_MARKER: &str = "Connection";

/// Wrapper marker for list fields (inline sequences of scalars or non-Node
/// values)
pub const LIST_MARKER: &str = "List";

/// An immutable collection of named types
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    types: Vec<TypeDefinition>,
}

impl Schema {
    pub fn new(types: Vec<TypeDefinition>) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &[TypeDefinition] {
        &self.types
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.iter().find(|ty| ty.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub(crate) fn types_mut(&mut self) -> &mut Vec<TypeDefinition> {
        &mut self.types
    }
}

/// Kind of a type definition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Object,
}

/// A named object type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    /// Explicit plural name; defaults to a pluralization of `name`
    #[serde(default)]
    pub plural_name: Option<String>,
    pub kind: TypeKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    /// A fresh object type implementing Node, carrying only the registry's
    /// default fields. This is the shape `createType` produces.
    pub fn object(name: &str, registry: &BuiltinRegistry) -> Self {
        Self::with_fields(name, Vec::new(), registry)
    }

    /// An object type implementing Node with the given declared fields. The
    /// registry's default fields are materialized first; a declared field
    /// that reuses a reserved name suppresses materialization so the
    /// validator can flag the shadowing.
    pub fn with_fields(name: &str, declared: Vec<FieldDefinition>, registry: &BuiltinRegistry) -> Self {
        let mut fields: Vec<FieldDefinition> = registry
            .default_fields()
            .iter()
            .filter(|builtin| !declared.iter().any(|field| field.name == builtin.name))
            .cloned()
            .collect();
        fields.extend(declared);

        Self {
            name: name.to_string(),
            plural_name: None,
            kind: TypeKind::Object,
            description: None,
            interfaces: vec![super::registry::NODE_INTERFACE.to_string()],
            fields,
        }
    }

    /// The type's plural name: explicit if given, pluralized otherwise
    pub fn plural(&self) -> String {
        match &self.plural_name {
            Some(plural) => plural.clone(),
            None => pluralize(&self.name),
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|name| name == interface)
    }

    pub fn with_plural(mut self, plural: &str) -> Self {
        self.plural_name = Some(plural.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A field declaration within a type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    /// A scalar name, another type's name, or a wrapper marker
    pub field_type: String,
    /// The contained type when `field_type` is a wrapper marker
    #[serde(default)]
    pub of_type: Option<String>,
    #[serde(default)]
    pub non_null: bool,
    /// Valid only on scalar fields
    #[serde(default)]
    pub unique: bool,
    /// Links a relation field to its inverse field on the target type
    #[serde(default)]
    pub reverse_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

impl FieldDefinition {
    fn bare(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            of_type: None,
            non_null: false,
            unique: false,
            reverse_name: None,
            description: None,
            deprecation_reason: None,
        }
    }

    /// A scalar-typed field
    pub fn scalar(name: &str, scalar: &str) -> Self {
        Self::bare(name, scalar)
    }

    /// A to-one reference to `target`, linked back through `reverse`
    pub fn reference(name: &str, target: &str, reverse: &str) -> Self {
        Self {
            reverse_name: Some(reverse.to_string()),
            ..Self::bare(name, target)
        }
    }

    /// A connection of `target` records, linked back through `reverse`
    pub fn connection(name: &str, target: &str, reverse: &str) -> Self {
        Self {
            of_type: Some(target.to_string()),
            reverse_name: Some(reverse.to_string()),
            ..Self::bare(name, CONNECTION_MARKER)
        }
    }

    /// An inline list of `element` values
    pub fn list(name: &str, element: &str) -> Self {
        Self {
            of_type: Some(element.to_string()),
            ..Self::bare(name, LIST_MARKER)
        }
    }

    pub fn non_null(mut self) -> Self {
        self.non_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn deprecated(mut self, reason: &str) -> Self {
        self.deprecation_reason = Some(reason.to_string());
        self
    }

    /// Classify the declaration into a closed variant. Meaningful on a
    /// validated schema; on unvalidated input an unknown name classifies as
    /// a reference and fails type lookup downstream instead of panicking.
    pub fn kind(&self, registry: &BuiltinRegistry) -> FieldKind {
        match self.field_type.as_str() {
            CONNECTION_MARKER => FieldKind::Connection(self.of_type.clone().unwrap_or_default()),
            LIST_MARKER => {
                let element = self.of_type.clone().unwrap_or_default();
                if registry.is_scalar(&element) {
                    FieldKind::List(ListElement::Scalar(element))
                } else {
                    FieldKind::List(ListElement::Inline(element))
                }
            }
            scalar if registry.is_scalar(scalar) => FieldKind::Scalar(scalar.to_string()),
            other => FieldKind::Reference(other.to_string()),
        }
    }
}

/// Closed classification of a field's declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(String),
    Reference(String),
    Connection(String),
    List(ListElement),
}

/// Element kind of a list field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListElement {
    Scalar(String),
    /// A non-Node type stored inline
    Inline(String),
}

/// Naive English pluralization, capitalization-preserving
fn pluralize(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{}es", name)
    } else if let Some(stem) = name.strip_suffix('y') {
        let before = stem.chars().last().unwrap_or('a');
        if "aeiou".contains(before.to_ascii_lowercase()) {
            format!("{}s", name)
        } else {
            format!("{}ies", stem)
        }
    } else {
        format!("{}s", name)
    }
}
