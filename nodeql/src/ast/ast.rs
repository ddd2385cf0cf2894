// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Call-tree structures for the query language
//!
//! A query is an ordered sequence of named calls. Each call may carry
//! positional literal arguments and a brace-delimited block of field
//! selections; selections nest recursively to express relation traversal.
//! The tree is schema-agnostic - call names and arguments are interpreted
//! later by the query compiler.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Location information for call-tree nodes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Location {
    /// Start of the input text
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A complete parsed query: one or more top-level calls in declared order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    pub calls: Vec<Call>,
}

/// A top-level call: `name`, `name(arg, ...)`, optionally followed by a
/// selection block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Call {
    pub name: String,
    pub arguments: Vec<Argument>,
    pub selections: Vec<Selection>,
    pub location: Location,
}

/// A field selection inside a block; its own block nests recursively
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    pub name: String,
    pub selections: Vec<Selection>,
    pub location: Location,
}

/// A positional call argument
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Argument {
    pub value: ArgumentValue,
    pub location: Location,
}

/// Literal argument values; which are legal where is decided by the compiler
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ArgumentValue {
    /// A bare identifier (type name, field name, scalar name, or id)
    Identifier(String),
    /// A double-quoted string literal
    Str(String),
    /// An integer literal
    Integer(i64),
    /// A floating-point literal
    Number(f64),
}

impl Argument {
    /// The argument as a bare identifier, if it is one
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.value {
            ArgumentValue::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// The argument as id-like text: identifiers and string literals both
    /// name record identifiers
    pub fn as_id(&self) -> Option<&str> {
        match &self.value {
            ArgumentValue::Identifier(name) => Some(name),
            ArgumentValue::Str(text) => Some(text),
            _ => None,
        }
    }

    /// The argument as a non-negative integer
    pub fn as_count(&self) -> Option<u64> {
        match self.value {
            ArgumentValue::Integer(n) if n >= 0 => Some(n as u64),
            _ => None,
        }
    }

    /// Short description of the argument's shape, for error messages
    pub fn describe(&self) -> &'static str {
        match self.value {
            ArgumentValue::Identifier(_) => "identifier",
            ArgumentValue::Str(_) => "string literal",
            ArgumentValue::Integer(_) => "integer literal",
            ArgumentValue::Number(_) => "number literal",
        }
    }
}
