// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Compile-time errors

use thiserror::Error;

use crate::ast::Location;

/// Rejection of a well-formed query during compilation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("unknown call '{name}' at {location}")]
    UnknownCall { name: String, location: Location },

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("unknown field '{field}' on type '{type_name}'")]
    UnknownField { type_name: String, field: String },

    #[error("call '{call}' expects {expected}")]
    BadArguments {
        call: String,
        expected: &'static str,
    },

    #[error("field '{field}' of type '{type_name}' is a {kind} and does not support nested selections")]
    FlatField {
        type_name: String,
        field: String,
        kind: &'static str,
    },

    #[error("selection '{selection}' is not valid on {context}")]
    InvalidSelection { selection: String, context: String },

    #[error("relation field '{field}' of type '{type_name}' has no usable reverse field")]
    BrokenRelation { type_name: String, field: String },

    #[error("selection depth exceeds the configured limit of {0}")]
    DepthExceeded(usize),

    #[error("schema change rejected: {}", .reasons.join("; "))]
    RejectedChange { reasons: Vec<String> },

    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),
}

/// Mutation attempted without an admin identity
#[derive(Debug, Clone, PartialEq, Error)]
#[error("caller '{subject}' is not authorized to run '{call}'")]
pub struct AuthorizationError {
    pub subject: String,
    pub call: String,
}
