// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query engine - the high-level entry point
//!
//! Wires the parser, compiler, and executor together around an immutable
//! schema snapshot and an execution adapter.

mod query_engine;

pub use query_engine::{CallResult, EngineOptions, QueryEngine, QueryResponse};

use thiserror::Error;

use crate::ast::ParserError;
use crate::exec::ExecutionError;
use crate::plan::{AuthorizationError, CompileError};
use crate::schema::ValidationError;

/// Top-level error for a query round trip
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("parse error: {0}")]
    Parse(#[from] ParserError),

    /// The schema itself is invalid; carries every violation found so a
    /// caller can fix them in one pass
    #[error("invalid schema: {}", format_violations(.0))]
    Validation(Vec<ValidationError>),

    #[error("compile error: {0}")]
    Compile(CompileError),

    #[error("{0}")]
    Authorization(#[from] AuthorizationError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
}

impl From<CompileError> for QueryError {
    fn from(error: CompileError) -> Self {
        match error {
            CompileError::Unauthorized(auth) => QueryError::Authorization(auth),
            other => QueryError::Compile(other),
        }
    }
}

fn format_violations(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(|violation| violation.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
