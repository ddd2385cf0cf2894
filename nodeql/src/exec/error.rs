// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution error types

use thiserror::Error;

/// Execution errors
///
/// `Storage` wraps whatever the backing adapter reports; the core neither
/// interprets nor retries it - retry policy is backend-specific.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("record of type '{0}' has no usable 'id' value")]
    MissingId(String),

    #[error("column '{column}' of type '{type_name}' does not hold a record id")]
    MalformedReference { type_name: String, column: String },

    #[error("schema change was not applied: {0}")]
    ChangeRejected(String),
}
