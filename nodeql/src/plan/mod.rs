// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query planning for the call-tree language
//!
//! This module converts parsed call trees into self-contained, executable
//! query plans. Compilation validates the whole tree against the schema
//! before any plan is handed to an execution adapter; a failed compilation
//! produces no plan at all.

pub mod compiler;
pub mod error;
pub mod query_plan;

pub use compiler::{CallKind, CompilerOptions, QueryCompiler};
pub use error::{AuthorizationError, CompileError};
pub use query_plan::{
    ChangeNodeProjection, ChangeRecord, ChangesProjection, FieldProjection, MutationProjection,
    Page, Projection, ProjectionNode, QueryPlan, SetProjection,
};
