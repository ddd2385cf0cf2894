// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! NodeQL - A schema-driven document query language and query-plan compiler
//!
//! NodeQL lets a client describe, read, and mutate both data and the data's
//! own type definitions through a single textual query. A query is parsed
//! into a call tree, compiled against a validated schema snapshot, and
//! emitted as a backend-agnostic query plan.
//!
//! # Features
//!
//! - **Schema Model**: Named object types with fields, interfaces, and
//!   relations, validated by a staged pipeline
//! - **Call-Tree Parser**: A small lexer/parser for the query language
//! - **Query Compiler**: Produces self-contained plans for lookups,
//!   paginated sets, introspection, and schema mutations
//! - **Execution Boundary**: A storage-agnostic adapter trait; an in-memory
//!   adapter ships behind the default `memory` feature
//!
//! # Usage
//!
//! ```ignore
//! use nodeql::{CallerIdentity, MemoryAdapter, QueryEngine};
//!
//! let adapter = std::sync::Arc::new(MemoryAdapter::new());
//! let engine = QueryEngine::new(schema, adapter)?;
//!
//! let response = engine.execute(
//!     "node(User, some-id) { handle }",
//!     &CallerIdentity::user("viewer"),
//! )?;
//! ```

pub mod ast;
pub mod engine;
pub mod exec;
pub mod plan;
pub mod schema;
pub mod session;

// Re-export the high-level API - QueryEngine is the usual entry point
pub use engine::{CallResult, EngineOptions, QueryEngine, QueryError, QueryResponse};
pub use session::CallerIdentity;

// Re-export the execution boundary for adapter implementors
pub use exec::{ExecutionAdapter, ExecutionError, FetchSet, Record};

#[cfg(feature = "memory")]
pub use exec::memory::MemoryAdapter;

/// NodeQL version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// NodeQL crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
