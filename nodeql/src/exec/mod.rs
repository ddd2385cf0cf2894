// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Plan execution
//!
//! This module owns the storage boundary: the `ExecutionAdapter` trait an
//! external backend implements, and the plan executor that drives an
//! adapter and projects raw records into the shape a query requested.

pub mod adapter;
pub mod error;
pub mod executor;
#[cfg(feature = "memory")]
pub mod memory;

pub use adapter::{ExecutionAdapter, FetchSet, Record};
pub use error::ExecutionError;
pub use executor::execute_plan;
