// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Caller identity
//!
//! Identity is established by an external authentication layer and consumed
//! here as a plain value. The compiler checks `is_admin` before accepting
//! any schema-mutation plan; nothing in this crate authenticates anyone.

use serde::{Deserialize, Serialize};

/// The identity a query runs under
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Subject identifier from the authentication layer
    pub subject: String,
    /// Whether the caller may mutate the schema
    pub is_admin: bool,
}

impl CallerIdentity {
    pub fn admin(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            is_admin: true,
        }
    }

    pub fn user(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            is_admin: false,
        }
    }
}
