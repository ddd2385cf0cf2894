// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory execution adapter
//!
//! A thread-safe record store implementing the full adapter contract.
//! Filters are flat equality maps; pagination is offset/limit windowing.
//! Useful as an embedded backend for small datasets and as the fixture
//! backend for integration tests.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::plan::Page;
use crate::schema::SchemaChange;

use super::adapter::{ExecutionAdapter, FetchSet, Record};
use super::error::ExecutionError;

/// In-memory record store
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    records: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, minting a v4 uuid when no id is present. Returns
    /// the record's id.
    pub fn insert(&self, type_name: &str, mut record: Record) -> String {
        let id = match record.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        record.insert("id".to_string(), Value::String(id.clone()));

        self.records
            .write()
            .entry(type_name.to_string())
            .or_default()
            .push(record);
        id
    }

    /// Number of stored records of `type_name`
    pub fn stored(&self, type_name: &str) -> usize {
        self.records
            .read()
            .get(type_name)
            .map(|records| records.len())
            .unwrap_or(0)
    }
}

fn matches_filter(record: &Record, filter: Option<&Value>) -> bool {
    let Some(Value::Object(wanted)) = filter else {
        return true;
    };
    wanted
        .iter()
        .all(|(key, value)| record.get(key) == Some(value))
}

fn window(records: Vec<Record>, page: &Page) -> Vec<Record> {
    let offset = page.offset.unwrap_or(0) as usize;
    let limit = page.limit.map(|limit| limit as usize).unwrap_or(usize::MAX);
    records.into_iter().skip(offset).take(limit).collect()
}

impl ExecutionAdapter for MemoryAdapter {
    fn fetch_by_id(&self, type_name: &str, id: &str) -> Result<Option<Record>, ExecutionError> {
        let store = self.records.read();
        Ok(store.get(type_name).and_then(|records| {
            records
                .iter()
                .find(|record| record.get("id").and_then(Value::as_str) == Some(id))
                .cloned()
        }))
    }

    fn fetch_many(
        &self,
        type_name: &str,
        filter: Option<&Value>,
        page: &Page,
    ) -> Result<FetchSet, ExecutionError> {
        let store = self.records.read();
        let matching: Vec<Record> = store
            .get(type_name)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| matches_filter(record, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let total_count = matching.len() as u64;
        Ok(FetchSet {
            records: window(matching, page),
            total_count,
        })
    }

    fn fetch_by_reverse_relation(
        &self,
        type_name: &str,
        field_name: &str,
        owner_id: &str,
        page: &Page,
    ) -> Result<FetchSet, ExecutionError> {
        let store = self.records.read();
        let matching: Vec<Record> = store
            .get(type_name)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| {
                        record.get(field_name).and_then(Value::as_str) == Some(owner_id)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let total_count = matching.len() as u64;
        Ok(FetchSet {
            records: window(matching, page),
            total_count,
        })
    }

    fn count(&self, type_name: &str, filter: Option<&Value>) -> Result<u64, ExecutionError> {
        let store = self.records.read();
        let count = store
            .get(type_name)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| matches_filter(record, filter))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    fn apply_schema_change(&self, change: &SchemaChange) -> Result<(), ExecutionError> {
        let mut store = self.records.write();
        match change {
            SchemaChange::DeleteType(name) => {
                store.remove(name);
            }
            SchemaChange::RemoveField {
                type_name,
                field_name,
            } => {
                if let Some(records) = store.get_mut(type_name) {
                    for record in records {
                        record.remove(field_name);
                    }
                }
            }
            // New types and fields need no data migration
            SchemaChange::CreateType(_) | SchemaChange::AddField { .. } => {}
        }
        log::info!("memory adapter applied schema change: {}", change);
        Ok(())
    }
}
