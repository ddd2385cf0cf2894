//! Test fixture for NodeQL integration tests
//!
//! Provides an engine instance over the sample micropost schema. Tests go
//! through the public QueryEngine API; the adapter handle is exposed only
//! for seeding records.

use serde_json::Value;
use std::sync::Arc;

use nodeql::schema::{BuiltinRegistry, FieldDefinition, Schema, TypeDefinition};
use nodeql::{CallerIdentity, MemoryAdapter, QueryEngine, QueryError, QueryResponse};

/// Test fixture with an isolated engine and in-memory backend
pub struct TestFixture {
    pub engine: QueryEngine,
    pub adapter: Arc<MemoryAdapter>,
}

/// The sample schema used across the integration tests:
/// `User { handle, microposts: Connection<Micropost> }` and
/// `Micropost { text, tags, author: User }`
pub fn micropost_schema() -> Schema {
    let registry = BuiltinRegistry::new();
    Schema::new(vec![
        TypeDefinition::with_fields(
            "User",
            vec![
                FieldDefinition::scalar("handle", "string").non_null().unique(),
                FieldDefinition::connection("microposts", "Micropost", "author"),
            ],
            &registry,
        ),
        TypeDefinition::with_fields(
            "Micropost",
            vec![
                FieldDefinition::scalar("text", "string"),
                FieldDefinition::list("tags", "string"),
                FieldDefinition::reference("author", "User", "microposts"),
            ],
            &registry,
        ),
    ])
}

impl TestFixture {
    /// Engine over the micropost schema with no data
    pub fn empty() -> Self {
        let adapter = Arc::new(MemoryAdapter::new());
        let engine =
            QueryEngine::new(micropost_schema(), adapter.clone()).expect("engine init failed");
        Self { engine, adapter }
    }

    /// Engine over the micropost schema with a small seeded dataset:
    /// alice (U1) with two microposts, bob (U2) with none
    pub fn with_sample_data() -> Self {
        let fixture = Self::empty();
        fixture.seed_user("U1", "alice");
        fixture.seed_user("U2", "bob");
        fixture.seed_micropost("M1", "first post", "U1");
        fixture.seed_micropost("M2", "second post", "U1");
        fixture
    }

    pub fn seed_user(&self, id: &str, handle: &str) -> String {
        self.insert(
            "User",
            serde_json::json!({ "id": id, "handle": handle }),
        )
    }

    pub fn seed_micropost(&self, id: &str, text: &str, author_id: &str) -> String {
        self.insert(
            "Micropost",
            serde_json::json!({ "id": id, "text": text, "author": author_id }),
        )
    }

    fn insert(&self, type_name: &str, record: Value) -> String {
        match record {
            Value::Object(map) => self.adapter.insert(type_name, map),
            _ => panic!("seed records must be objects"),
        }
    }

    /// Execute under an arbitrary identity
    pub fn execute_as(
        &self,
        query: &str,
        identity: &CallerIdentity,
    ) -> Result<QueryResponse, QueryError> {
        self.engine.execute(query, identity)
    }

    /// Execute as an admin and expect success
    pub fn assert_query_succeeds(&self, query: &str) -> QueryResponse {
        self.execute_as(query, &CallerIdentity::admin("test-admin"))
            .unwrap_or_else(|error| panic!("query failed: {}\nquery: {}", error, query))
    }

    /// Execute as an admin and expect failure mentioning `expected`
    pub fn assert_query_fails(&self, query: &str, expected: &str) -> String {
        match self.execute_as(query, &CallerIdentity::admin("test-admin")) {
            Ok(_) => panic!("query unexpectedly succeeded: {}", query),
            Err(error) => {
                let message = error.to_string();
                assert!(
                    message.contains(expected),
                    "error '{}' does not mention '{}'\nquery: {}",
                    message,
                    expected,
                    query
                );
                message
            }
        }
    }
}
