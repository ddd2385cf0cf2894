//! Data query tests: lookups, projections, relation traversal, pagination
//!
//! All tests go through the public QueryEngine API over the in-memory
//! adapter.

#[path = "testutils/mod.rs"]
mod testutils;

use serde_json::{json, Value};
use std::sync::Arc;

use nodeql::{CallerIdentity, QueryEngine, QueryError};
use testutils::spy_adapter::SpyAdapter;
use testutils::test_fixture::{micropost_schema, TestFixture};

#[test]
fn test_node_projects_exactly_the_selected_fields() {
    let fixture = TestFixture::with_sample_data();

    let response = fixture.assert_query_succeeds("node(User, U1) { handle }");
    let value = response.single().expect("one result");

    // Only the selected key appears; id and other stored columns are omitted
    assert_eq!(value, &json!({ "handle": "alice" }));
}

#[test]
fn test_node_default_projection_covers_stored_columns() {
    let fixture = TestFixture::with_sample_data();

    let response = fixture.assert_query_succeeds("node(Micropost, M1)");
    let value = response.single().expect("one result");
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();

    // Scalars and lists, not the relation reference
    assert!(keys.contains(&"id"));
    assert!(keys.contains(&"text"));
    assert!(keys.contains(&"tags"));
}

#[test]
fn test_micropost_author_traversal() {
    let fixture = TestFixture::with_sample_data();

    let response =
        fixture.assert_query_succeeds("node(Micropost, M1) { text author { handle } }");
    let value = response.single().expect("one result");

    assert_eq!(
        value,
        &json!({ "text": "first post", "author": { "handle": "alice" } })
    );
}

#[test]
fn test_connection_traversal_with_count_and_nodes() {
    let fixture = TestFixture::with_sample_data();

    let response = fixture
        .assert_query_succeeds("node(User, U1) { handle microposts { count nodes { text } } }");
    let value = response.single().expect("one result");

    assert_eq!(value["handle"], "alice");
    assert_eq!(value["microposts"]["count"], 2);
    let texts: Vec<&str> = value["microposts"]["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["first post", "second post"]);
}

#[test]
fn test_empty_connection() {
    let fixture = TestFixture::with_sample_data();

    let response = fixture.assert_query_succeeds("node(User, U2) { microposts { count } }");
    let value = response.single().expect("one result");
    assert_eq!(value["microposts"], json!({ "count": 0 }));
}

#[test]
fn test_missing_record_yields_null() {
    let fixture = TestFixture::with_sample_data();

    let response = fixture.assert_query_succeeds("node(User, nobody) { handle }");
    assert_eq!(response.single(), Some(&Value::Null));
}

#[test]
fn test_nodes_with_pagination_window() {
    let fixture = TestFixture::with_sample_data();

    let response =
        fixture.assert_query_succeeds("nodes(Micropost, 1, 1) { count nodes { text } }");
    let value = response.single().expect("one result");

    // count reflects the whole set; the window holds one record
    assert_eq!(value["count"], 2);
    assert_eq!(value["nodes"], json!([{ "text": "second post" }]));
}

#[test]
fn test_multiple_calls_keep_declared_order() {
    let fixture = TestFixture::with_sample_data();

    let response = fixture
        .assert_query_succeeds("node(User, U1) { handle } nodes(Micropost) { count }");
    assert_eq!(response.results.len(), 2);
    assert_eq!(response.results[0].call, "node");
    assert_eq!(response.results[1].call, "nodes");
    assert_eq!(response.results[1].value, json!({ "count": 2 }));
}

#[test]
fn test_count_only_skips_the_record_path() {
    let spy = Arc::new(SpyAdapter::new());
    let engine = QueryEngine::new(micropost_schema(), spy.clone()).expect("engine init failed");

    engine
        .execute("nodes(User) { count }", &CallerIdentity::user("viewer"))
        .expect("query failed");

    // Cardinality came from count(); fetch_many never ran
    assert_eq!(spy.count_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(
        spy.fetch_many_calls.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

#[test]
fn test_failed_compilation_makes_zero_adapter_calls() {
    let spy = Arc::new(SpyAdapter::new());
    let engine = QueryEngine::new(micropost_schema(), spy.clone()).expect("engine init failed");

    let error = engine
        .execute(
            "node(User, U1) { handle } node(Ghost, X) { id }",
            &CallerIdentity::user("viewer"),
        )
        .expect_err("should fail");

    assert!(matches!(error, QueryError::Compile(_)));
    assert_eq!(spy.total_calls(), 0);
}

#[test]
fn test_parse_error_reports_location() {
    let fixture = TestFixture::empty();
    let message = fixture.assert_query_fails("node(User { handle }", "expected");
    assert!(message.contains("line 1"));
}

#[test]
fn test_selection_on_scalar_is_rejected() {
    let fixture = TestFixture::with_sample_data();
    fixture.assert_query_fails(
        "node(User, U1) { handle { count } }",
        "does not support nested selections",
    );
}

#[test]
fn test_schema_introspection() {
    let fixture = TestFixture::empty();

    let response = fixture.assert_query_succeeds("schema { types { name } calls { name } }");
    let value = response.single().expect("one result");

    let type_names: Vec<&str> = value["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|ty| ty["name"].as_str().unwrap())
        .collect();
    assert_eq!(type_names, vec!["User", "Micropost"]);

    let call_names: Vec<&str> = value["calls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|call| call["name"].as_str().unwrap())
        .collect();
    assert!(call_names.contains(&"node"));
    assert!(call_names.contains(&"createType"));
}

#[test]
fn test_type_introspection() {
    let fixture = TestFixture::empty();

    let response =
        fixture.assert_query_succeeds("type(User) { name pluralName fields { name type } }");
    let value = response.single().expect("one result");

    assert_eq!(value["name"], "User");
    assert_eq!(value["pluralName"], "Users");
    let fields = value["fields"].as_array().unwrap();
    assert!(fields
        .iter()
        .any(|field| field["name"] == "microposts" && field["type"] == "Connection"));
}

#[test]
fn test_introspection_touches_no_records() {
    let spy = Arc::new(SpyAdapter::new());
    let engine = QueryEngine::new(micropost_schema(), spy.clone()).expect("engine init failed");

    engine
        .execute("schema { types { name } }", &CallerIdentity::user("viewer"))
        .expect("query failed");

    assert_eq!(spy.total_calls(), 0);
}
