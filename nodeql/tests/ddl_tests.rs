//! Schema mutation tests: createType / addField / removeField / deleteType
//!
//! Mutations run through the public QueryEngine API as an admin; the
//! engine swaps in a new schema snapshot after each accepted change.

#[path = "testutils/mod.rs"]
mod testutils;

use serde_json::{json, Value};

use nodeql::{CallerIdentity, QueryError};
use testutils::test_fixture::TestFixture;

#[test]
fn test_create_type_reports_success() {
    let fixture = TestFixture::empty();

    let response = fixture.assert_query_succeeds("createType(Test) { success }");
    assert_eq!(response.single(), Some(&json!({ "success": true })));

    // The new type is immediately queryable
    let response = fixture.assert_query_succeeds("nodes(Test) { count }");
    assert_eq!(response.single(), Some(&json!({ "count": 0 })));
}

#[test]
fn test_add_field_reports_exactly_one_change() {
    let fixture = TestFixture::empty();
    fixture.assert_query_succeeds("createType(Test) { success }");

    let response = fixture.assert_query_succeeds(
        "addField(Test, test, string) { success changes { count nodes { oldValue { name } newValue { name } } } }",
    );
    let value = response.single().expect("one result");

    assert_eq!(value["success"], true);
    assert_eq!(value["changes"]["count"], 1);
    let nodes = value["changes"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["oldValue"], Value::Null);
    assert_eq!(nodes[0]["newValue"], json!({ "name": "test" }));
}

#[test]
fn test_remove_field_reports_the_old_definition() {
    let fixture = TestFixture::empty();
    fixture.assert_query_succeeds("createType(Test) { success }");
    fixture.assert_query_succeeds("addField(Test, test, string) { success }");

    let response = fixture.assert_query_succeeds(
        "removeField(Test, test) { success changes { nodes { oldValue { name type } newValue { name } } } }",
    );
    let value = response.single().expect("one result");

    let node = &value["changes"]["nodes"][0];
    assert_eq!(node["oldValue"], json!({ "name": "test", "type": "string" }));
    assert_eq!(node["newValue"], Value::Null);
}

#[test]
fn test_add_then_remove_restores_the_field_set() {
    let fixture = TestFixture::empty();
    fixture.assert_query_succeeds("createType(Test) { success }");

    let field_names = |fixture: &TestFixture| -> Vec<String> {
        fixture
            .engine
            .schema()
            .get("Test")
            .expect("Test missing")
            .fields
            .iter()
            .map(|field| field.name.clone())
            .collect()
    };

    let before = field_names(&fixture);
    fixture.assert_query_succeeds("addField(Test, test, string) { success }");
    fixture.assert_query_succeeds("removeField(Test, test) { success }");
    assert_eq!(field_names(&fixture), before);
}

#[test]
fn test_delete_type_invalidates_later_references() {
    let fixture = TestFixture::empty();
    fixture.assert_query_succeeds("createType(Test) { success }");
    fixture.assert_query_succeeds("deleteType(Test) { success }");

    let error = fixture
        .execute_as("node(Test, X) { id }", &CallerIdentity::admin("test-admin"))
        .expect_err("should fail");
    assert!(matches!(error, QueryError::Compile(_)));
}

#[test]
fn test_delete_type_cascades_into_relation_fields() {
    let fixture = TestFixture::with_sample_data();

    let response = fixture
        .assert_query_succeeds("deleteType(Micropost) { success changes { count } }");
    let value = response.single().expect("one result");

    // Two changes: the type itself and User.microposts, which referenced it
    assert_eq!(value["changes"]["count"], 2);

    let user = fixture.engine.schema().get("User").cloned().expect("User missing");
    assert!(user.field("microposts").is_none());

    fixture.assert_query_fails("node(Micropost, M1) { text }", "unknown type 'Micropost'");
}

#[test]
fn test_full_lifecycle() {
    let fixture = TestFixture::empty();

    fixture.assert_query_succeeds("createType(Test) { success }");
    let response = fixture.assert_query_succeeds(
        "addField(Test, test, string) { success changes { count nodes { oldValue { name } newValue { name } } } }",
    );
    assert_eq!(
        response.single().expect("one result")["changes"]["count"],
        1
    );
    fixture.assert_query_succeeds("deleteType(Test) { success }");
    fixture.assert_query_fails("addField(Test, again, string) { success }", "Test");
}

#[test]
fn test_mutation_requires_admin() {
    let fixture = TestFixture::empty();

    let error = fixture
        .execute_as("createType(Test) { success }", &CallerIdentity::user("intruder"))
        .expect_err("should fail");

    match error {
        QueryError::Authorization(auth) => {
            assert_eq!(auth.subject, "intruder");
            assert_eq!(auth.call, "createType");
        }
        other => panic!("expected Authorization, got {:?}", other),
    }
}

#[test]
fn test_add_field_rejects_unknown_scalar() {
    let fixture = TestFixture::empty();
    fixture.assert_query_succeeds("createType(Test) { success }");
    fixture.assert_query_fails("addField(Test, pet, Dragon) { success }", "scalar field type");
}

#[test]
fn test_add_duplicate_field_is_rejected() {
    let fixture = TestFixture::empty();
    fixture.assert_query_fails(
        "addField(User, handle, string) { success }",
        "schema change rejected",
    );
}

#[test]
fn test_remove_builtin_id_is_rejected() {
    let fixture = TestFixture::empty();
    fixture.assert_query_fails("removeField(User, id) { success }", "required by interface");
}

#[test]
fn test_remove_one_relation_side_is_rejected() {
    let fixture = TestFixture::empty();
    fixture.assert_query_fails(
        "removeField(Micropost, author) { success }",
        "schema change rejected",
    );
}

#[test]
fn test_create_reserved_type_name_is_rejected() {
    let fixture = TestFixture::empty();
    fixture.assert_query_fails(
        "createType(NodeQLSecret) { success }",
        "reserved prefix",
    );
}

#[test]
fn test_delete_type_drops_stored_records() {
    let fixture = TestFixture::with_sample_data();
    assert_eq!(fixture.adapter.stored("Micropost"), 2);

    fixture.assert_query_succeeds("deleteType(Micropost) { success }");
    assert_eq!(fixture.adapter.stored("Micropost"), 0);
}
