//! The executor on queries and mutations: field collection, ordering,
//! non-null propagation, abstract types, and the sync entry point.

use crate::json_root;
use crate::request;
use crate::response_json;
use crate::test_document;
use crate::test_schema;
use graphyne::execute;
use graphyne::execute_sync;
use graphyne::JsonMap;
use graphyne::Request;
use graphyne::ResolveError;
use graphyne::ResolvedValue;
use graphyne::Resolver;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn resolves_sibling_fields_in_source_order() {
    // type Query { a: String, b: String } with root { a: "a", b: "b" }
    let response = execute_sync(request(
        "type Query { a: String b: String }",
        "{ a b }",
        json!({ "a": "a", "b": "b" }),
    ));
    assert_eq!(
        response_json(&response),
        json!({ "data": { "a": "a", "b": "b" } })
    );
}

#[test]
fn skip_and_include_drop_fields() {
    let response = execute_sync(request(
        "type Query { a: String b: String }",
        "{ a, b @include(if: false) }",
        json!({ "a": "a", "b": "b" }),
    ));
    assert_eq!(response_json(&response), json!({ "data": { "a": "a" } }));

    // `@skip` driven by a variable
    let schema = test_schema("type Query { a: String b: String }");
    let document = test_document(&schema, "query Q($skipped: Boolean!) { a @skip(if: $skipped) b }");
    let mut variables = JsonMap::new();
    variables.insert("skipped".to_owned(), json!(true));
    let with_variables = execute_sync(
        Request::new(schema, document, json_root("Query", json!({ "a": "a", "b": "b" })))
            .variables(variables),
    );
    assert_eq!(response_json(&with_variables), json!({ "data": { "b": "b" } }));
}

#[test]
fn aliases_rename_response_keys() {
    let response = execute_sync(request(
        "type Query { a: String }",
        "{ renamed: a }",
        json!({ "a": "value" }),
    ));
    assert_eq!(
        response_json(&response),
        json!({ "data": { "renamed": "value" } })
    );
}

#[test]
fn fragments_merge_into_the_selection() {
    let response = execute_sync(request(
        "type Query { a: String b: String c: String }",
        "{ a ...Rest ... on Query { c } } fragment Rest on Query { b }",
        json!({ "a": "1", "b": "2", "c": "3" }),
    ));
    assert_eq!(
        response_json(&response),
        json!({ "data": { "a": "1", "b": "2", "c": "3" } })
    );
}

/// A resolver where some fields fail and some suspend.
struct Bespoke;

impl Resolver for Bespoke {
    fn type_name(&self) -> &str {
        "Query"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        match field_name {
            "ok" => Ok(ResolvedValue::leaf("fine")),
            "fails" => Err(ResolveError::new("bad")),
            "slow" => Ok(ResolvedValue::pending(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(ResolvedValue::leaf("slow"))
            })),
            "fast" => Ok(ResolvedValue::pending(async {
                Ok(ResolvedValue::leaf("fast"))
            })),
            "never" => Ok(ResolvedValue::pending(futures::future::pending())),
            "numbers" => Ok(ResolvedValue::iter([
                Ok(ResolvedValue::leaf(1)),
                Err(ResolveError::new("bad")),
                Ok(ResolvedValue::leaf(2)),
            ])),
            other => Err(ResolveError::unknown_field(other, self)),
        }
    }
}

#[test]
fn resolver_errors_become_field_errors() {
    let schema = test_schema("type Query { ok: String fails: String }");
    let document = test_document(&schema, "{ ok fails }");
    let response = execute_sync(Request::new(schema, document, Arc::new(Bespoke)));
    assert_eq!(
        response_json(&response),
        json!({
            "errors": [{
                "message": "bad",
                "locations": [{ "line": 1, "column": 6 }],
                "path": ["fails"],
            }],
            "data": { "ok": "fine", "fails": null },
        })
    );
}

#[test]
fn list_of_non_null_items_nulls_the_list_on_item_error() {
    let schema = test_schema("type Query { numbers: [Int!] }");
    let document = test_document(&schema, "{ numbers }");
    let response = execute_sync(Request::new(schema, document, Arc::new(Bespoke)));
    assert_eq!(
        response_json(&response),
        json!({
            "errors": [{
                "message": "bad",
                "locations": [{ "line": 1, "column": 3 }],
                "path": ["numbers", 1],
            }],
            "data": { "numbers": null },
        })
    );
}

#[test]
fn non_null_errors_propagate_to_the_nearest_nullable_ancestor() {
    let sdl = "
        type Query { outer: Outer }
        type Outer { inner: Inner! }
        type Inner { value: String! }
    ";
    let response = execute_sync(request(
        sdl,
        "{ outer { inner { value } } }",
        json!({ "outer": { "inner": { "value": null } } }),
    ));
    let body = response_json(&response);
    // The error is recorded at the violation site...
    assert_eq!(body["errors"][0]["path"], json!(["outer", "inner", "value"]));
    // ...and null propagates through inner! up to the nullable outer
    assert_eq!(body["data"], json!({ "outer": null }));
}

#[test]
fn non_null_error_at_the_root_nulls_data() {
    let response = execute_sync(request(
        "type Query { required: String! }",
        "{ required }",
        json!({ "required": null }),
    ));
    let body = response_json(&response);
    assert_eq!(body["data"], json!(null));
    assert_eq!(body["errors"][0]["path"], json!(["required"]));
}

#[test]
fn abstract_types_resolve_through_typename() {
    let sdl = "
        type Query { pet: Pet known: Named }
        union Pet = Dog | Cat
        interface Named { name: String }
        type Dog { name: String barks: Boolean }
        type Cat implements Named { name: String }
    ";
    let response = execute_sync(request(
        sdl,
        "{ pet { __typename ... on Dog { barks } } known { name __typename } }",
        json!({
            "pet": { "__typename": "Dog", "barks": true },
            "known": { "__typename": "Cat", "name": "Whiskers" },
        }),
    ));
    assert_eq!(
        response_json(&response),
        json!({ "data": {
            "pet": { "__typename": "Dog", "barks": true },
            "known": { "name": "Whiskers", "__typename": "Cat" },
        }})
    );
}

#[test]
fn resolving_to_a_type_outside_the_union_is_an_error() {
    let sdl = "
        type Query { pet: Pet }
        union Pet = Dog
        type Dog { name: String }
        type Robot { name: String }
    ";
    let response = execute_sync(request(
        sdl,
        "{ pet { __typename } }",
        json!({ "pet": { "__typename": "Robot" } }),
    ));
    let body = response_json(&response);
    assert_eq!(body["data"], json!({ "pet": null }));
    let message = body["errors"][0]["message"].as_str().unwrap();
    assert!(message.contains("not a possible type"), "{message}");
}

#[tokio::test]
async fn pending_siblings_are_awaited_together() {
    let schema = test_schema("type Query { slow: String fast: String }");
    let document = test_document(&schema, "{ slow fast }");
    let started = std::time::Instant::now();
    let response = execute(Request::new(schema, document, Arc::new(Bespoke)))
        .await
        .into_response();
    assert_eq!(
        response_json(&response),
        json!({ "data": { "slow": "slow", "fast": "fast" } })
    );
    // Sibling source order is kept even though completion order differed
    let keys: Vec<_> = match &response.data {
        graphyne::ResponseData::Object(map) => map.keys().cloned().collect(),
        other => panic!("expected data, got {other:?}"),
    };
    assert_eq!(keys, ["slow", "fast"]);
    assert!(started.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn execute_and_execute_sync_agree_on_synchronous_schemas() {
    let sdl = "type Query { a: String b: [Int] }";
    let query = "{ a b }";
    let data = json!({ "a": "a", "b": [1, 2, 3] });
    let asynchronous = execute(request(sdl, query, data.clone()))
        .await
        .into_response();
    let synchronous = execute_sync(request(sdl, query, data));
    assert_eq!(response_json(&asynchronous), response_json(&synchronous));
}

#[test]
fn execute_sync_rejects_suspending_resolvers() {
    let schema = test_schema("type Query { never: String }");
    let document = test_document(&schema, "{ never }");
    let response = execute_sync(Request::new(schema, document, Arc::new(Bespoke)));
    let body = response_json(&response);
    let message = body["errors"][0]["message"].as_str().unwrap();
    assert!(message.contains("synchronously"), "{message}");
    assert_eq!(body.get("data"), None);
}

/// Mutation steps record a strictly increasing counter; asynchronous steps
/// only bump it after a real suspension.
struct Stepper {
    counter: Arc<AtomicI64>,
}

impl Resolver for Stepper {
    fn type_name(&self) -> &str {
        "Mutation"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        match field_name {
            "syncStep" => Ok(ResolvedValue::leaf(
                self.counter.fetch_add(1, Ordering::SeqCst) + 1,
            )),
            "asyncStep" => {
                let counter = self.counter.clone();
                Ok(ResolvedValue::pending(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(ResolvedValue::leaf(counter.fetch_add(1, Ordering::SeqCst) + 1))
                }))
            }
            other => Err(ResolveError::unknown_field(other, self)),
        }
    }
}

#[tokio::test]
async fn mutations_execute_serially() {
    let schema = test_schema(
        "type Query { unused: Int } type Mutation { syncStep: Int asyncStep: Int }",
    );
    let document = test_document(
        &schema,
        "mutation M { a: asyncStep b: syncStep c: asyncStep d: syncStep e: asyncStep }",
    );
    let counter = Arc::new(AtomicI64::new(0));
    let response = execute(Request::new(
        schema,
        document,
        Arc::new(Stepper { counter }),
    ))
    .await
    .into_response();
    assert_eq!(
        response_json(&response),
        json!({ "data": { "a": 1, "b": 2, "c": 3, "d": 4, "e": 5 } })
    );
}

#[test]
fn introspection_meta_fields_resolve_anywhere() {
    let response = execute_sync(request(
        "type Query { a: String }",
        "{ __typename a }",
        json!({ "a": "x" }),
    ));
    assert_eq!(
        response_json(&response),
        json!({ "data": { "__typename": "Query", "a": "x" } })
    );
}

#[test]
fn unknown_operation_name_is_a_request_error() {
    let schema = test_schema("type Query { a: String }");
    let document = test_document(&schema, "query Q { a }");
    let response = execute_sync(
        Request::new(schema, document, json_root("Query", json!({ "a": "x" })))
            .operation_name("Other"),
    );
    let body = response_json(&response);
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("unknown operation"));
    assert_eq!(body.get("data"), None);
}

#[test]
fn leaf_coercion_rejects_mismatched_values() {
    let response = execute_sync(request(
        "type Query { count: Int }",
        "{ count }",
        json!({ "count": "not a number" }),
    ));
    let body = response_json(&response);
    assert_eq!(body["data"], json!({ "count": null }));
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("expected Int"));
}

#[test]
fn id_serializes_integers_as_strings() {
    let response = execute_sync(request(
        "type Query { id: ID }",
        "{ id }",
        json!({ "id": 42 }),
    ));
    assert_eq!(response_json(&response), json!({ "data": { "id": "42" } }));
}

#[test]
fn arguments_reach_resolvers() {
    struct Echo;
    impl Resolver for Echo {
        fn type_name(&self) -> &str {
            "Query"
        }
        fn resolve_field(
            &self,
            field_name: &str,
            arguments: &JsonMap,
        ) -> Result<ResolvedValue, ResolveError> {
            assert_eq!(field_name, "echo");
            Ok(ResolvedValue::Leaf(
                arguments.get("word").cloned().unwrap_or_default(),
            ))
        }
    }
    let schema = test_schema("type Query { echo(word: String): String }");
    let document = test_document(&schema, "{ echo(word: \"hi\") }");
    let response = execute_sync(Request::new(schema, document, Arc::new(Echo)));
    assert_eq!(response_json(&response), json!({ "data": { "echo": "hi" } }));
}
