//! Incremental delivery: `@defer` and `@stream` payload sequencing.

use crate::request;
use crate::test_document;
use crate::test_schema;
use futures::StreamExt;
use graphyne::execute;
use graphyne::ExecuteResult;
use graphyne::IncrementalResponse;
use graphyne::JsonMap;
use graphyne::Request;
use graphyne::ResolveError;
use graphyne::ResolvedValue;
use graphyne::Resolver;
use pretty_assertions::assert_eq;
use serde_json::json;
use serde_json::Value;
use std::sync::Arc;

async fn run_incremental(request: Request) -> (Value, Vec<Value>) {
    match execute(request).await {
        ExecuteResult::Incremental(IncrementalResponse {
            initial,
            subsequent,
        }) => {
            let initial = serde_json::to_value(&initial).unwrap();
            let payloads = subsequent
                .map(|payload| serde_json::to_value(&payload).unwrap())
                .collect()
                .await;
            (initial, payloads)
        }
        ExecuteResult::Complete(response) => {
            panic!(
                "expected an incremental response, got {}",
                serde_json::to_value(&response).unwrap()
            )
        }
    }
}

const HERO_SDL: &str = "
    type Query { hero: Hero }
    type Hero { id: ID name: String }
";

#[tokio::test]
async fn deferred_fragments_arrive_after_the_initial_payload() {
    let (initial, payloads) = run_incremental(request(
        HERO_SDL,
        "query Q { hero { id ...F @defer } } fragment F on Hero { name }",
        json!({ "hero": { "id": "1", "name": "Luke" } }),
    ))
    .await;
    assert_eq!(
        initial,
        json!({ "data": { "hero": { "id": "1" } }, "hasNext": true })
    );
    assert_eq!(
        payloads,
        vec![json!({
            "incremental": [{ "data": { "name": "Luke" }, "path": ["hero"] }],
            "hasNext": false,
        })]
    );
}

#[tokio::test]
async fn defer_if_false_merges_into_the_initial_payload() {
    let result = execute(request(
        HERO_SDL,
        "query Q { hero { id ...F @defer(if: false) } } fragment F on Hero { name }",
        json!({ "hero": { "id": "1", "name": "Luke" } }),
    ))
    .await;
    let response = result.into_response();
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "data": { "hero": { "id": "1", "name": "Luke" } } })
    );
}

#[tokio::test]
async fn defer_labels_are_echoed() {
    let (_, payloads) = run_incremental(request(
        HERO_SDL,
        "query Q { hero { id ... @defer(label: \"late\") { name } } }",
        json!({ "hero": { "id": "1", "name": "Luke" } }),
    ))
    .await;
    assert_eq!(
        payloads,
        vec![json!({
            "incremental": [{
                "data": { "name": "Luke" },
                "path": ["hero"],
                "label": "late",
            }],
            "hasNext": false,
        })]
    );
}

#[tokio::test]
async fn nested_defers_deliver_parents_before_children() {
    let sdl = "
        type Query { hero: Hero }
        type Hero { id: ID name: String friend: Hero }
    ";
    let (initial, payloads) = run_incremental(request(
        sdl,
        "query Q {
            hero {
                id
                ... @defer {
                    name
                    friend {
                        ... @defer { name }
                    }
                }
            }
        }",
        json!({ "hero": {
            "id": "1",
            "name": "Luke",
            "friend": { "name": "Han" },
        }}),
    ))
    .await;
    assert_eq!(
        initial,
        json!({ "data": { "hero": { "id": "1" } }, "hasNext": true })
    );
    // The outer fragment's payload always precedes the nested one
    let all: Vec<&Value> = payloads
        .iter()
        .flat_map(|payload| payload["incremental"].as_array().unwrap())
        .collect();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["path"], json!(["hero"]));
    assert_eq!(all[0]["data"]["name"], json!("Luke"));
    assert_eq!(all[1]["path"], json!(["hero", "friend"]));
    assert_eq!(all[1]["data"], json!({ "name": "Han" }));
    assert_eq!(payloads.last().unwrap()["hasNext"], json!(false));
}

#[tokio::test]
async fn streamed_lists_deliver_items_in_index_order() {
    let (initial, payloads) = run_incremental(request(
        "type Query { xs: [String] }",
        "{ xs @stream(initialCount: 1) }",
        json!({ "xs": ["apple", "banana", "coconut"] }),
    ))
    .await;
    assert_eq!(
        initial,
        json!({ "data": { "xs": ["apple"] }, "hasNext": true })
    );
    assert_eq!(
        payloads,
        vec![
            json!({
                "incremental": [{ "items": ["banana"], "path": ["xs", 1] }],
                "hasNext": true,
            }),
            json!({
                "incremental": [{ "items": ["coconut"], "path": ["xs", 2] }],
                "hasNext": false,
            }),
        ]
    );
}

#[tokio::test]
async fn stream_with_zero_initial_count_streams_everything() {
    let (initial, payloads) = run_incremental(request(
        "type Query { xs: [String] }",
        "{ xs @stream(label: \"rest\") }",
        json!({ "xs": ["a", "b"] }),
    ))
    .await;
    assert_eq!(initial, json!({ "data": { "xs": [] }, "hasNext": true }));
    assert_eq!(
        payloads,
        vec![
            json!({
                "incremental": [{ "items": ["a"], "path": ["xs", 0], "label": "rest" }],
                "hasNext": true,
            }),
            json!({
                "incremental": [{ "items": ["b"], "path": ["xs", 1], "label": "rest" }],
                "hasNext": false,
            }),
        ]
    );
}

#[tokio::test]
async fn stream_covering_the_whole_list_completes_in_the_initial_response() {
    let result = execute(request(
        "type Query { xs: [String] }",
        "{ xs @stream(initialCount: 5) }",
        json!({ "xs": ["a", "b"] }),
    ))
    .await;
    assert_eq!(
        serde_json::to_value(result.into_response()).unwrap(),
        json!({ "data": { "xs": ["a", "b"] } })
    );
}

/// A root whose deferred field fails, to scope errors to the right payload.
struct FailsLate;

impl Resolver for FailsLate {
    fn type_name(&self) -> &str {
        "Query"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        match field_name {
            "early" => Ok(ResolvedValue::leaf("fine")),
            "late" => Err(ResolveError::new("deferred failure")),
            other => Err(ResolveError::unknown_field(other, self)),
        }
    }
}

#[tokio::test]
async fn errors_in_deferred_work_stay_in_their_payload() {
    let schema = test_schema("type Query { early: String late: String }");
    let document = test_document(&schema, "{ early ... @defer { late } }");
    let (initial, payloads) = run_incremental(Request::new(
        schema,
        document,
        Arc::new(FailsLate),
    ))
    .await;
    // The initial payload is clean
    assert_eq!(
        initial,
        json!({ "data": { "early": "fine" }, "hasNext": true })
    );
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0]["incremental"][0];
    assert_eq!(payload["data"], json!({ "late": null }));
    assert_eq!(payload["errors"][0]["message"], json!("deferred failure"));
    assert_eq!(payload["errors"][0]["path"], json!(["late"]));
}

#[tokio::test]
async fn non_null_failure_inside_a_deferred_fragment_nulls_its_payload() {
    let schema = test_schema("type Query { early: String late: String! }");
    let document = test_document(&schema, "{ early ... @defer { late } }");
    let (_, payloads) = run_incremental(Request::new(
        schema,
        document,
        Arc::new(FailsLate),
    ))
    .await;
    let payload = &payloads[0]["incremental"][0];
    assert_eq!(payload["data"], json!(null));
    assert_eq!(payload["errors"][0]["message"], json!("deferred failure"));
}

#[tokio::test]
async fn deferred_work_starts_only_after_the_initial_payload() {
    // Dropping the subsequent stream cancels the deferred work entirely,
    // so a panicking resolver in a deferred fragment never runs.
    struct PanicsIfDeferred;
    impl Resolver for PanicsIfDeferred {
        fn type_name(&self) -> &str {
            "Query"
        }
        fn resolve_field(
            &self,
            field_name: &str,
            _arguments: &JsonMap,
        ) -> Result<ResolvedValue, ResolveError> {
            match field_name {
                "early" => Ok(ResolvedValue::leaf("fine")),
                "late" => panic!("deferred resolver ran before being polled"),
                other => Err(ResolveError::unknown_field(other, self)),
            }
        }
    }
    let schema = test_schema("type Query { early: String late: String }");
    let document = test_document(&schema, "{ early ... @defer { late } }");
    let result = execute(Request::new(schema, document, Arc::new(PanicsIfDeferred))).await;
    match result {
        ExecuteResult::Incremental(incremental) => {
            assert_eq!(
                serde_json::to_value(&incremental.initial).unwrap(),
                json!({ "data": { "early": "fine" }, "hasNext": true })
            );
            drop(incremental.subsequent);
        }
        ExecuteResult::Complete(_) => panic!("expected an incremental response"),
    }
}
