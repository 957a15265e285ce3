//! All integration tests, compiled as one binary.

mod coercion;
mod executor;
mod incremental;
mod introspection;
mod schema;
mod subscriptions;
mod validation;

use graphyne::ExecutableDocument;
use graphyne::JsonResolver;
use graphyne::Request;
use graphyne::Resolver;
use graphyne::Schema;
use graphyne::Valid;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn test_schema(sdl: &str) -> Arc<Valid<Schema>> {
    Arc::new(Schema::parse_and_validate(sdl, "schema.graphql").expect("test schema is valid"))
}

pub(crate) fn test_document(
    schema: &Arc<Valid<Schema>>,
    source_text: &str,
) -> Arc<Valid<ExecutableDocument>> {
    Arc::new(
        ExecutableDocument::parse_and_validate(schema, source_text, "query.graphql")
            .expect("test document is valid"),
    )
}

/// A root over plain JSON data, using `__typename` keys for abstract types.
pub(crate) fn json_root(type_name: &str, data: serde_json::Value) -> Arc<dyn Resolver> {
    let fields = data
        .as_object()
        .expect("test root data is a JSON object")
        .clone();
    Arc::new(JsonResolver::new(type_name, fields))
}

pub(crate) fn request(sdl: &str, query: &str, data: serde_json::Value) -> Request {
    let schema = test_schema(sdl);
    let document = test_document(&schema, query);
    Request::new(schema, document, json_root("Query", data))
}

/// The response as a JSON value, for structural comparisons.
pub(crate) fn response_json(response: &graphyne::Response) -> serde_json::Value {
    serde_json::to_value(response).expect("responses serialize")
}

#[test]
fn readme_style_smoke_test() {
    let response = graphyne::execute_sync(request(
        "type Query { hello: String }",
        "{ hello }",
        json!({ "hello": "world" }),
    ));
    assert_eq!(
        response_json(&response),
        json!({ "data": { "hello": "world" } })
    );
}
