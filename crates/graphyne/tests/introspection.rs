//! Introspection execution, the canonical query, and client schema building.

use crate::json_root;
use crate::request;
use crate::response_json;
use crate::test_document;
use crate::test_schema;
use graphyne::build_client_schema;
use graphyne::execute_sync;
use graphyne::get_introspection_query;
use graphyne::introspection_from_schema;
use graphyne::print_schema;
use graphyne::IntrospectionQueryOptions;
use graphyne::Request;
use pretty_assertions::assert_eq;
use serde_json::json;

const SDL: &str = "
    \"The root type\"
    type Query {
        hero(episode: Episode = HOPE): Character
        old: String @deprecated(reason: \"use hero\")
    }
    interface Character { name: String }
    type Human implements Character { name: String }
    enum Episode { HOPE EMPIRE }
    input Filter { text: String! }
    scalar Odd @specifiedBy(url: \"https://example.com/odd\")
";

#[test]
fn typename_schema_and_type_meta_fields() {
    let response = execute_sync(request(
        SDL,
        "{
            __typename
            __schema { queryType { name } }
            __type(name: \"Human\") {
                name
                kind
                interfaces { name }
            }
            missing: __type(name: \"Nope\") { name }
        }",
        json!({}),
    ));
    assert_eq!(
        response_json(&response),
        json!({ "data": {
            "__typename": "Query",
            "__schema": { "queryType": { "name": "Query" } },
            "__type": {
                "name": "Human",
                "kind": "OBJECT",
                "interfaces": [{ "name": "Character" }],
            },
            "missing": null,
        }})
    );
}

#[test]
fn deprecated_fields_are_filtered_by_default() {
    let query = "{
        __type(name: \"Query\") {
            visible: fields { name }
            all: fields(includeDeprecated: true) { name isDeprecated deprecationReason }
        }
    }";
    let response = execute_sync(request(SDL, query, json!({})));
    let body = response_json(&response);
    let names = |value: &serde_json::Value| -> Vec<String> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|field| field["name"].as_str().unwrap().to_owned())
            .collect()
    };
    assert_eq!(names(&body["data"]["__type"]["visible"]), ["hero"]);
    assert_eq!(names(&body["data"]["__type"]["all"]), ["hero", "old"]);
    assert_eq!(
        body["data"]["__type"]["all"][1]["deprecationReason"],
        json!("use hero")
    );
}

#[test]
fn type_wrappers_unwrap_through_of_type() {
    let response = execute_sync(request(
        "type Query { xs: [Int!]! }",
        "{
            __type(name: \"Query\") {
                fields {
                    type { kind ofType { kind ofType { kind name } } }
                }
            }
        }",
        json!({}),
    ));
    assert_eq!(
        response_json(&response)["data"]["__type"]["fields"][0]["type"],
        json!({
            "kind": "NON_NULL",
            "ofType": { "kind": "LIST", "ofType": { "kind": "NON_NULL", "name": null } },
        })
    );
}

#[test]
fn introspection_from_schema_covers_the_whole_schema() {
    let schema = test_schema(SDL);
    let data = introspection_from_schema(&schema, IntrospectionQueryOptions::default())
        .expect("introspection executes cleanly");
    let schema_object = &data["__schema"];
    assert_eq!(schema_object["queryType"]["name"], json!("Query"));
    let type_names: Vec<&str> = schema_object["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|ty| ty["name"].as_str().unwrap())
        .collect();
    for expected in ["Query", "Character", "Human", "Episode", "Filter", "Odd", "__Schema", "Int"] {
        assert!(type_names.contains(&expected), "missing {expected}");
    }
    let directive_names: Vec<&str> = schema_object["directives"]
        .as_array()
        .unwrap()
        .iter()
        .map(|directive| directive["name"].as_str().unwrap())
        .collect();
    assert!(directive_names.contains(&"deprecated"));
    assert!(directive_names.contains(&"defer"));
}

#[test]
fn client_schemas_rebuild_from_introspection() {
    let schema = test_schema(SDL);
    let options = IntrospectionQueryOptions {
        specified_by_url: true,
        directive_is_repeatable: true,
        input_value_deprecation: true,
        schema_description: true,
        ..Default::default()
    };
    let data = introspection_from_schema(&schema, options).expect("introspection executes");
    let client = build_client_schema(&serde_json::Value::Object(data))
        .expect("the introspection response is well formed");
    // The client schema serializes identically to the original
    assert_eq!(print_schema(&client), print_schema(&schema));
}

#[test]
fn the_introspection_query_is_valid_against_any_schema() {
    let schema = test_schema("type Query { a: Int }");
    for options in [
        IntrospectionQueryOptions::default(),
        IntrospectionQueryOptions {
            descriptions: false,
            specified_by_url: true,
            directive_is_repeatable: true,
            schema_description: true,
            input_value_deprecation: true,
        },
    ] {
        let query = get_introspection_query(options);
        // parse_and_validate panics the test if the query is invalid
        let document = test_document(&schema, &query);
        let response = execute_sync(
            Request::new(schema.clone(), document, json_root("Query", json!({})))
                .operation_name("IntrospectionQuery"),
        );
        assert!(response.errors.is_empty(), "{:?}", response.errors);
    }
}
