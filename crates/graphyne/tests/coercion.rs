//! Variable and argument coercion.

use crate::json_root;
use crate::request;
use crate::response_json;
use crate::test_document;
use crate::test_schema;
use graphyne::execute_sync;
use graphyne::execution::coerce_variable_values;
use graphyne::JsonMap;
use graphyne::Request;
use pretty_assertions::assert_eq;
use serde_json::json;

fn variables(value: serde_json::Value) -> JsonMap {
    value.as_object().unwrap().clone()
}

/// Coerce against the one operation of `query`, returning the error messages
/// on failure.
fn coerce(
    sdl: &str,
    query: &str,
    raw: serde_json::Value,
    max_errors: Option<usize>,
) -> Result<serde_json::Value, Vec<String>> {
    let schema = test_schema(sdl);
    let document = test_document(&schema, query);
    let operation = document.get_operation(None).unwrap();
    match coerce_variable_values(
        &schema,
        operation,
        &variables(raw),
        &document.sources,
        max_errors,
    ) {
        Ok(values) => Ok(serde_json::Value::Object(values.into_inner())),
        Err(errors) => Err(errors.into_iter().map(|error| error.message).collect()),
    }
}

const INPUT_SDL: &str = "
    type Query { ok(i: Int): String }
    input Point { x: Float y: Float = 0.5 label: String }
    input Nested { point: Point! tags: [String!] }
";

#[test]
fn absent_nullable_variables_stay_absent() {
    let coerced = coerce(
        INPUT_SDL,
        "query Q($i: Int) { ok(i: $i) }",
        json!({}),
        None,
    )
    .unwrap();
    assert_eq!(coerced, json!({}));
}

#[test]
fn defaults_fill_absent_variables() {
    let coerced = coerce(
        INPUT_SDL,
        "query Q($i: Int = 7) { ok(i: $i) }",
        json!({}),
        None,
    )
    .unwrap();
    assert_eq!(coerced, json!({ "i": 7 }));
}

#[test]
fn missing_non_null_variables_error() {
    let errors = coerce(
        INPUT_SDL,
        "query Q($i: Int!) { ok(i: $i) }",
        json!({}),
        None,
    )
    .unwrap_err();
    assert_eq!(errors, ["missing value for non-null variable $i"]);
}

#[test]
fn input_object_errors_carry_paths() {
    let sdl = "
        type Query { ok(n: Nested): String }
        input Point { x: Float y: Float = 0.5 label: String }
        input Nested { point: Point! tags: [String!] }
    ";
    let errors = coerce(
        sdl,
        "query Q($n: Nested) { ok(n: $n) }",
        json!({ "n": { "point": { "x": "not a float" }, "tags": ["fine", 3] } }),
        None,
    )
    .unwrap_err();
    assert!(
        errors
            .iter()
            .any(|message| message.contains("$n.point.x")),
        "{errors:?}"
    );
    assert!(
        errors.iter().any(|message| message.contains("$n.tags[1]")),
        "{errors:?}"
    );
}

#[test]
fn unknown_input_fields_are_rejected() {
    let sdl = "
        type Query { ok(p: Point): String }
        input Point { x: Float }
    ";
    let errors = coerce(
        sdl,
        "query Q($p: Point) { ok(p: $p) }",
        json!({ "p": { "x": 1.0, "bogus": true } }),
        None,
    )
    .unwrap_err();
    assert!(
        errors
            .iter()
            .any(|message| message.contains("key bogus") && message.contains("Point")),
        "{errors:?}"
    );
}

#[test]
fn input_object_field_defaults_apply() {
    let sdl = "
        type Query { ok(p: Point): String }
        input Point { x: Float y: Float = 0.5 }
    ";
    let coerced = coerce(
        sdl,
        "query Q($p: Point) { ok(p: $p) }",
        json!({ "p": { "x": 1 } }),
        None,
    )
    .unwrap();
    assert_eq!(coerced, json!({ "p": { "x": 1, "y": 0.5 } }));
}

#[test]
fn single_values_coerce_to_singleton_lists() {
    let sdl = "type Query { ok(xs: [Int]): String }";
    let coerced = coerce(
        sdl,
        "query Q($xs: [Int]) { ok(xs: $xs) }",
        json!({ "xs": 4 }),
        None,
    )
    .unwrap();
    assert_eq!(coerced, json!({ "xs": [4] }));
}

#[test]
fn int_range_and_id_coercion() {
    let sdl = "type Query { ok(i: Int, id: ID): String }";
    let errors = coerce(
        sdl,
        "query Q($i: Int) { ok(i: $i) }",
        json!({ "i": 4_000_000_000_i64 }),
        None,
    )
    .unwrap_err();
    assert!(
        errors
            .iter()
            .any(|message| message.contains("cannot be coerced to type Int")),
        "{errors:?}"
    );

    let coerced = coerce(
        sdl,
        "query Q($id: ID) { ok(id: $id) }",
        json!({ "id": 42 }),
        None,
    )
    .unwrap();
    assert_eq!(coerced, json!({ "id": "42" }));
}

#[test]
fn enums_match_by_name() {
    let sdl = "
        type Query { ok(c: Color): String }
        enum Color { RED GREEN }
    ";
    let coerced = coerce(
        sdl,
        "query Q($c: Color) { ok(c: $c) }",
        json!({ "c": "RED" }),
        None,
    )
    .unwrap();
    assert_eq!(coerced, json!({ "c": "RED" }));

    let errors = coerce(
        sdl,
        "query Q($c: Color) { ok(c: $c) }",
        json!({ "c": "BLUE" }),
        None,
    )
    .unwrap_err();
    assert!(
        errors
            .iter()
            .any(|message| message.contains("enum Color")),
        "{errors:?}"
    );
}

#[test]
fn one_of_input_objects_require_exactly_one_field() {
    let sdl = "
        type Query { ok(w: Which): String }
        input Which @oneOf { a: Int b: String }
    ";
    let good = coerce(
        sdl,
        "query Q($w: Which) { ok(w: $w) }",
        json!({ "w": { "a": 1 } }),
        None,
    );
    assert!(good.is_ok());

    for bad in [json!({ "w": {} }), json!({ "w": { "a": 1, "b": "x" } })] {
        let errors = coerce(sdl, "query Q($w: Which) { ok(w: $w) }", bad, None).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|message| message.contains("exactly one non-null field")),
            "{errors:?}"
        );
    }
}

#[test]
fn max_errors_aborts_coercion() {
    let sdl = "type Query { ok(a: Int, b: Int, c: Int): String }";
    let errors = coerce(
        sdl,
        "query Q($a: Int, $b: Int, $c: Int) { ok(a: $a, b: $b, c: $c) }",
        json!({ "a": "x", "b": "y", "c": "z" }),
        Some(1),
    )
    .unwrap_err();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors[1].contains("too many"), "{errors:?}");
}

#[test]
fn variable_coercion_failure_skips_execution() {
    let response = execute_sync(
        Request::new(
            test_schema("type Query { a(i: Int): String }"),
            test_document(
                &test_schema("type Query { a(i: Int): String }"),
                "query Q($i: Int) { a(i: $i) }",
            ),
            json_root("Query", json!({ "a": "unused" })),
        )
        .variables(variables(json!({ "i": "wrong" }))),
    );
    let body = response_json(&response);
    assert_eq!(body.get("data"), None);
    assert!(!body["errors"].as_array().unwrap().is_empty());
}

#[test]
fn absent_variable_arguments_fall_back_to_defaults() {
    let response = execute_sync(request(
        "type Query { a(i: Int = 3): Int }",
        "query Q($i: Int) { a(i: $i) }",
        json!({}),
    ));
    // The resolver sees the default; JSON root has no `a`, so data is null,
    // which is fine: we only check no coercion error occurred
    assert_eq!(response_json(&response)["errors"], json!(null));
}

#[test]
fn explicit_null_satisfies_nullable_arguments() {
    let response = execute_sync(request(
        "type Query { a(i: Int): String }",
        "{ a(i: null) }",
        json!({ "a": "x" }),
    ));
    assert_eq!(response_json(&response), json!({ "data": { "a": "x" } }));
}

#[test]
fn literal_arguments_coerce_against_declared_types() {
    let sdl = "
        type Query { ok(p: Point): String }
        input Point { x: Float y: Float = 0.5 }
    ";
    let response = execute_sync(request(sdl, "{ ok(p: {x: 1.25}) }", json!({ "ok": "yes" })));
    assert_eq!(response_json(&response), json!({ "data": { "ok": "yes" } }));
}
