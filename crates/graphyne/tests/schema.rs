//! Schema building from SDL, structural schema validation, and SDL output.

use expect_test::expect;
use graphyne::build_schema;
use graphyne::print_schema;
use graphyne::validate_schema;
use graphyne::Schema;
use graphyne::SchemaError;
use pretty_assertions::assert_eq;

fn build(sdl: &str) -> Schema {
    build_schema(sdl, "schema.graphql").expect("schema builds")
}

fn validation_messages(sdl: &str) -> Vec<String> {
    validate_schema(&build(sdl))
        .into_iter()
        .map(|error| error.message)
        .collect()
}

fn assert_invalid(sdl: &str, expected_fragment: &str) {
    let messages = validation_messages(sdl);
    assert!(
        messages
            .iter()
            .any(|message| message.contains(expected_fragment)),
        "expected an error containing {expected_fragment:?}, got {messages:?}"
    );
}

#[test]
fn conventional_root_types_are_picked_up() {
    let schema = build("type Query { a: Int } type Mutation { b: Int }");
    assert_eq!(schema.query_type.as_deref(), Some("Query"));
    assert_eq!(schema.mutation_type.as_deref(), Some("Mutation"));
    assert_eq!(schema.subscription_type, None);
}

#[test]
fn explicit_schema_definitions_name_their_roots() {
    let schema = build(
        "schema { query: TheQuery }
         type TheQuery { a: Int }
         type Query { unrelated: Int }",
    );
    assert_eq!(schema.query_type.as_deref(), Some("TheQuery"));
}

#[test]
fn built_ins_are_always_available() {
    let schema = build("type Query { a: Int }");
    for name in ["Int", "Float", "String", "Boolean", "ID", "__Schema", "__Type"] {
        assert!(schema.types.contains_key(name), "missing {name}");
    }
    for name in ["skip", "include", "deprecated", "specifiedBy", "defer", "stream", "oneOf"] {
        assert!(
            schema.directive_definitions.contains_key(name),
            "missing @{name}"
        );
    }
}

#[test]
fn extensions_fold_into_their_definitions() {
    let schema = build(
        "type Query { a: Int }
         interface Named { name: String }
         extend type Query implements Named { name: String b: Int }",
    );
    let query = schema.get_object("Query").unwrap();
    assert!(query.fields.contains_key("b"));
    assert!(query.fields.contains_key("name"));
    assert!(query.implements_interfaces.contains("Named"));
    assert!(validate_schema(&schema).is_empty());
}

#[test]
fn duplicate_types_are_build_errors() {
    let result = build_schema("type Query { a: Int } type Query { b: Int }", "schema.graphql");
    match result {
        Err(SchemaError::Build(errors)) => {
            assert!(errors
                .iter()
                .any(|error| error.to_string().contains("`Query` is defined multiple times")));
        }
        other => panic!("expected build errors, got {other:?}"),
    }
}

#[test]
fn orphan_extensions_are_build_errors() {
    let result = build_schema("type Query { a: Int } extend type Ghost { b: Int }", "schema.graphql");
    match result {
        Err(SchemaError::Build(errors)) => {
            assert!(errors
                .iter()
                .any(|error| error.to_string().contains("`Ghost` cannot be extended")));
        }
        other => panic!("expected build errors, got {other:?}"),
    }
}

#[test]
fn a_query_root_is_required() {
    assert_invalid("type Lonely { a: Int }", "must define a query root type");
}

#[test]
fn field_types_must_be_defined_output_types() {
    assert_invalid("type Query { a: Ghost }", "has undefined type Ghost");
    assert_invalid(
        "type Query { a(arg: Query): Int }",
        "must have an input type",
    );
    assert_invalid(
        "type Query { a: In } input In { x: Int }",
        "must have an output type",
    );
}

#[test]
fn interface_implementations_are_checked() {
    assert_invalid(
        "type Query implements Named { a: Int }
         interface Named { name: String }",
        "interface field Named.name is missing on Query",
    );
    assert_invalid(
        "type Query implements Named { name: Int }
         interface Named { name: String }",
        "not a subtype of the interface field type",
    );
    // Covariance is fine: String! implements String
    assert_eq!(
        validation_messages(
            "type Query implements Named { name: String! }
             interface Named { name: String }",
        ),
        Vec::<String>::new()
    );
    assert_invalid(
        "interface Node { id: ID }
         interface Named implements Node { id: ID name: String }
         type Query implements Named { id: ID name: String }",
        "must implement Node",
    );
}

#[test]
fn union_members_must_be_objects() {
    assert_invalid(
        "type Query { u: Broken }
         union Broken = Query | Int",
        "cannot include Int",
    );
}

#[test]
fn reserved_names_are_rejected_at_user_sites() {
    assert_invalid("type Query { __mine: Int }", "reserved");
    assert_invalid("type Query { a: Int } type __Mine { a: Int }", "reserved");
}

#[test]
fn print_schema_round_trips_through_parsing() {
    let sdl = "
        \"The root\"
        type Query implements Named {
            name: String
            hero(episode: Episode = EMPIRE): Character
        }
        interface Named { name: String }
        interface Character { name: String }
        enum Episode { HOPE EMPIRE @deprecated(reason: \"cut\") }
        union Everything = Query
        input Filter @oneOf { text: String number: Float }
        scalar Odd @specifiedBy(url: \"https://example.com\")
        directive @mine(arg: Int = 3) repeatable on FIELD
    ";
    let first = build(sdl);
    let printed = print_schema(&first);
    let second = build(&printed);
    assert_eq!(first, second, "printed:\n{printed}");
}

#[test]
fn print_schema_output_shape() {
    let schema = build(
        "type Query { hero(episode: Int = 1): Hero }
         type Hero { name: String friends: [Hero!] }",
    );
    expect![[r#"
        type Query {
          hero(episode: Int = 1): Hero
        }

        type Hero {
          name: String
          friends: [Hero!]
        }
    "#]]
    .assert_eq(&print_schema(&schema));
}

#[test]
fn schemas_are_shareable_across_threads() {
    let schema = std::sync::Arc::new(build("type Query { a: Int }"));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let schema = schema.clone();
            std::thread::spawn(move || schema.get_object("Query").is_some())
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
