//! Query validation: one traversal, all rules, full error lists.

use crate::test_schema;
use graphyne::validate;
use pretty_assertions::assert_eq;

const SDL: &str = "
    type Query {
        hero(episode: Int): Character
        search(text: String!): SearchResult
        version: String
    }
    type Mutation { rename(name: String!): Character }
    type Subscription { changes: Character extra: Int }
    interface Character { name: String }
    type Human implements Character { name: String height: Float }
    type Droid implements Character { name: String primaryFunction: String }
    union SearchResult = Human | Droid
    input Filter { text: String! limit: Int = 10 }
    enum Episode { HOPE EMPIRE }
";

fn errors(query: &str) -> Vec<String> {
    let schema = test_schema(SDL);
    let document = graphyne::parse(query, "query.graphql").unwrap();
    validate(&schema, &document)
        .into_iter()
        .map(|error| error.message)
        .collect()
}

fn assert_valid(query: &str) {
    assert_eq!(errors(query), Vec::<String>::new());
}

fn assert_error(query: &str, expected_fragment: &str) {
    let messages = errors(query);
    assert!(
        messages
            .iter()
            .any(|message| message.contains(expected_fragment)),
        "expected an error containing {expected_fragment:?}, got {messages:?}"
    );
}

#[test]
fn valid_documents_produce_no_errors() {
    assert_valid("{ version }");
    assert_valid(
        "query Hero($episode: Int) {
            hero(episode: $episode) {
                name
                ... on Human { height }
                ...DroidFields
            }
        }
        fragment DroidFields on Droid { primaryFunction }",
    );
    assert_valid("mutation { rename(name: \"R2\") { name } }");
    assert_valid("subscription { changes { name } }");
}

#[test]
fn validation_is_deterministic() {
    let query = "query A { bogus } query A { alsoBogus ...Missing }";
    let first = errors(query);
    let second = errors(query);
    assert_eq!(first, second);
    assert!(first.len() >= 3);
}

#[test]
fn executable_definitions_only() {
    assert_error(
        "{ version } type Sneaky { a: Int }",
        "definition is not executable",
    );
}

#[test]
fn operation_names_are_unique() {
    assert_error(
        "query A { version } query A { version }",
        "only one operation named \"A\"",
    );
}

#[test]
fn anonymous_operations_are_lone() {
    assert_error(
        "{ version } query B { version }",
        "anonymous operation must be the only operation",
    );
}

#[test]
fn subscriptions_select_a_single_root_field() {
    assert_error(
        "subscription { changes { name } extra }",
        "must select only one top level field",
    );
    assert_error(
        "subscription { __typename }",
        "must not select an introspection top level field",
    );
}

#[test]
fn fields_must_exist_on_their_type() {
    assert_error("{ bogus }", "cannot query field \"bogus\" on type \"Query\"");
    assert_error(
        "{ hero { name ... on Human { wings } } }",
        "cannot query field \"wings\" on type \"Human\"",
    );
}

#[test]
fn fragment_conditions_are_composite_known_types() {
    assert_error(
        "{ hero { ... on Episode { name } } }",
        "cannot condition on non composite type",
    );
    assert_error("{ hero { ... on Martian { name } } }", "unknown type \"Martian\"");
}

#[test]
fn fragments_are_defined_used_and_acyclic() {
    assert_error("{ hero { ...Missing } }", "unknown fragment \"Missing\"");
    assert_error(
        "{ version } fragment Orphan on Query { version }",
        "fragment \"Orphan\" is never used",
    );
    assert_error(
        "{ hero { ...A } }
         fragment A on Character { ...B }
         fragment B on Character { ...A }",
        "cannot spread fragment \"A\" within itself via B",
    );
    assert_error(
        "{ hero { ...Selfish } } fragment Selfish on Character { ...Selfish }",
        "cannot spread fragment \"Selfish\" within itself",
    );
}

#[test]
fn variables_are_declared_and_used() {
    assert_error(
        "query Q { hero(episode: $episode) { name } }",
        "variable \"$episode\" is not defined",
    );
    assert_error(
        "query Q($unused: Int) { version }",
        "variable \"$unused\" is never used",
    );
    assert_error(
        "query Q($episode: Int, $episode: Int) { hero(episode: $episode) { name } }",
        "only one variable named \"$episode\"",
    );
}

#[test]
fn variable_types_must_be_input_types() {
    assert_error(
        "query Q($c: Character) { hero(episode: 1) @skip(if: $c) { name } }",
        "cannot have the non-input type",
    );
}

#[test]
fn variables_must_fit_their_positions() {
    assert_error(
        "query Q($text: String) { search(text: $text) { ... on Human { name } } }",
        "cannot be used in a position expecting type \"String!\"",
    );
    // A default value relaxes the non-null position
    assert_valid(
        "query Q($text: String = \"ok\") { search(text: $text) { ... on Human { name } } }",
    );
}

#[test]
fn directives_are_known_and_placed_correctly() {
    assert_error("{ version @bogus }", "unknown directive \"@bogus\"");
    assert_error(
        "query Q @skip(if: true) { version }",
        "directive \"@skip\" is not allowed on QUERY",
    );
    assert_error(
        "{ version @skip(if: true) @skip(if: true) }",
        "non-repeatable directive \"@skip\"",
    );
}

#[test]
fn arguments_are_known_unique_and_complete() {
    assert_error(
        "{ hero(bogus: 1) { name } }",
        "unknown argument \"bogus\" on field \"Query.hero\"",
    );
    assert_error(
        "{ hero(episode: 1, episode: 2) { name } }",
        "only one argument named \"episode\"",
    );
    assert_error(
        "{ search { ... on Human { name } } }",
        "argument \"text\" of type \"String!\" is required",
    );
    assert_error(
        "{ version @skip }",
        "argument \"if\" of type \"Boolean!\" is required",
    );
}

#[test]
fn values_must_match_their_types() {
    assert_error("{ hero(episode: \"one\") { name } }", "expected a value of type \"Int\"");
    assert_error(
        "{ search(text: 3) { ... on Human { name } } }",
        "expected a value of type \"String!\"",
    );
}

#[test]
fn input_object_literals_are_checked() {
    let schema_with_input = "
        type Query { find(filter: Filter): String }
        input Filter { text: String! limit: Int = 10 }
    ";
    let schema = test_schema(schema_with_input);
    let check = |query: &str| {
        let document = graphyne::parse(query, "query.graphql").unwrap();
        validate(&schema, &document)
            .into_iter()
            .map(|error| error.message)
            .collect::<Vec<_>>()
    };
    let messages = check("{ find(filter: { text: \"x\", bogus: 1 }) }");
    assert!(
        messages
            .iter()
            .any(|message| message.contains("\"bogus\" is not defined")),
        "{messages:?}"
    );
    let messages = check("{ find(filter: { limit: 3 }) }");
    assert!(
        messages
            .iter()
            .any(|message| message.contains("\"Filter.text\" of required type")),
        "{messages:?}"
    );
    let messages = check("{ find(filter: { text: \"a\", text: \"b\" }) }");
    assert!(
        messages
            .iter()
            .any(|message| message.contains("only one input field named \"text\"")),
        "{messages:?}"
    );
}

#[test]
fn overlapping_selections_must_merge() {
    assert_error(
        "{ output: version output: hero(episode: 1) { name } }",
        "\"version\" and \"hero\" are different fields",
    );
    assert_error(
        "{ hero(episode: 1) { name } hero(episode: 2) { name } }",
        "differing arguments",
    );
    assert_valid("{ hero(episode: 1) { name } hero(episode: 1) { name } }");
    // Distinct concrete types may select different fields behind an
    // abstract parent, as long as the response shapes stay compatible
    assert_valid(
        "{ search(text: \"x\") {
            ... on Human { what: name }
            ... on Droid { what: primaryFunction }
        } }",
    );
    assert_error(
        "{ search(text: \"x\") {
            ... on Human { what: height }
            ... on Droid { what: primaryFunction }
        } }",
        "conflicting types",
    );
    // But their response shapes must stay compatible with shared fields
    assert_error(
        "{ hero(episode: 1) {
            ... on Human { what: name }
            ... on Droid { what: primaryFunction other: name }
        }
        hero(episode: 1) { ... on Human { other: height } } }",
        "conflicting types",
    );
}

#[test]
fn defer_and_stream_are_recognised_directives() {
    assert_valid("{ hero(episode: 1) { ... @defer { name } } }");
    assert_error("{ version @defer }", "directive \"@defer\" is not allowed on FIELD");
}
