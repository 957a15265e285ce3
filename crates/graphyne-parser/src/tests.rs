use crate::ast;
use crate::ast::Definition;
use crate::parse;
use crate::print_ast;
use crate::visitor;
use crate::visitor::AstNode;
use crate::visitor::NodeKind;
use crate::visitor::ParallelVisitor;
use crate::visitor::VisitAction;
use crate::visitor::VisitInfo;
use crate::visitor::Visitor;
use crate::visitor::VisitorKeyMap;
use crate::Parser;
use expect_test::expect;
use pretty_assertions::assert_eq;

fn operation(document: &ast::Document, index: usize) -> &crate::Node<ast::OperationDefinition> {
    match &document.definitions[index] {
        Definition::OperationDefinition(op) => op,
        other => panic!("expected an operation, got {other:?}"),
    }
}

#[test]
fn parses_the_operation_grammar() {
    let doc = parse(
        r#"
        query Q($v: Int = 3, $w: [String!]) @onQuery {
          a: b(c: [1, 2], d: {e: "f", g: null}) @skip(if: $v) {
            h
            ...Frag
            ... on Other @include(if: true) {
              i
            }
          }
        }

        fragment Frag on Other {
          j
        }
        "#,
        "query.graphql",
    )
    .unwrap();

    assert_eq!(doc.definitions.len(), 2);
    let op = operation(&doc, 0);
    assert_eq!(op.operation_type, ast::OperationType::Query);
    assert_eq!(op.name.as_ref().unwrap(), "Q");
    assert_eq!(op.variables.len(), 2);
    assert_eq!(op.variables[0].name, "v");
    assert_eq!(op.variables[0].ty.to_string(), "Int");
    assert_eq!(
        op.variables[0].default_value.as_deref(),
        Some(&ast::Value::Int(3))
    );
    assert_eq!(op.variables[1].ty.to_string(), "[String!]");
    assert!(op.directives.has("onQuery"));

    let field = match &op.selection_set[0] {
        ast::Selection::Field(field) => field,
        other => panic!("expected a field, got {other:?}"),
    };
    assert_eq!(field.alias.as_ref().unwrap(), "a");
    assert_eq!(field.name, "b");
    assert_eq!(field.response_key(), "a");
    assert_eq!(field.arguments.len(), 2);
    assert_eq!(field.selection_set.len(), 3);
}

#[test]
fn anonymous_shorthand_is_a_query() {
    let doc = parse("{ a b }", "query.graphql").unwrap();
    let op = operation(&doc, 0);
    assert_eq!(op.operation_type, ast::OperationType::Query);
    assert_eq!(op.name, None);
    assert_eq!(op.selection_set.len(), 2);
}

#[test]
fn parses_the_type_system_grammar() {
    let doc = parse(
        r#"
        "Root"
        schema @dir {
          query: MyQuery
          mutation: MyMutation
        }

        """
        A scalar
        """
        scalar Url @specifiedBy(url: "https://example.com")

        type MyQuery implements A & B @dir {
          "doc"
          field(arg: Int = 0, other: [Bool!]): String!
        }

        interface A {
          field(arg: Int): String!
        }

        union Or = MyQuery | Other

        enum Color {
          "warm"
          RED
          GREEN
        }

        input Point {
          x: Float = 0.5
          y: Float
        }

        directive @dir(reason: String = "none") repeatable on SCHEMA | OBJECT

        extend type MyQuery {
          extra: Int
        }
        "#,
        "schema.graphql",
    )
    .unwrap();

    assert_eq!(doc.definitions.len(), 9);
    match &doc.definitions[0] {
        Definition::SchemaDefinition(def) => {
            assert_eq!(def.description.as_deref(), Some("Root"));
            assert_eq!(def.root_operations.len(), 2);
        }
        other => panic!("expected a schema definition, got {other:?}"),
    }
    match &doc.definitions[1] {
        Definition::ScalarTypeDefinition(def) => {
            assert_eq!(def.description.as_deref(), Some("A scalar"));
        }
        other => panic!("expected a scalar definition, got {other:?}"),
    }
    match &doc.definitions[2] {
        Definition::ObjectTypeDefinition(def) => {
            assert_eq!(def.implements_interfaces.len(), 2);
            assert_eq!(def.fields[0].description.as_deref(), Some("doc"));
            assert_eq!(def.fields[0].arguments.len(), 2);
            assert_eq!(def.fields[0].ty.to_string(), "String!");
        }
        other => panic!("expected an object definition, got {other:?}"),
    }
    match &doc.definitions[7] {
        Definition::DirectiveDefinition(def) => {
            assert!(def.repeatable);
            assert_eq!(
                def.locations,
                vec![
                    ast::DirectiveLocation::Schema,
                    ast::DirectiveLocation::Object
                ]
            );
        }
        other => panic!("expected a directive definition, got {other:?}"),
    }
    assert!(matches!(
        &doc.definitions[8],
        Definition::ObjectTypeExtension(_)
    ));
}

#[test]
fn fragment_must_not_be_named_on() {
    let err = parse("fragment on on Type { a }", "query.graphql").unwrap_err();
    assert!(err.message().contains("cannot be named"), "{err}");
}

#[test]
fn enum_values_exclude_keywords() {
    let err = parse("enum E { RED true }", "schema.graphql").unwrap_err();
    assert!(err.message().contains("cannot be named"), "{err}");
}

#[test]
fn variables_are_rejected_in_const_context() {
    let err = parse("query Q($v: Int = $other) { a }", "query.graphql").unwrap_err();
    assert!(err.message().contains("constant value"), "{err}");

    let err = crate::parse_const_value("[1, $v]", "value.graphql").unwrap_err();
    assert!(err.message().contains("constant value"), "{err}");
    crate::parse_value("[1, $v]", "value.graphql").unwrap();
}

#[test]
fn description_on_extension_is_an_error() {
    let err = parse("\"doc\" extend type T { a: Int }", "schema.graphql").unwrap_err();
    assert!(err.message().contains("description"), "{err}");
}

#[test]
fn legacy_fragment_variables_are_opt_in() {
    let text = "fragment F($x: Int) on T { f }";
    assert!(parse(text, "query.graphql").is_err());
    let doc = Parser::new()
        .allow_legacy_fragment_variables()
        .parse(text, "query.graphql")
        .unwrap();
    match &doc.definitions[0] {
        Definition::FragmentDefinition(frag) => assert_eq!(frag.variables.len(), 1),
        other => panic!("expected a fragment definition, got {other:?}"),
    }
}

#[test]
fn recursion_limit_is_enforced() {
    let deep = format!("{}{}", "{ a ".repeat(30), "}".repeat(30));
    let err = Parser::new()
        .recursion_limit(10)
        .parse(deep, "query.graphql")
        .unwrap_err();
    assert!(err.message().contains("recursion limit"), "{err}");
}

#[test]
fn token_limit_is_enforced() {
    let err = Parser::new()
        .token_limit(3)
        .parse("{ a b c d }", "query.graphql")
        .unwrap_err();
    assert!(err.message().contains("token limit"), "{err}");
}

#[test]
fn parse_type_entry_point() {
    let ty = crate::parse_type("[Foo!]!", "type.graphql").unwrap();
    assert_eq!(ty.to_string(), "[Foo!]!");
    assert!(ty.is_non_null());
    assert!(ty.is_list());
    assert_eq!(ty.inner_named_type(), "Foo");
    assert!(crate::parse_type("Foo!extra", "type.graphql").is_err());
}

#[test]
fn syntax_errors_have_positions() {
    let err = parse("{\n  a(:\n}", "query.graphql").unwrap_err();
    let position = err.line_column().unwrap();
    assert_eq!((position.line, position.column), (2, 5));
    assert_eq!(
        err.to_string(),
        "query.graphql:2:5: expected a name, found \":\""
    );
}

#[test]
fn prints_with_two_space_indent() {
    let doc = parse(
        "query Q($v:Int=3){a @skip(if:true) b(c:[1,2],d:{e:\"f\"}){g}}",
        "query.graphql",
    )
    .unwrap();
    expect![[r#"
        query Q($v: Int = 3) {
          a @skip(if: true)
          b(c: [1, 2], d: {e: "f"}) {
            g
          }
        }
    "#]]
    .assert_eq(&print_ast(&doc));
}

#[test]
fn parse_print_parse_is_idempotent() {
    let inputs = [
        "{ a b { c d } }",
        "query Named($a: [Int!]! = [1], $b: String) @dir(x: 1.5) { f(g: $a) ...F ... on T { h } }",
        "mutation M { send(to: [\"a\", \"b\"], meta: {k: ENUM_VALUE, n: null}) }",
        "subscription S { events }",
        "fragment F on T @dir { x y(z: -3e-2) }",
        "schema { query: Q }",
        "type Q implements I { f(a: Int = 5): [String]! }",
        "interface I @dir { f(a: Int): [String]! }",
        "union U = A | B",
        "enum E { A B @dir }",
        "input In { a: Int = 3 b: Float }",
        "directive @dir(x: Int) repeatable on FIELD | OBJECT",
        "extend schema { mutation: M }",
        "extend type Q @dir",
        "\"doc\" scalar S @specifiedBy(url: \"https://example.com\")",
    ];
    for input in inputs {
        let parsed = parse(input, "test.graphql").unwrap();
        let printed = print_ast(&parsed);
        let reparsed = parse(&printed, "printed.graphql").unwrap();
        assert_eq!(parsed, reparsed, "printed:\n{printed}");
        // A second print is a fixed point
        assert_eq!(printed, print_ast(&reparsed));
    }
}

#[test]
fn equality_ignores_locations() {
    let spaced = parse("{\n\n    a        { b }\n}", "a.graphql").unwrap();
    let dense = parse("{ a { b } }", "b.graphql").unwrap();
    assert_eq!(spaced, dense);

    let no_location = Parser::new()
        .no_location()
        .parse("{ a { b } }", "c.graphql")
        .unwrap();
    assert_eq!(no_location, dense);
    assert_eq!(operation(&no_location, 0).location(), None);
    assert!(operation(&dense, 0).location().is_some());
}

/// Collects the names of field nodes in visit order.
#[derive(Default)]
struct FieldCollector {
    entered: Vec<String>,
    left: Vec<String>,
}

impl Visitor for FieldCollector {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Field(field) = node {
            self.entered.push(field.name.to_string());
        }
        VisitAction::Continue
    }

    fn leave(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Field(field) = node {
            self.left.push(field.name.to_string());
        }
        VisitAction::Continue
    }
}

#[test]
fn visits_depth_first_with_enter_and_leave() {
    let doc = parse("{ a { b { c } d } e }", "query.graphql").unwrap();
    let mut collector = FieldCollector::default();
    visitor::visit(&doc, &mut collector);
    assert_eq!(collector.entered, ["a", "b", "c", "d", "e"]);
    assert_eq!(collector.left, ["c", "b", "d", "a", "e"]);
}

struct RemoveField<'a>(&'a str);

impl Visitor for RemoveField<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        match node {
            AstNode::Field(field) if field.name == self.0 => VisitAction::Remove,
            _ => VisitAction::Continue,
        }
    }
}

#[test]
fn remove_edits_the_returned_document() {
    let doc = parse("{ a b c }", "query.graphql").unwrap();
    let edited = visitor::visit(&doc, &mut RemoveField("b"));
    assert_eq!(print_ast(&edited), "{\n  a\n  c\n}\n");
    // The input document is untouched
    assert_eq!(print_ast(&doc), "{\n  a\n  b\n  c\n}\n");
}

struct RenameOnEnter;

impl Visitor for RenameOnEnter {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Field(field) = node {
            if field.name == "old" {
                let mut renamed = field.clone();
                renamed.make_mut().name = crate::name!("new");
                return VisitAction::Replace(AstNode::Field(renamed));
            }
        }
        VisitAction::Continue
    }
}

#[test]
fn replace_on_enter_visits_the_replacement_children() {
    let doc = parse("{ old { inner } }", "query.graphql").unwrap();
    let mut collector = FieldCollector::default();
    let edited = visitor::visit(&doc, &mut RenameOnEnter);
    visitor::visit(&edited, &mut collector);
    assert_eq!(collector.entered, ["new", "inner"]);
}

#[derive(Default)]
struct SkipAndCollect {
    entered: Vec<String>,
    left: Vec<String>,
}

impl Visitor for SkipAndCollect {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Field(field) = node {
            self.entered.push(field.name.to_string());
            if field.name == "skipped" {
                return VisitAction::Skip;
            }
        }
        VisitAction::Continue
    }

    fn leave(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Field(field) = node {
            self.left.push(field.name.to_string());
        }
        VisitAction::Continue
    }
}

#[test]
fn skip_prunes_descent_and_its_own_leave() {
    let doc = parse("{ skipped { hidden } seen }", "query.graphql").unwrap();
    let mut skipper = SkipAndCollect::default();
    visitor::visit(&doc, &mut skipper);
    assert_eq!(skipper.entered, ["skipped", "seen"]);
    assert_eq!(skipper.left, ["seen"]);
}

struct BreakOnField<'a>(&'a str, usize);

impl Visitor for BreakOnField<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Field(field) = node {
            self.1 += 1;
            if field.name == self.0 {
                return VisitAction::Break;
            }
        }
        VisitAction::Continue
    }
}

#[test]
fn break_terminates_the_traversal() {
    let doc = parse("{ a b c d }", "query.graphql").unwrap();
    let mut visitor_impl = BreakOnField("b", 0);
    visitor::visit(&doc, &mut visitor_impl);
    assert_eq!(visitor_impl.1, 2);
}

#[test]
fn parallel_visitors_break_independently() {
    struct Count(std::rc::Rc<std::cell::Cell<usize>>);
    impl Visitor for Count {
        fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
            if matches!(node, AstNode::Field(_)) {
                self.0.set(self.0.get() + 1);
            }
            VisitAction::Continue
        }
    }

    let doc = parse("{ a b c }", "query.graphql").unwrap();
    let counter = std::rc::Rc::new(std::cell::Cell::new(0));
    let mut parallel = ParallelVisitor::new(vec![
        // Breaks on the first field, so it alone stops receiving events
        Box::new(BreakOnField("a", 0)),
        Box::new(Count(counter.clone())),
    ]);
    visitor::visit(&doc, &mut parallel);
    assert_eq!(counter.get(), 3);
}

#[test]
fn key_map_overrides_descent() {
    let doc = parse("{ a(x: 1) { b } }", "query.graphql").unwrap();
    struct Seen(Vec<&'static str>);
    impl Visitor for Seen {
        fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
            self.0.push(match node.kind() {
                NodeKind::Field => "field",
                NodeKind::Argument => "argument",
                NodeKind::Value => "value",
                _ => return VisitAction::Continue,
            });
            VisitAction::Continue
        }
    }

    let mut seen = Seen(Vec::new());
    visitor::visit(&doc, &mut seen);
    assert_eq!(seen.0, ["field", "argument", "value", "field"]);

    // Restricting Field descent to the selection set hides arguments
    let mut key_map = VisitorKeyMap::new();
    key_map.insert(NodeKind::Field, vec!["selection_set"]);
    let mut seen = Seen(Vec::new());
    visitor::visit_with_keys(&doc, &mut seen, &key_map);
    assert_eq!(seen.0, ["field", "field"]);
}

#[test]
fn visit_info_reports_paths_and_ancestors() {
    use crate::visitor::PathKey;

    let doc = parse("{ a { b } }", "query.graphql").unwrap();
    struct Paths(Vec<(String, usize)>);
    impl Visitor for Paths {
        fn enter(&mut self, node: &AstNode, info: &VisitInfo<'_>) -> VisitAction {
            if let AstNode::Field(field) = node {
                let depth_in_lists = info
                    .path
                    .iter()
                    .filter(|key| matches!(key, PathKey::Index(_)))
                    .count();
                self.0
                    .push((field.name.to_string(), info.ancestors.len()));
                assert!(depth_in_lists >= 1);
                assert!(info.parent().is_some());
            }
            VisitAction::Continue
        }
    }
    let mut paths = Paths(Vec::new());
    visitor::visit(&doc, &mut paths);
    // document > operation > a, document > operation > a > b
    assert_eq!(
        paths.0,
        vec![("a".to_owned(), 2), ("b".to_owned(), 3)]
    );
}
