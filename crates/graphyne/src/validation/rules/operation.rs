use crate::validation::ValidationContext;
use graphyne_parser::ast;
use graphyne_parser::ast::Selection;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;
use graphyne_parser::Name;
use graphyne_parser::Node;
use graphyne_parser::SourceSpan;
use std::collections::HashSet;

/// Operation names are unique within a document.
pub(crate) struct UniqueOperationNames<'a> {
    ctx: &'a ValidationContext<'a>,
    known: HashSet<Name>,
}

impl<'a> UniqueOperationNames<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self {
            ctx,
            known: HashSet::new(),
        }
    }
}

impl Visitor for UniqueOperationNames<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Operation(operation) = node {
            if let Some(name) = &operation.name {
                if !self.known.insert(name.clone()) {
                    self.ctx.report(
                        format!("there can be only one operation named \"{name}\""),
                        name.location().or(operation.location()),
                    );
                }
            }
            return VisitAction::Skip;
        }
        VisitAction::Continue
    }
}

/// A document with an anonymous operation contains no other operation.
pub(crate) struct LoneAnonymousOperation<'a> {
    ctx: &'a ValidationContext<'a>,
    operation_count: usize,
}

impl<'a> LoneAnonymousOperation<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self {
            ctx,
            operation_count: ctx.document.operations().count(),
        }
    }
}

impl Visitor for LoneAnonymousOperation<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Operation(operation) = node {
            if operation.name.is_none() && self.operation_count > 1 {
                self.ctx.report(
                    "an anonymous operation must be the only operation in the document",
                    operation.location(),
                );
            }
            return VisitAction::Skip;
        }
        VisitAction::Continue
    }
}

/// A subscription operation selects exactly one root field,
/// and not an introspection one.
pub(crate) struct SingleFieldSubscriptions<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> SingleFieldSubscriptions<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    /// Response keys selected at the top level, with fragments flattened.
    fn root_fields(
        &self,
        selections: &[Selection],
        visited: &mut HashSet<Name>,
        out: &mut Vec<(Name, Name, Option<SourceSpan>)>,
    ) {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    let key = field.response_key().clone();
                    if !out.iter().any(|(existing, _, _)| *existing == key) {
                        out.push((key, field.name.clone(), field.location()));
                    }
                }
                Selection::InlineFragment(inline) => {
                    self.root_fields(&inline.selection_set, visited, out)
                }
                Selection::FragmentSpread(spread) => {
                    if !visited.insert(spread.fragment_name.clone()) {
                        continue;
                    }
                    if let Some(fragment) = self.ctx.fragments.get(spread.fragment_name.as_str())
                    {
                        self.root_fields(&fragment.selection_set, visited, out);
                    }
                }
            }
        }
    }
}

impl Visitor for SingleFieldSubscriptions<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        let AstNode::Operation(operation) = node else {
            return VisitAction::Continue;
        };
        if !operation.is_subscription() {
            return VisitAction::Skip;
        }
        let describe = |operation: &Node<ast::OperationDefinition>| match &operation.name {
            Some(name) => format!("subscription \"{name}\""),
            None => "an anonymous subscription".to_owned(),
        };
        let mut fields = Vec::new();
        self.root_fields(&operation.selection_set, &mut HashSet::new(), &mut fields);
        for (_, _, location) in fields.iter().skip(1) {
            self.ctx.report(
                format!("{} must select only one top level field", describe(operation)),
                *location,
            );
        }
        for (_, name, location) in &fields {
            if name.starts_with("__") {
                self.ctx.report(
                    format!(
                        "{} must not select an introspection top level field",
                        describe(operation)
                    ),
                    *location,
                );
            }
        }
        VisitAction::Skip
    }
}
