use crate::validation::ValidationContext;
use graphyne_parser::ast::Directives;
use graphyne_parser::ast::DirectiveLocation;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;
use std::collections::HashSet;

/// Directives are defined, and applied somewhere they are allowed.
pub(crate) struct KnownDirectives<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> KnownDirectives<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

/// The directive location corresponding to the node a directive is applied
/// to. `ancestors` disambiguates input values (argument definitions vs input
/// fields).
fn applied_location(owner: &AstNode, ancestors: &[AstNode]) -> Option<DirectiveLocation> {
    Some(match owner {
        AstNode::Operation(operation) => operation.operation_type.directive_location(),
        AstNode::Field(_) => DirectiveLocation::Field,
        AstNode::Fragment(_) => DirectiveLocation::FragmentDefinition,
        AstNode::FragmentSpread(_) => DirectiveLocation::FragmentSpread,
        AstNode::InlineFragment(_) => DirectiveLocation::InlineFragment,
        AstNode::VariableDefinition(_) => DirectiveLocation::VariableDefinition,
        AstNode::SchemaDefinition(_) | AstNode::SchemaExtension(_) => DirectiveLocation::Schema,
        AstNode::ScalarDefinition(_) | AstNode::ScalarExtension(_) => DirectiveLocation::Scalar,
        AstNode::ObjectDefinition(_) | AstNode::ObjectExtension(_) => DirectiveLocation::Object,
        AstNode::InterfaceDefinition(_) | AstNode::InterfaceExtension(_) => {
            DirectiveLocation::Interface
        }
        AstNode::UnionDefinition(_) | AstNode::UnionExtension(_) => DirectiveLocation::Union,
        AstNode::EnumDefinition(_) | AstNode::EnumExtension(_) => DirectiveLocation::Enum,
        AstNode::EnumValueDefinition(_) => DirectiveLocation::EnumValue,
        AstNode::InputObjectDefinition(_) | AstNode::InputObjectExtension(_) => {
            DirectiveLocation::InputObject
        }
        AstNode::FieldDefinition(_) => DirectiveLocation::FieldDefinition,
        AstNode::InputValueDefinition(_) => {
            match ancestors.last() {
                Some(AstNode::InputObjectDefinition(_) | AstNode::InputObjectExtension(_)) => {
                    DirectiveLocation::InputFieldDefinition
                }
                _ => DirectiveLocation::ArgumentDefinition,
            }
        }
        _ => return None,
    })
}

impl Visitor for KnownDirectives<'_> {
    fn enter(&mut self, node: &AstNode, info: &VisitInfo<'_>) -> VisitAction {
        let AstNode::Directive(directive) = node else {
            return VisitAction::Continue;
        };
        let Some(definition) = self
            .ctx
            .schema
            .directive_definitions
            .get(directive.name.as_str())
        else {
            self.ctx.report(
                format!("unknown directive \"@{}\"", directive.name),
                directive.location(),
            );
            return VisitAction::Continue;
        };
        let Some(owner) = info.parent() else {
            return VisitAction::Continue;
        };
        // The owner's own ancestors exclude the owner itself
        let owner_ancestors = &info.ancestors[..info.ancestors.len() - 1];
        if let Some(location) = applied_location(owner, owner_ancestors) {
            if !definition.locations.contains(&location) {
                self.ctx.report(
                    format!(
                        "directive \"@{}\" is not allowed on {}",
                        directive.name,
                        location.name(),
                    ),
                    directive.location(),
                );
            }
        }
        VisitAction::Continue
    }
}

/// Non-repeatable directives appear at most once per location.
pub(crate) struct UniqueDirectivesPerLocation<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> UniqueDirectivesPerLocation<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    fn check(&self, directives: &Directives) {
        let mut seen = HashSet::new();
        for directive in directives {
            let repeatable = self
                .ctx
                .schema
                .directive_definitions
                .get(directive.name.as_str())
                .is_some_and(|def| def.repeatable);
            if repeatable {
                continue;
            }
            if !seen.insert(directive.name.clone()) {
                self.ctx.report(
                    format!(
                        "the non-repeatable directive \"@{}\" is used \
                         more than once at this location",
                        directive.name
                    ),
                    directive.location(),
                );
            }
        }
    }
}

fn node_directives(node: &AstNode) -> Option<&Directives> {
    Some(match node {
        AstNode::Operation(def) => &def.directives,
        AstNode::Fragment(def) => &def.directives,
        AstNode::Field(def) => &def.directives,
        AstNode::FragmentSpread(def) => &def.directives,
        AstNode::InlineFragment(def) => &def.directives,
        AstNode::VariableDefinition(def) => &def.directives,
        AstNode::SchemaDefinition(def) => &def.directives,
        AstNode::ScalarDefinition(def) => &def.directives,
        AstNode::ObjectDefinition(def) => &def.directives,
        AstNode::InterfaceDefinition(def) => &def.directives,
        AstNode::UnionDefinition(def) => &def.directives,
        AstNode::EnumDefinition(def) => &def.directives,
        AstNode::EnumValueDefinition(def) => &def.directives,
        AstNode::InputObjectDefinition(def) => &def.directives,
        AstNode::FieldDefinition(def) => &def.directives,
        AstNode::InputValueDefinition(def) => &def.directives,
        _ => return None,
    })
}

impl Visitor for UniqueDirectivesPerLocation<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let Some(directives) = node_directives(node) {
            self.check(directives);
        }
        VisitAction::Continue
    }
}
