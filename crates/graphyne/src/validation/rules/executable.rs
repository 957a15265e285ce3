use crate::validation::ValidationContext;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;

/// An executable document must only contain operations and fragments.
pub(crate) struct ExecutableDefinitions<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> ExecutableDefinitions<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for ExecutableDefinitions<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        let what = match node {
            AstNode::Document(_)
            | AstNode::Operation(_)
            | AstNode::Fragment(_)
            | AstNode::Field(_)
            | AstNode::FragmentSpread(_)
            | AstNode::InlineFragment(_)
            | AstNode::VariableDefinition(_)
            | AstNode::Argument(_)
            | AstNode::Directive(_)
            | AstNode::Value(_)
            | AstNode::Type(_) => return VisitAction::Continue,
            AstNode::SchemaDefinition(_) | AstNode::SchemaExtension(_) => "schema".to_owned(),
            AstNode::ScalarDefinition(def) => format!("\"{}\"", def.name),
            AstNode::ObjectDefinition(def) => format!("\"{}\"", def.name),
            AstNode::InterfaceDefinition(def) => format!("\"{}\"", def.name),
            AstNode::UnionDefinition(def) => format!("\"{}\"", def.name),
            AstNode::EnumDefinition(def) => format!("\"{}\"", def.name),
            AstNode::InputObjectDefinition(def) => format!("\"{}\"", def.name),
            AstNode::DirectiveDefinition(def) => format!("\"@{}\"", def.name),
            AstNode::ScalarExtension(def) => format!("\"{}\"", def.name),
            AstNode::ObjectExtension(def) => format!("\"{}\"", def.name),
            AstNode::InterfaceExtension(def) => format!("\"{}\"", def.name),
            AstNode::UnionExtension(def) => format!("\"{}\"", def.name),
            AstNode::EnumExtension(def) => format!("\"{}\"", def.name),
            AstNode::InputObjectExtension(def) => format!("\"{}\"", def.name),
            AstNode::EnumValueDefinition(_)
            | AstNode::FieldDefinition(_)
            | AstNode::InputValueDefinition(_) => return VisitAction::Continue,
        };
        self.ctx.report(
            format!("the {what} definition is not executable"),
            node.location(),
        );
        VisitAction::Skip
    }
}
