use crate::validation::ValidationContext;
use graphyne_parser::ast::Type;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;
use graphyne_parser::Name;
use graphyne_parser::SourceSpan;

/// Every named type referenced by the document exists in the schema.
pub(crate) struct KnownTypeNames<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> KnownTypeNames<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    fn check(&self, name: &Name, location: Option<SourceSpan>) {
        if !self.ctx.schema.types.contains_key(name.as_str()) {
            self.ctx
                .report(format!("unknown type \"{name}\""), name.location().or(location));
        }
    }
}

impl Visitor for KnownTypeNames<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        match node {
            AstNode::Type(Type::Named(name) | Type::NonNullNamed(name)) => {
                self.check(name, None);
            }
            AstNode::Fragment(fragment) => {
                self.check(&fragment.type_condition, fragment.location());
            }
            AstNode::InlineFragment(inline) => {
                if let Some(condition) = &inline.type_condition {
                    self.check(condition, inline.location());
                }
            }
            _ => {}
        }
        VisitAction::Continue
    }
}
