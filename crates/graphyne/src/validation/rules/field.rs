use crate::schema::ExtendedType;
use crate::validation::ValidationContext;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;

/// Every selected field is defined on the type it is selected on.
pub(crate) struct FieldsOnCorrectType<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> FieldsOnCorrectType<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for FieldsOnCorrectType<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        let AstNode::Field(field) = node else {
            return VisitAction::Continue;
        };
        let type_info = self.ctx.type_info.borrow();
        let Some(parent) = type_info.enclosing_parent_type() else {
            // The parent type is unknown (e.g. an unknown fragment
            // condition); other rules report that
            return VisitAction::Continue;
        };
        if type_info.field_def().is_some() {
            return VisitAction::Continue;
        }
        let suggestion = match parent {
            ExtendedType::Union(_) => " (unions only support the __typename meta field directly)",
            _ => "",
        };
        self.ctx.report(
            format!(
                "cannot query field \"{}\" on type \"{}\"{suggestion}",
                field.name,
                parent.name(),
            ),
            field.name.location().or(field.location()),
        );
        VisitAction::Continue
    }
}
