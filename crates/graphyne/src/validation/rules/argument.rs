use crate::validation::ValidationContext;
use graphyne_parser::ast;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;
use graphyne_parser::Node;
use std::collections::HashSet;

/// Arguments are defined on the field or directive they are passed to.
pub(crate) struct KnownArgumentNames<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> KnownArgumentNames<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for KnownArgumentNames<'_> {
    fn enter(&mut self, node: &AstNode, info: &VisitInfo<'_>) -> VisitAction {
        let AstNode::Argument(argument) = node else {
            return VisitAction::Continue;
        };
        let type_info = self.ctx.type_info.borrow();
        if type_info.argument().is_some() {
            return VisitAction::Continue;
        }
        match info.parent() {
            Some(AstNode::Directive(directive)) => {
                if type_info.directive().is_some() {
                    self.ctx.report(
                        format!(
                            "unknown argument \"{}\" on directive \"@{}\"",
                            argument.name, directive.name
                        ),
                        argument.location(),
                    );
                }
            }
            Some(AstNode::Field(field)) => {
                if let (Some(_), Some(parent)) = (
                    type_info.field_def(),
                    type_info.enclosing_parent_type(),
                ) {
                    self.ctx.report(
                        format!(
                            "unknown argument \"{}\" on field \"{}.{}\"",
                            argument.name,
                            parent.name(),
                            field.name
                        ),
                        argument.location(),
                    );
                }
            }
            _ => {}
        }
        VisitAction::Continue
    }
}

/// Argument names are unique per field or directive.
pub(crate) struct UniqueArgumentNames<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> UniqueArgumentNames<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    fn check(&self, arguments: &[Node<ast::Argument>]) {
        let mut seen = HashSet::new();
        for argument in arguments {
            if !seen.insert(argument.name.clone()) {
                self.ctx.report(
                    format!("there can be only one argument named \"{}\"", argument.name),
                    argument.location(),
                );
            }
        }
    }
}

impl Visitor for UniqueArgumentNames<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        match node {
            AstNode::Field(field) => self.check(&field.arguments),
            AstNode::Directive(directive) => self.check(&directive.arguments),
            _ => {}
        }
        VisitAction::Continue
    }
}

/// Required (non-null, defaultless) arguments are provided.
pub(crate) struct ProvidedRequiredArguments<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> ProvidedRequiredArguments<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    fn check(
        &self,
        what: &str,
        declared: &[Node<ast::InputValueDefinition>],
        provided: &[Node<ast::Argument>],
        location: Option<graphyne_parser::SourceSpan>,
    ) {
        for declaration in declared {
            let required = declaration.ty.is_non_null() && declaration.default_value.is_none();
            if !required {
                continue;
            }
            if !provided
                .iter()
                .any(|argument| argument.name == declaration.name)
            {
                self.ctx.report(
                    format!(
                        "{what} argument \"{}\" of type \"{}\" is required, \
                         but it was not provided",
                        declaration.name, declaration.ty
                    ),
                    location,
                );
            }
        }
    }
}

impl Visitor for ProvidedRequiredArguments<'_> {
    fn leave(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        match node {
            AstNode::Field(field) => {
                let type_info = self.ctx.type_info.borrow();
                if let Some(field_def) = type_info.field_def() {
                    self.check(
                        &format!("field \"{}\"", field.name),
                        &field_def.arguments,
                        &field.arguments,
                        field.name.location().or(field.location()),
                    );
                }
            }
            AstNode::Directive(directive) => {
                let type_info = self.ctx.type_info.borrow();
                if let Some(definition) = type_info.directive() {
                    self.check(
                        &format!("directive \"@{}\"", directive.name),
                        &definition.arguments,
                        &directive.arguments,
                        directive.location(),
                    );
                }
            }
            _ => {}
        }
        VisitAction::Continue
    }
}
