use super::usages::is_variable_usage_allowed;
use super::usages::operation_variable_usages;
use crate::validation::ValidationContext;
use graphyne_parser::ast;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;
use graphyne_parser::Node;
use std::collections::HashSet;

fn describe(operation: &Node<ast::OperationDefinition>) -> String {
    match &operation.name {
        Some(name) => format!("operation \"{name}\""),
        None => "the anonymous operation".to_owned(),
    }
}

/// Variable names are unique per operation.
pub(crate) struct UniqueVariableNames<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> UniqueVariableNames<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for UniqueVariableNames<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Operation(operation) = node {
            let mut seen = HashSet::new();
            for variable in &operation.variables {
                if !seen.insert(variable.name.clone()) {
                    self.ctx.report(
                        format!("there can be only one variable named \"${}\"", variable.name),
                        variable.location(),
                    );
                }
            }
        }
        VisitAction::Continue
    }
}

/// Variables have input types.
pub(crate) struct VariablesAreInputTypes<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> VariablesAreInputTypes<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for VariablesAreInputTypes<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::VariableDefinition(variable) = node {
            let name = variable.ty.inner_named_type();
            // Unknown types are reported by known_type_names
            if let Some(ty) = self.ctx.schema.types.get(name.as_str()) {
                if !ty.is_input_type() {
                    self.ctx.report(
                        format!(
                            "variable \"${}\" cannot have the non-input type \"{}\"",
                            variable.name, variable.ty
                        ),
                        variable.location(),
                    );
                }
            }
        }
        VisitAction::Continue
    }
}

/// Every used variable is declared by the operation.
pub(crate) struct NoUndefinedVariables<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> NoUndefinedVariables<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for NoUndefinedVariables<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Operation(operation) = node {
            let declared: HashSet<&str> = operation
                .variables
                .iter()
                .map(|variable| variable.name.as_str())
                .collect();
            let mut reported = HashSet::new();
            for usage in operation_variable_usages(self.ctx, operation) {
                if !declared.contains(usage.name.as_str())
                    && reported.insert(usage.name.clone())
                {
                    self.ctx.report(
                        format!(
                            "variable \"${}\" is not defined by {}",
                            usage.name,
                            describe(operation)
                        ),
                        usage.location,
                    );
                }
            }
        }
        VisitAction::Continue
    }
}

/// Every declared variable is used by the operation.
pub(crate) struct NoUnusedVariables<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> NoUnusedVariables<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for NoUnusedVariables<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Operation(operation) = node {
            let used: HashSet<_> = operation_variable_usages(self.ctx, operation)
                .into_iter()
                .map(|usage| usage.name)
                .collect();
            for variable in &operation.variables {
                if !used.contains(&variable.name) {
                    self.ctx.report(
                        format!(
                            "variable \"${}\" is never used in {}",
                            variable.name,
                            describe(operation)
                        ),
                        variable.location(),
                    );
                }
            }
        }
        VisitAction::Continue
    }
}

/// Variables are only used in positions their type is compatible with.
pub(crate) struct VariablesInAllowedPosition<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> VariablesInAllowedPosition<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for VariablesInAllowedPosition<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Operation(operation) = node {
            for usage in operation_variable_usages(self.ctx, operation) {
                let Some(variable) = operation
                    .variables
                    .iter()
                    .find(|variable| variable.name == usage.name)
                else {
                    continue;
                };
                if !is_variable_usage_allowed(self.ctx.schema, variable, &usage) {
                    let position = usage
                        .ty
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    self.ctx.report(
                        format!(
                            "variable \"${}\" of type \"{}\" cannot be used \
                             in a position expecting type \"{position}\"",
                            usage.name, variable.ty
                        ),
                        usage.location,
                    );
                }
            }
        }
        VisitAction::Continue
    }
}
