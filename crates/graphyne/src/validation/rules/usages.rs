//! Collecting every variable usage reachable from an operation, with the
//! input type and default of the position it appears in. Shared by the
//! variable rules.

use crate::schema::ExtendedType;
use crate::validation::ValidationContext;
use crate::Schema;
use graphyne_parser::ast;
use graphyne_parser::ast::Selection;
use graphyne_parser::ast::Type;
use graphyne_parser::ast::Value;
use graphyne_parser::Name;
use graphyne_parser::Node;
use graphyne_parser::SourceSpan;
use std::collections::HashSet;

pub(crate) struct VariableUsage {
    pub(crate) name: Name,
    pub(crate) location: Option<SourceSpan>,
    /// The declared input type of the position, when it is known
    pub(crate) ty: Option<Type>,
    /// Whether the position declares a default value
    pub(crate) has_position_default: bool,
}

/// All variable usages of an operation, fragments included (transitively).
pub(crate) fn operation_variable_usages(
    ctx: &ValidationContext<'_>,
    operation: &ast::OperationDefinition,
) -> Vec<VariableUsage> {
    let mut usages = Vec::new();
    let mut visited = HashSet::new();
    let parent = ctx
        .schema
        .root_operation(operation.operation_type)
        .cloned();
    collect_in_directives(ctx, &operation.directives, &mut usages);
    collect_in_selections(
        ctx,
        parent.as_ref(),
        &operation.selection_set,
        &mut visited,
        &mut usages,
    );
    usages
}

fn collect_in_selections(
    ctx: &ValidationContext<'_>,
    parent: Option<&Name>,
    selections: &[Selection],
    visited: &mut HashSet<Name>,
    usages: &mut Vec<VariableUsage>,
) {
    for selection in selections {
        match selection {
            Selection::Field(field) => {
                let field_def = parent.and_then(|parent| {
                    ctx.schema
                        .type_field(parent.as_str(), field.name.as_str())
                        .ok()
                });
                for argument in &field.arguments {
                    let declaration = field_def.and_then(|def| {
                        def.arguments
                            .iter()
                            .find(|declared| declared.name == argument.name)
                    });
                    collect_in_value(
                        ctx.schema,
                        &argument.value,
                        declaration.map(|declared| &declared.ty),
                        declaration.is_some_and(|declared| declared.default_value.is_some()),
                        usages,
                    );
                }
                collect_in_directives(ctx, &field.directives, usages);
                let child = field_def.map(|def| def.ty.inner_named_type().clone());
                collect_in_selections(ctx, child.as_ref(), &field.selection_set, visited, usages);
            }
            Selection::InlineFragment(inline) => {
                collect_in_directives(ctx, &inline.directives, usages);
                let child = inline.type_condition.as_ref().or(parent);
                collect_in_selections(ctx, child, &inline.selection_set, visited, usages);
            }
            Selection::FragmentSpread(spread) => {
                collect_in_directives(ctx, &spread.directives, usages);
                if !visited.insert(spread.fragment_name.clone()) {
                    continue;
                }
                if let Some(fragment) = ctx.fragments.get(spread.fragment_name.as_str()) {
                    collect_in_directives(ctx, &fragment.directives, usages);
                    collect_in_selections(
                        ctx,
                        Some(&fragment.type_condition),
                        &fragment.selection_set,
                        visited,
                        usages,
                    );
                }
            }
        }
    }
}

fn collect_in_directives(
    ctx: &ValidationContext<'_>,
    directives: &ast::Directives,
    usages: &mut Vec<VariableUsage>,
) {
    for directive in directives {
        let definition = ctx
            .schema
            .directive_definitions
            .get(directive.name.as_str());
        for argument in &directive.arguments {
            let declaration = definition.and_then(|def| {
                def.arguments
                    .iter()
                    .find(|declared| declared.name == argument.name)
            });
            collect_in_value(
                ctx.schema,
                &argument.value,
                declaration.map(|declared| &declared.ty),
                declaration.is_some_and(|declared| declared.default_value.is_some()),
                usages,
            );
        }
    }
}

fn collect_in_value(
    schema: &Schema,
    value: &Node<Value>,
    expected: Option<&Type>,
    has_position_default: bool,
    usages: &mut Vec<VariableUsage>,
) {
    match &**value {
        Value::Variable(name) => usages.push(VariableUsage {
            name: name.clone(),
            location: name.location().or(value.location()),
            ty: expected.cloned(),
            has_position_default,
        }),
        Value::List(items) => {
            let item_type = expected.and_then(Type::item_type);
            for item in items {
                collect_in_value(schema, item, item_type, false, usages);
            }
        }
        Value::Object(object_fields) => {
            let input_object = expected
                .map(Type::inner_named_type)
                .and_then(|name| match schema.types.get(name.as_str()) {
                    Some(ExtendedType::InputObject(def)) => Some(def),
                    _ => None,
                });
            for (field_name, field_value) in object_fields {
                let declaration = input_object
                    .and_then(|def| def.fields.get(field_name.as_str()));
                collect_in_value(
                    schema,
                    field_value,
                    declaration.map(|declared| &declared.ty),
                    declaration.is_some_and(|declared| declared.default_value.is_some()),
                    usages,
                );
            }
        }
        _ => {}
    }
}

/// <https://spec.graphql.org/October2021/#IsVariableUsageAllowed()>
pub(crate) fn is_variable_usage_allowed(
    schema: &Schema,
    variable: &ast::VariableDefinition,
    usage: &VariableUsage,
) -> bool {
    let Some(position_type) = &usage.ty else {
        return true;
    };
    if position_type.is_non_null() && !variable.ty.is_non_null() {
        let variable_has_default = variable
            .default_value
            .as_ref()
            .is_some_and(|default| !default.is_null());
        if !variable_has_default && !usage.has_position_default {
            return false;
        }
        return is_type_sub_type_of(schema, &variable.ty, &position_type.clone().nullable());
    }
    is_type_sub_type_of(schema, &variable.ty, position_type)
}

/// <https://spec.graphql.org/October2021/#AreTypesCompatible()>
fn is_type_sub_type_of(schema: &Schema, maybe_sub: &Type, super_type: &Type) -> bool {
    match (maybe_sub, super_type) {
        (Type::NonNullNamed(sub), Type::NonNullNamed(sup))
        | (Type::NonNullNamed(sub), Type::Named(sup))
        | (Type::Named(sub), Type::Named(sup)) => sub == sup || schema.is_subtype(sup, sub),
        (Type::NonNullList(sub), Type::NonNullList(sup))
        | (Type::NonNullList(sub), Type::List(sup))
        | (Type::List(sub), Type::List(sup)) => is_type_sub_type_of(schema, sub, sup),
        _ => false,
    }
}
