use crate::schema::ExtendedType;
use crate::validation::ValidationContext;
use graphyne_parser::ast::Type;
use graphyne_parser::ast::Value;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;
use graphyne_parser::Node;
use std::collections::HashSet;

/// Value literals are coercible to the type of the position they are in.
///
/// Variables are exempt here; variables_in_allowed_position covers them.
pub(crate) struct ValuesOfCorrectType<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> ValuesOfCorrectType<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    fn report_mismatch(&self, ty: &Type, value: &Node<Value>) {
        self.ctx.report(
            format!("expected a value of type \"{ty}\", found {value}"),
            value.location(),
        );
    }

    fn check_value(&self, value: &Node<Value>, ty: &Type) {
        if value.as_variable().is_some() {
            return;
        }
        if value.is_null() {
            if ty.is_non_null() {
                self.report_mismatch(ty, value);
            }
            return;
        }
        let ty_name = match ty {
            Type::List(inner) | Type::NonNullList(inner) => {
                match value.as_list() {
                    Some(items) => {
                        for item in items {
                            self.check_value(item, inner);
                        }
                    }
                    // A single value coerces to a list of one item
                    None => self.check_value(value, inner),
                }
                return;
            }
            Type::Named(name) | Type::NonNullNamed(name) => name,
        };
        let Some(ty_def) = self.ctx.schema.types.get(ty_name.as_str()) else {
            // Unknown types in the schema are schema validation's concern
            return;
        };
        match ty_def {
            ExtendedType::Scalar(scalar) => {
                let ok = match ty_name.as_str() {
                    "Int" => matches!(&**value, Value::Int(_)),
                    "Float" => {
                        matches!(&**value, Value::Int(_) | Value::Float(_) | Value::BigInt(_))
                    }
                    "String" => matches!(&**value, Value::String(_)),
                    "Boolean" => matches!(&**value, Value::Boolean(_)),
                    "ID" => matches!(
                        &**value,
                        Value::String(_) | Value::Int(_) | Value::BigInt(_)
                    ),
                    _ => match self.ctx.schema.scalars.get(&scalar.name) {
                        Some(coercion) => coercion
                            .parse_literal(value, &crate::execution::JsonMap::new())
                            .is_ok(),
                        // Custom scalars without a coercer accept any literal
                        None => true,
                    },
                };
                if !ok {
                    self.report_mismatch(ty, value);
                }
            }
            ExtendedType::Enum(def) => {
                let ok = value
                    .as_enum()
                    .is_some_and(|name| def.values.contains_key(name.as_str()));
                if !ok {
                    self.report_mismatch(ty, value);
                }
            }
            ExtendedType::InputObject(def) => {
                let Some(fields) = value.as_object() else {
                    self.report_mismatch(ty, value);
                    return;
                };
                for (name, field_value) in fields {
                    match def.fields.get(name.as_str()) {
                        Some(declared) => self.check_value(field_value, &declared.ty),
                        None => self.ctx.report(
                            format!(
                                "field \"{name}\" is not defined \
                                 by the input type \"{ty_name}\""
                            ),
                            name.location().or(field_value.location()),
                        ),
                    }
                }
                for (name, declared) in &def.fields {
                    let required =
                        declared.ty.is_non_null() && declared.default_value.is_none();
                    let provided = fields.iter().any(|(provided, _)| provided == name);
                    if required && !provided {
                        self.ctx.report(
                            format!(
                                "field \"{ty_name}.{name}\" of required type \
                                 \"{}\" was not provided",
                                declared.ty
                            ),
                            value.location(),
                        );
                    }
                }
                if def.is_one_of() {
                    let one_field = fields.len() == 1
                        && fields
                            .first()
                            .is_some_and(|(_, field_value)| !field_value.is_null());
                    if !one_field {
                        self.ctx.report(
                            format!(
                                "the @oneOf input object \"{ty_name}\" must have \
                                 exactly one non-null field"
                            ),
                            value.location(),
                        );
                    }
                }
            }
            // Output types in input positions are reported elsewhere
            _ => {}
        }
    }
}

impl Visitor for ValuesOfCorrectType<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        match node {
            AstNode::Argument(argument) => {
                let ty = self
                    .ctx
                    .type_info
                    .borrow()
                    .argument()
                    .map(|declared| declared.ty.clone());
                if let Some(ty) = ty {
                    self.check_value(&argument.value, &ty);
                }
            }
            AstNode::VariableDefinition(variable) => {
                if let Some(default) = &variable.default_value {
                    self.check_value(default, &variable.ty);
                }
            }
            _ => {}
        }
        VisitAction::Continue
    }
}

/// Input object literals do not repeat field names.
pub(crate) struct UniqueInputFieldNames<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> UniqueInputFieldNames<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for UniqueInputFieldNames<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Value(value) = node {
            if let Some(fields) = value.as_object() {
                let mut seen = HashSet::new();
                for (name, _) in fields {
                    if !seen.insert(name.clone()) {
                        self.ctx.report(
                            format!("there can be only one input field named \"{name}\""),
                            name.location().or(value.location()),
                        );
                    }
                }
            }
        }
        VisitAction::Continue
    }
}
