//! Structural validation of a schema, over and above what
//! [`SchemaBuilder`][super::SchemaBuilder] already rejects.

use super::ExtendedType;
use super::Schema;
use crate::execution::GraphQLError;
use graphyne_parser::ast;
use graphyne_parser::ast::Type;
use graphyne_parser::Name;
use graphyne_parser::Node;
use graphyne_parser::SourceSpan;

struct SchemaValidation<'a> {
    schema: &'a Schema,
    errors: Vec<GraphQLError>,
}

/// Validate the structure of a schema, returning all errors found.
///
/// An empty list means the schema is valid and usable for execution.
pub fn validate_schema(schema: &Schema) -> Vec<GraphQLError> {
    let mut validation = SchemaValidation {
        schema,
        errors: Vec::new(),
    };
    validation.validate_root_operations();
    for (name, ty) in &schema.types {
        if ty.is_built_in() {
            continue;
        }
        validation.validate_reserved_name(name, "type", ty.location());
        match ty {
            ExtendedType::Scalar(_) => {}
            ExtendedType::Object(def) => {
                validation.validate_fields(name, &def.fields, def.location());
                validation.validate_implements(
                    name,
                    &def.implements_interfaces,
                    &def.fields,
                    def.location(),
                );
            }
            ExtendedType::Interface(def) => {
                validation.validate_fields(name, &def.fields, def.location());
                validation.validate_implements(
                    name,
                    &def.implements_interfaces,
                    &def.fields,
                    def.location(),
                );
            }
            ExtendedType::Union(def) => {
                for member in &def.members {
                    match schema.types.get(member.as_str()) {
                        Some(ExtendedType::Object(_)) => {}
                        Some(_) => validation.error(
                            format!(
                                "union {name} can only include object types, \
                                 it cannot include {member}"
                            ),
                            member.location().or(def.location()),
                        ),
                        None => validation.error(
                            format!("union {name} includes the undefined type {member}"),
                            member.location().or(def.location()),
                        ),
                    }
                }
                if def.members.is_empty() {
                    validation
                        .error(format!("union {name} must include at least one member type"), def.location());
                }
            }
            ExtendedType::Enum(def) => {
                if def.values.is_empty() {
                    validation
                        .error(format!("enum {name} must define at least one value"), def.location());
                }
                for value in def.values.keys() {
                    validation.validate_reserved_name(value, "enum value", def.location());
                }
            }
            ExtendedType::InputObject(def) => {
                if def.fields.is_empty() {
                    validation.error(
                        format!("input object {name} must define at least one field"),
                        def.location(),
                    );
                }
                for (field_name, field) in &def.fields {
                    validation.validate_reserved_name(field_name, "input field", field.location());
                    validation.validate_input_position(
                        &field.ty,
                        || format!("input field {name}.{field_name}"),
                        field.location(),
                    );
                }
            }
        }
    }
    for (name, directive) in &schema.directive_definitions {
        if directive.is_built_in() {
            continue;
        }
        validation.validate_reserved_name(name, "directive", directive.location());
        for argument in &directive.arguments {
            validation.validate_reserved_name(&argument.name, "argument", argument.location());
            validation.validate_input_position(
                &argument.ty,
                || format!("argument @{name}({}:)", argument.name),
                argument.location(),
            );
        }
    }
    validation.errors
}

impl SchemaValidation<'_> {
    fn error(&mut self, message: impl Into<String>, location: Option<SourceSpan>) {
        self.errors
            .push(GraphQLError::new(message, location, &self.schema.sources));
    }

    fn validate_root_operations(&mut self) {
        if self.schema.query_type.is_none() {
            self.error("the schema must define a query root type", None);
        }
        for (operation_type, root) in [
            (ast::OperationType::Query, &self.schema.query_type),
            (ast::OperationType::Mutation, &self.schema.mutation_type),
            (
                ast::OperationType::Subscription,
                &self.schema.subscription_type,
            ),
        ] {
            let Some(root) = root else { continue };
            match self.schema.types.get(root.as_str()) {
                Some(ExtendedType::Object(_)) => {}
                Some(_) => self.error(
                    format!("the {operation_type} root type {root} must be an object type"),
                    root.location(),
                ),
                None => self.error(
                    format!("the {operation_type} root references the undefined type {root}"),
                    root.location(),
                ),
            }
        }
    }

    fn validate_reserved_name(&mut self, name: &Name, what: &str, location: Option<SourceSpan>) {
        if name.starts_with("__") {
            self.error(
                format!(
                    "{what} name {name} is reserved: \
                     names starting with \"__\" are for introspection only"
                ),
                name.location().or(location),
            );
        }
    }

    fn validate_input_position(
        &mut self,
        ty: &Type,
        describe: impl Fn() -> String,
        location: Option<SourceSpan>,
    ) {
        let name = ty.inner_named_type();
        match self.schema.types.get(name.as_str()) {
            None => self.error(
                format!("{} has undefined type {name}", describe()),
                name.location().or(location),
            ),
            Some(def) if !def.is_input_type() => self.error(
                format!("{} must have an input type, not {name}", describe()),
                name.location().or(location),
            ),
            Some(_) => {}
        }
    }

    fn validate_output_position(
        &mut self,
        ty: &Type,
        describe: impl Fn() -> String,
        location: Option<SourceSpan>,
    ) {
        let name = ty.inner_named_type();
        match self.schema.types.get(name.as_str()) {
            None => self.error(
                format!("{} has undefined type {name}", describe()),
                name.location().or(location),
            ),
            Some(def) if !def.is_output_type() => self.error(
                format!("{} must have an output type, not {name}", describe()),
                name.location().or(location),
            ),
            Some(_) => {}
        }
    }

    fn validate_fields(
        &mut self,
        type_name: &Name,
        fields: &indexmap::IndexMap<Name, Node<ast::FieldDefinition>>,
        location: Option<SourceSpan>,
    ) {
        if fields.is_empty() {
            self.error(
                format!("type {type_name} must define at least one field"),
                location,
            );
        }
        for (field_name, field) in fields {
            self.validate_reserved_name(field_name, "field", field.location());
            self.validate_output_position(
                &field.ty,
                || format!("field {type_name}.{field_name}"),
                field.location(),
            );
            let mut seen = std::collections::HashSet::new();
            for argument in &field.arguments {
                if !seen.insert(argument.name.as_str()) {
                    self.error(
                        format!(
                            "field {type_name}.{field_name} defines \
                             the argument {} multiple times",
                            argument.name
                        ),
                        argument.location(),
                    );
                }
                self.validate_reserved_name(&argument.name, "argument", argument.location());
                self.validate_input_position(
                    &argument.ty,
                    || format!("argument {type_name}.{field_name}({}:)", argument.name),
                    argument.location(),
                );
            }
        }
    }

    fn validate_implements(
        &mut self,
        type_name: &Name,
        interfaces: &indexmap::IndexSet<Name>,
        fields: &indexmap::IndexMap<Name, Node<ast::FieldDefinition>>,
        location: Option<SourceSpan>,
    ) {
        for interface_name in interfaces {
            if interface_name == type_name {
                self.error(
                    format!("type {type_name} cannot implement itself"),
                    location,
                );
                continue;
            }
            let Some(ExtendedType::Interface(interface)) =
                self.schema.types.get(interface_name.as_str())
            else {
                self.error(
                    format!(
                        "type {type_name} cannot implement {interface_name}: \
                         it is not a defined interface"
                    ),
                    interface_name.location().or(location),
                );
                continue;
            };
            // Transitive implementation: interfaces of the interface
            // must be declared too
            for transitive in &interface.implements_interfaces {
                if transitive != type_name && !interfaces.contains(transitive.as_str()) {
                    self.error(
                        format!(
                            "type {type_name} must implement {transitive}, \
                             declared by the implemented interface {interface_name}"
                        ),
                        location,
                    );
                }
            }
            for (field_name, interface_field) in &interface.fields {
                let Some(field) = fields.get(field_name.as_str()) else {
                    self.error(
                        format!(
                            "interface field {interface_name}.{field_name} \
                             is missing on {type_name}"
                        ),
                        location,
                    );
                    continue;
                };
                if !self.is_valid_implementation_type(&field.ty, &interface_field.ty) {
                    self.error(
                        format!(
                            "field {type_name}.{field_name}: type {} \
                             is not a subtype of the interface field type {}",
                            field.ty, interface_field.ty
                        ),
                        field.location(),
                    );
                }
                for interface_argument in &interface_field.arguments {
                    let implemented = field
                        .arguments
                        .iter()
                        .find(|argument| argument.name == interface_argument.name);
                    match implemented {
                        None => self.error(
                            format!(
                                "argument {interface_name}.{field_name}({}:) \
                                 is missing on {type_name}.{field_name}",
                                interface_argument.name
                            ),
                            field.location(),
                        ),
                        // Argument types are invariant
                        Some(argument) if argument.ty != interface_argument.ty => self.error(
                            format!(
                                "argument {type_name}.{field_name}({}:) \
                                 must have type {}, the type declared by {interface_name}",
                                argument.name, interface_argument.ty
                            ),
                            argument.location(),
                        ),
                        Some(_) => {}
                    }
                }
                for argument in &field.arguments {
                    let declared = interface_field
                        .arguments
                        .iter()
                        .any(|interface_argument| interface_argument.name == argument.name);
                    if !declared && argument.ty.is_non_null() && argument.default_value.is_none() {
                        self.error(
                            format!(
                                "argument {type_name}.{field_name}({}:) is required \
                                 but not declared by the interface {interface_name}",
                                argument.name
                            ),
                            argument.location(),
                        );
                    }
                }
            }
        }
    }

    /// <https://spec.graphql.org/October2021/#IsValidImplementationFieldType()>
    fn is_valid_implementation_type(&self, field_type: &Type, interface_type: &Type) -> bool {
        match (field_type, interface_type) {
            // Non-null is covariant
            (Type::NonNullNamed(field), Type::NonNullNamed(interface))
            | (Type::NonNullNamed(field), Type::Named(interface))
            | (Type::Named(field), Type::Named(interface)) => {
                field == interface || self.schema.is_subtype(interface, field)
            }
            (Type::NonNullList(field), Type::NonNullList(interface))
            | (Type::NonNullList(field), Type::List(interface))
            | (Type::List(field), Type::List(interface)) => {
                self.is_valid_implementation_type(field, interface)
            }
            _ => false,
        }
    }
}
