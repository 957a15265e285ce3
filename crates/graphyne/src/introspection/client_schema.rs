//! Building a [`Schema`] out of an introspection response, for clients that
//! only have the capabilities of a remote server to go by.

use crate::execution::JsonValue;
use crate::SchemaError;
use crate::Schema;
use graphyne_parser::ast;
use graphyne_parser::name;
use graphyne_parser::Name;
use graphyne_parser::Node;

/// Build a schema from the data of an introspection query response:
/// either the object holding `"__schema"`, or a full response with `"data"`.
///
/// The result has no resolvers attached; it supports validation and
/// type-level tooling.
pub fn build_client_schema(introspection: &JsonValue) -> Result<Schema, SchemaError> {
    let schema_object = introspection
        .get("__schema")
        .or_else(|| introspection.get("data").and_then(|data| data.get("__schema")))
        .ok_or_else(|| invalid("the response contains no \"__schema\" entry"))?;

    let mut definitions = Vec::new();
    definitions.push(schema_definition(schema_object)?);
    for ty in array(schema_object, "types")? {
        // Introspection types and built-in scalars are part of every schema
        let name = string(ty, "name")?;
        if name.starts_with("__")
            || matches!(name, "Int" | "Float" | "String" | "Boolean" | "ID")
        {
            continue;
        }
        definitions.push(type_definition(ty)?);
    }
    if let Some(directives) = schema_object.get("directives") {
        for directive in directives.as_array().into_iter().flatten() {
            // Built-in directives likewise
            if matches!(
                string(directive, "name")?,
                "skip" | "include" | "deprecated" | "specifiedBy" | "defer" | "stream" | "oneOf"
            ) {
                continue;
            }
            definitions.push(directive_definition(directive)?);
        }
    }

    let mut builder = Schema::builder();
    builder.add_document(&ast::Document {
        source: None,
        definitions,
    });
    builder.build()
}

fn invalid(message: impl Into<String>) -> SchemaError {
    SchemaError::Introspection(message.into())
}

fn string<'a>(value: &'a JsonValue, key: &str) -> Result<&'a str, SchemaError> {
    value
        .get(key)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| invalid(format!("expected a string at \"{key}\" in {value}")))
}

fn opt_string(value: &JsonValue, key: &str) -> Option<String> {
    value.get(key).and_then(JsonValue::as_str).map(str::to_owned)
}

fn array<'a>(
    value: &'a JsonValue,
    key: &str,
) -> Result<impl Iterator<Item = &'a JsonValue>, SchemaError> {
    value
        .get(key)
        .and_then(JsonValue::as_array)
        .map(|items| items.iter())
        .ok_or_else(|| invalid(format!("expected a list at \"{key}\"")))
}

fn opt_array<'a>(value: &'a JsonValue, key: &str) -> impl Iterator<Item = &'a JsonValue> {
    value
        .get(key)
        .and_then(JsonValue::as_array)
        .into_iter()
        .flatten()
}

fn parsed_name(value: &str) -> Result<Name, SchemaError> {
    Name::new(value).map_err(|error| invalid(error.to_string()))
}

fn named(value: &JsonValue, key: &str) -> Result<Name, SchemaError> {
    parsed_name(string(value, key)?)
}

fn schema_definition(schema_object: &JsonValue) -> Result<ast::Definition, SchemaError> {
    let mut root_operations = Vec::new();
    for (operation_type, key) in [
        (ast::OperationType::Query, "queryType"),
        (ast::OperationType::Mutation, "mutationType"),
        (ast::OperationType::Subscription, "subscriptionType"),
    ] {
        match schema_object.get(key) {
            Some(JsonValue::Object(root)) => {
                let name = root
                    .get("name")
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| invalid(format!("expected a type name at \"{key}\"")))?;
                root_operations.push(Node::new((operation_type, parsed_name(name)?)));
            }
            _ => continue,
        }
    }
    if root_operations.is_empty() {
        return Err(invalid("the introspected schema has no root types"));
    }
    Ok(ast::Definition::SchemaDefinition(Node::new(
        ast::SchemaDefinition {
            description: opt_string(schema_object, "description"),
            directives: ast::Directives::new(),
            root_operations,
        },
    )))
}

fn type_definition(ty: &JsonValue) -> Result<ast::Definition, SchemaError> {
    let kind = string(ty, "kind")?;
    let type_name = named(ty, "name")?;
    let description = opt_string(ty, "description");
    Ok(match kind {
        "SCALAR" => {
            let mut directives = ast::Directives::new();
            if let Some(url) = opt_string(ty, "specifiedByURL") {
                directives.push(Node::new(ast::Directive {
                    name: name!("specifiedBy"),
                    arguments: vec![Node::new(ast::Argument {
                        name: name!("url"),
                        value: Node::new(ast::Value::String(url)),
                    })],
                }));
            }
            ast::Definition::ScalarTypeDefinition(Node::new(ast::ScalarTypeDefinition {
                description,
                name: type_name,
                directives,
            }))
        }
        "OBJECT" => ast::Definition::ObjectTypeDefinition(Node::new(ast::ObjectTypeDefinition {
            description,
            name: type_name,
            implements_interfaces: interface_names(ty)?,
            directives: ast::Directives::new(),
            fields: field_definitions(ty)?,
        })),
        "INTERFACE" => {
            ast::Definition::InterfaceTypeDefinition(Node::new(ast::InterfaceTypeDefinition {
                description,
                name: type_name,
                implements_interfaces: interface_names(ty)?,
                directives: ast::Directives::new(),
                fields: field_definitions(ty)?,
            }))
        }
        "UNION" => {
            let mut members = Vec::new();
            for member in opt_array(ty, "possibleTypes") {
                members.push(named(member, "name")?);
            }
            ast::Definition::UnionTypeDefinition(Node::new(ast::UnionTypeDefinition {
                description,
                name: type_name,
                directives: ast::Directives::new(),
                members,
            }))
        }
        "ENUM" => {
            let mut values = Vec::new();
            for value in opt_array(ty, "enumValues") {
                values.push(Node::new(ast::EnumValueDefinition {
                    description: opt_string(value, "description"),
                    value: named(value, "name")?,
                    directives: deprecation_directives(value),
                }));
            }
            ast::Definition::EnumTypeDefinition(Node::new(ast::EnumTypeDefinition {
                description,
                name: type_name,
                directives: ast::Directives::new(),
                values,
            }))
        }
        "INPUT_OBJECT" => {
            let mut fields = Vec::new();
            for field in opt_array(ty, "inputFields") {
                fields.push(input_value_definition(field)?);
            }
            ast::Definition::InputObjectTypeDefinition(Node::new(
                ast::InputObjectTypeDefinition {
                    description,
                    name: type_name,
                    directives: ast::Directives::new(),
                    fields,
                },
            ))
        }
        other => return Err(invalid(format!("unknown type kind \"{other}\""))),
    })
}

fn interface_names(ty: &JsonValue) -> Result<Vec<Name>, SchemaError> {
    let mut interfaces = Vec::new();
    for interface in opt_array(ty, "interfaces") {
        interfaces.push(named(interface, "name")?);
    }
    Ok(interfaces)
}

fn field_definitions(ty: &JsonValue) -> Result<Vec<Node<ast::FieldDefinition>>, SchemaError> {
    let mut fields = Vec::new();
    for field in opt_array(ty, "fields") {
        let mut arguments = Vec::new();
        for argument in opt_array(field, "args") {
            arguments.push(input_value_definition(argument)?);
        }
        fields.push(Node::new(ast::FieldDefinition {
            description: opt_string(field, "description"),
            name: named(field, "name")?,
            arguments,
            ty: type_reference(
                field
                    .get("type")
                    .ok_or_else(|| invalid(format!("field {field} has no type")))?,
            )?,
            directives: deprecation_directives(field),
        }));
    }
    Ok(fields)
}

fn input_value_definition(
    value: &JsonValue,
) -> Result<Node<ast::InputValueDefinition>, SchemaError> {
    let default_value = match value.get("defaultValue") {
        Some(JsonValue::String(text)) => Some(
            graphyne_parser::parse_const_value(text.as_str(), "introspection defaultValue")
                .map_err(|error| invalid(format!("invalid default value: {error}")))?,
        ),
        _ => None,
    };
    Ok(Node::new(ast::InputValueDefinition {
        description: opt_string(value, "description"),
        name: named(value, "name")?,
        ty: type_reference(
            value
                .get("type")
                .ok_or_else(|| invalid(format!("input value {value} has no type")))?,
        )?,
        default_value,
        directives: deprecation_directives(value),
    }))
}

fn deprecation_directives(value: &JsonValue) -> ast::Directives {
    let deprecated = value
        .get("isDeprecated")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);
    if !deprecated {
        return ast::Directives::new();
    }
    let mut arguments = Vec::new();
    if let Some(reason) = value.get("deprecationReason").and_then(JsonValue::as_str) {
        arguments.push(Node::new(ast::Argument {
            name: name!("reason"),
            value: Node::new(ast::Value::String(reason.to_owned())),
        }));
    }
    ast::Directives(vec![Node::new(ast::Directive {
        name: name!("deprecated"),
        arguments,
    })])
}

fn directive_definition(directive: &JsonValue) -> Result<ast::Definition, SchemaError> {
    let mut arguments = Vec::new();
    for argument in opt_array(directive, "args") {
        arguments.push(input_value_definition(argument)?);
    }
    let mut locations = Vec::new();
    for location in opt_array(directive, "locations") {
        let name = location
            .as_str()
            .ok_or_else(|| invalid("directive locations must be strings"))?;
        locations.push(
            ast::DirectiveLocation::from_name(name)
                .ok_or_else(|| invalid(format!("unknown directive location \"{name}\"")))?,
        );
    }
    Ok(ast::Definition::DirectiveDefinition(Node::new(
        ast::DirectiveDefinition {
            description: opt_string(directive, "description"),
            name: named(directive, "name")?,
            arguments,
            repeatable: directive
                .get("isRepeatable")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
            locations,
        },
    )))
}

fn type_reference(ty: &JsonValue) -> Result<ast::Type, SchemaError> {
    match string(ty, "kind")? {
        "NON_NULL" => Ok(type_reference(
            ty.get("ofType")
                .ok_or_else(|| invalid("NON_NULL type without ofType"))?,
        )?
        .non_null()),
        "LIST" => Ok(ast::Type::List(Box::new(type_reference(
            ty.get("ofType")
                .ok_or_else(|| invalid("LIST type without ofType"))?,
        )?))),
        _ => Ok(ast::Type::Named(named(ty, "name")?)),
    }
}
