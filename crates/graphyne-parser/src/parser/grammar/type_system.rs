use super::description;
use super::directive::directives;
use super::many;
use super::operation::operation_type;
use super::optional_many;
use super::ty::ty;
use super::value::value;
use crate::ast;
use crate::lexer::TokenKind;
use crate::parser::SyntaxParser;
use crate::Node;
use crate::SyntaxError;

/// Dispatch on the type system definition keyword at the current token.
pub(crate) fn definition(
    p: &mut SyntaxParser,
    start: usize,
    description: Option<String>,
) -> Result<ast::Definition, SyntaxError> {
    match p.current().data() {
        "schema" => schema_definition(p, start, description),
        "scalar" => scalar_definition(p, start, description),
        "type" => object_definition(p, start, description),
        "interface" => interface_definition(p, start, description),
        "union" => union_definition(p, start, description),
        "enum" => enum_definition(p, start, description),
        "input" => input_object_definition(p, start, description),
        "directive" => directive_definition(p, start, description),
        _ => Err(p.unexpected("a type system definition")),
    }
}

pub(crate) fn extension(
    p: &mut SyntaxParser,
    start: usize,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("extend")?;
    match p.current().data() {
        "schema" => schema_extension(p, start),
        "scalar" => scalar_extension(p, start),
        "type" => object_extension(p, start),
        "interface" => interface_extension(p, start),
        "union" => union_extension(p, start),
        "enum" => enum_extension(p, start),
        "input" => input_object_extension(p, start),
        _ => Err(p.unexpected("an extendable type system definition")),
    }
}

fn root_operation(
    p: &mut SyntaxParser,
) -> Result<Node<(ast::OperationType, ast::NamedType)>, SyntaxError> {
    let start = p.start();
    let operation_type = operation_type(p)?;
    p.expect(TokenKind::Colon)?;
    let object_type = p.name()?;
    Ok(p.node(start, (operation_type, object_type)))
}

fn schema_definition(
    p: &mut SyntaxParser,
    start: usize,
    description: Option<String>,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("schema")?;
    let directives = directives(p, true)?;
    let root_operations = many(
        p,
        TokenKind::LCurly,
        TokenKind::RCurly,
        "root operation type definition",
        root_operation,
    )?;
    Ok(ast::Definition::SchemaDefinition(p.node(
        start,
        ast::SchemaDefinition {
            description,
            directives,
            root_operations,
        },
    )))
}

fn schema_extension(p: &mut SyntaxParser, start: usize) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("schema")?;
    let directives = directives(p, true)?;
    let root_operations = if p.is_kind(TokenKind::LCurly) {
        many(
            p,
            TokenKind::LCurly,
            TokenKind::RCurly,
            "root operation type definition",
            root_operation,
        )?
    } else {
        Vec::new()
    };
    if directives.is_empty() && root_operations.is_empty() {
        return Err(p.error("a schema extension must specify directives or root operation types"));
    }
    Ok(ast::Definition::SchemaExtension(p.node(
        start,
        ast::SchemaExtension {
            directives,
            root_operations,
        },
    )))
}

fn scalar_definition(
    p: &mut SyntaxParser,
    start: usize,
    description: Option<String>,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("scalar")?;
    let name = p.name()?;
    let directives = directives(p, true)?;
    Ok(ast::Definition::ScalarTypeDefinition(p.node(
        start,
        ast::ScalarTypeDefinition {
            description,
            name,
            directives,
        },
    )))
}

fn scalar_extension(p: &mut SyntaxParser, start: usize) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("scalar")?;
    let name = p.name()?;
    let directives = directives(p, true)?;
    if directives.is_empty() {
        return Err(p.error("a scalar extension must specify directives"));
    }
    Ok(ast::Definition::ScalarTypeExtension(p.node(
        start,
        ast::ScalarTypeExtension { name, directives },
    )))
}

/// `implements A & B`, also accepting a leading `&`
fn implements_interfaces(p: &mut SyntaxParser) -> Result<Vec<ast::NamedType>, SyntaxError> {
    let mut interfaces = Vec::new();
    if p.eat_keyword("implements") {
        p.eat_kind(TokenKind::Amp);
        interfaces.push(p.name()?);
        while p.eat_kind(TokenKind::Amp) {
            interfaces.push(p.name()?);
        }
    }
    Ok(interfaces)
}

fn fields_definition(
    p: &mut SyntaxParser,
) -> Result<Vec<Node<ast::FieldDefinition>>, SyntaxError> {
    optional_many(
        p,
        TokenKind::LCurly,
        TokenKind::RCurly,
        "field definition",
        field_definition,
    )
}

fn field_definition(p: &mut SyntaxParser) -> Result<Node<ast::FieldDefinition>, SyntaxError> {
    let start = p.start();
    let description = description(p)?;
    let name = p.name()?;
    let arguments = arguments_definition(p)?;
    p.expect(TokenKind::Colon)?;
    let ty = ty(p)?;
    let directives = directives(p, true)?;
    Ok(p.node(
        start,
        ast::FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
        },
    ))
}

fn arguments_definition(
    p: &mut SyntaxParser,
) -> Result<Vec<Node<ast::InputValueDefinition>>, SyntaxError> {
    optional_many(
        p,
        TokenKind::LParen,
        TokenKind::RParen,
        "argument definition",
        input_value_definition,
    )
}

fn input_value_definition(
    p: &mut SyntaxParser,
) -> Result<Node<ast::InputValueDefinition>, SyntaxError> {
    let start = p.start();
    let description = description(p)?;
    let name = p.name()?;
    p.expect(TokenKind::Colon)?;
    let ty = ty(p)?;
    let default_value = if p.eat_kind(TokenKind::Eq) {
        Some(value(p, true)?)
    } else {
        None
    };
    let directives = directives(p, true)?;
    Ok(p.node(
        start,
        ast::InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
        },
    ))
}

fn object_definition(
    p: &mut SyntaxParser,
    start: usize,
    description: Option<String>,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("type")?;
    let name = p.name()?;
    let implements_interfaces = implements_interfaces(p)?;
    let directives = directives(p, true)?;
    let fields = fields_definition(p)?;
    Ok(ast::Definition::ObjectTypeDefinition(p.node(
        start,
        ast::ObjectTypeDefinition {
            description,
            name,
            implements_interfaces,
            directives,
            fields,
        },
    )))
}

fn object_extension(p: &mut SyntaxParser, start: usize) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("type")?;
    let name = p.name()?;
    let implements_interfaces = implements_interfaces(p)?;
    let directives = directives(p, true)?;
    let fields = fields_definition(p)?;
    if implements_interfaces.is_empty() && directives.is_empty() && fields.is_empty() {
        return Err(p.error("a type extension must specify interfaces, directives, or fields"));
    }
    Ok(ast::Definition::ObjectTypeExtension(p.node(
        start,
        ast::ObjectTypeExtension {
            name,
            implements_interfaces,
            directives,
            fields,
        },
    )))
}

fn interface_definition(
    p: &mut SyntaxParser,
    start: usize,
    description: Option<String>,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("interface")?;
    let name = p.name()?;
    let implements_interfaces = implements_interfaces(p)?;
    let directives = directives(p, true)?;
    let fields = fields_definition(p)?;
    Ok(ast::Definition::InterfaceTypeDefinition(p.node(
        start,
        ast::InterfaceTypeDefinition {
            description,
            name,
            implements_interfaces,
            directives,
            fields,
        },
    )))
}

fn interface_extension(
    p: &mut SyntaxParser,
    start: usize,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("interface")?;
    let name = p.name()?;
    let implements_interfaces = implements_interfaces(p)?;
    let directives = directives(p, true)?;
    let fields = fields_definition(p)?;
    if implements_interfaces.is_empty() && directives.is_empty() && fields.is_empty() {
        return Err(
            p.error("an interface extension must specify interfaces, directives, or fields")
        );
    }
    Ok(ast::Definition::InterfaceTypeExtension(p.node(
        start,
        ast::InterfaceTypeExtension {
            name,
            implements_interfaces,
            directives,
            fields,
        },
    )))
}

/// `= A | B`, also accepting a leading `|`
fn union_members(p: &mut SyntaxParser) -> Result<Vec<ast::NamedType>, SyntaxError> {
    let mut members = Vec::new();
    if p.eat_kind(TokenKind::Eq) {
        p.eat_kind(TokenKind::Pipe);
        members.push(p.name()?);
        while p.eat_kind(TokenKind::Pipe) {
            members.push(p.name()?);
        }
    }
    Ok(members)
}

fn union_definition(
    p: &mut SyntaxParser,
    start: usize,
    description: Option<String>,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("union")?;
    let name = p.name()?;
    let directives = directives(p, true)?;
    let members = union_members(p)?;
    Ok(ast::Definition::UnionTypeDefinition(p.node(
        start,
        ast::UnionTypeDefinition {
            description,
            name,
            directives,
            members,
        },
    )))
}

fn union_extension(p: &mut SyntaxParser, start: usize) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("union")?;
    let name = p.name()?;
    let directives = directives(p, true)?;
    let members = union_members(p)?;
    if directives.is_empty() && members.is_empty() {
        return Err(p.error("a union extension must specify directives or member types"));
    }
    Ok(ast::Definition::UnionTypeExtension(p.node(
        start,
        ast::UnionTypeExtension {
            name,
            directives,
            members,
        },
    )))
}

fn enum_value_definition(
    p: &mut SyntaxParser,
) -> Result<Node<ast::EnumValueDefinition>, SyntaxError> {
    let start = p.start();
    let description = description(p)?;
    if p.at_keyword("true") || p.at_keyword("false") || p.at_keyword("null") {
        return Err(p.error(format!(
            "an enum value cannot be named \"{}\"",
            p.current().data()
        )));
    }
    let value = p.name()?;
    let directives = directives(p, true)?;
    Ok(p.node(
        start,
        ast::EnumValueDefinition {
            description,
            value,
            directives,
        },
    ))
}

fn enum_values(
    p: &mut SyntaxParser,
) -> Result<Vec<Node<ast::EnumValueDefinition>>, SyntaxError> {
    optional_many(
        p,
        TokenKind::LCurly,
        TokenKind::RCurly,
        "enum value definition",
        enum_value_definition,
    )
}

fn enum_definition(
    p: &mut SyntaxParser,
    start: usize,
    description: Option<String>,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("enum")?;
    let name = p.name()?;
    let directives = directives(p, true)?;
    let values = enum_values(p)?;
    Ok(ast::Definition::EnumTypeDefinition(p.node(
        start,
        ast::EnumTypeDefinition {
            description,
            name,
            directives,
            values,
        },
    )))
}

fn enum_extension(p: &mut SyntaxParser, start: usize) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("enum")?;
    let name = p.name()?;
    let directives = directives(p, true)?;
    let values = enum_values(p)?;
    if directives.is_empty() && values.is_empty() {
        return Err(p.error("an enum extension must specify directives or values"));
    }
    Ok(ast::Definition::EnumTypeExtension(p.node(
        start,
        ast::EnumTypeExtension {
            name,
            directives,
            values,
        },
    )))
}

fn input_fields_definition(
    p: &mut SyntaxParser,
) -> Result<Vec<Node<ast::InputValueDefinition>>, SyntaxError> {
    optional_many(
        p,
        TokenKind::LCurly,
        TokenKind::RCurly,
        "input field definition",
        input_value_definition,
    )
}

fn input_object_definition(
    p: &mut SyntaxParser,
    start: usize,
    description: Option<String>,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("input")?;
    let name = p.name()?;
    let directives = directives(p, true)?;
    let fields = input_fields_definition(p)?;
    Ok(ast::Definition::InputObjectTypeDefinition(p.node(
        start,
        ast::InputObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
        },
    )))
}

fn input_object_extension(
    p: &mut SyntaxParser,
    start: usize,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("input")?;
    let name = p.name()?;
    let directives = directives(p, true)?;
    let fields = input_fields_definition(p)?;
    if directives.is_empty() && fields.is_empty() {
        return Err(p.error("an input object extension must specify directives or fields"));
    }
    Ok(ast::Definition::InputObjectTypeExtension(p.node(
        start,
        ast::InputObjectTypeExtension {
            name,
            directives,
            fields,
        },
    )))
}

fn directive_definition(
    p: &mut SyntaxParser,
    start: usize,
    description: Option<String>,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("directive")?;
    p.expect(TokenKind::At)?;
    let name = p.name()?;
    let arguments = arguments_definition(p)?;
    let repeatable = p.eat_keyword("repeatable");
    p.expect_keyword("on")?;
    let mut locations = Vec::new();
    p.eat_kind(TokenKind::Pipe);
    locations.push(directive_location(p)?);
    while p.eat_kind(TokenKind::Pipe) {
        locations.push(directive_location(p)?);
    }
    Ok(ast::Definition::DirectiveDefinition(p.node(
        start,
        ast::DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
        },
    )))
}

fn directive_location(p: &mut SyntaxParser) -> Result<ast::DirectiveLocation, SyntaxError> {
    if !p.is_kind(TokenKind::Name) {
        return Err(p.unexpected("a directive location"));
    }
    match ast::DirectiveLocation::from_name(p.current().data()) {
        Some(location) => {
            p.advance();
            Ok(location)
        }
        None => Err(p.unexpected("a directive location")),
    }
}
