use super::*;
use crate::block_string::print_block_string;
use crate::block_string::print_string;
use std::fmt;

/// Serialization state for writing GraphQL syntax with indentation.
pub(crate) struct State<'fmt, 'fmt2> {
    indent_prefix: &'static str,
    indent_level: usize,
    output: &'fmt mut fmt::Formatter<'fmt2>,
    /// Have we not written anything yet?
    output_empty: bool,
}

impl<'fmt, 'fmt2> State<'fmt, 'fmt2> {
    pub(crate) fn new(output: &'fmt mut fmt::Formatter<'fmt2>) -> Self {
        Self {
            indent_prefix: "  ",
            indent_level: 0,
            output,
            output_empty: true,
        }
    }

    fn write(&mut self, str: &str) -> fmt::Result {
        self.output_empty = false;
        self.output.write_str(str)
    }

    fn write_display(&mut self, value: impl fmt::Display) -> fmt::Result {
        self.output_empty = false;
        write!(self.output, "{value}")
    }

    fn indent(&mut self) -> fmt::Result {
        self.indent_level += 1;
        self.new_line()
    }

    fn dedent(&mut self) -> fmt::Result {
        self.indent_level -= 1; // checked underflow in debug mode
        self.new_line()
    }

    fn new_line(&mut self) -> fmt::Result {
        self.write("\n")?;
        for _ in 0..self.indent_level {
            self.write(self.indent_prefix)?
        }
        Ok(())
    }
}

pub(crate) fn document(state: &mut State, document: &Document) -> fmt::Result {
    let mut definitions = document.definitions.iter();
    if let Some(first) = definitions.next() {
        definition(state, first)?;
        definitions.try_for_each(|def| {
            // Empty line between top-level definitions
            state.write("\n")?;
            state.new_line()?;
            definition(state, def)
        })?;
        state.write("\n")?;
    }
    Ok(())
}

fn definition(state: &mut State, def: &Definition) -> fmt::Result {
    match def {
        Definition::OperationDefinition(def) => operation_definition(state, def),
        Definition::FragmentDefinition(def) => fragment_definition(state, def),
        Definition::DirectiveDefinition(def) => directive_definition(state, def),
        Definition::SchemaDefinition(def) => schema_definition(state, def),
        Definition::ScalarTypeDefinition(def) => scalar_type_definition(state, def),
        Definition::ObjectTypeDefinition(def) => object_type_definition(state, def),
        Definition::InterfaceTypeDefinition(def) => interface_type_definition(state, def),
        Definition::UnionTypeDefinition(def) => union_type_definition(state, def),
        Definition::EnumTypeDefinition(def) => enum_type_definition(state, def),
        Definition::InputObjectTypeDefinition(def) => input_object_type_definition(state, def),
        Definition::SchemaExtension(def) => schema_extension(state, def),
        Definition::ScalarTypeExtension(def) => scalar_type_extension(state, def),
        Definition::ObjectTypeExtension(def) => object_type_extension(state, def),
        Definition::InterfaceTypeExtension(def) => interface_type_extension(state, def),
        Definition::UnionTypeExtension(def) => union_type_extension(state, def),
        Definition::EnumTypeExtension(def) => enum_type_extension(state, def),
        Definition::InputObjectTypeExtension(def) => input_object_type_extension(state, def),
    }
}

fn operation_definition(state: &mut State, def: &OperationDefinition) -> fmt::Result {
    // Deconstruct to get a warning if we forget to serialize something
    let OperationDefinition {
        operation_type,
        name,
        variables,
        directives,
        selection_set,
    } = def;
    // Only use the shorthand when this is the first item:
    // if not, it might be following a `[lookahead != "{"]` grammar production
    let shorthand = state.output_empty
        && *operation_type == OperationType::Query
        && name.is_none()
        && variables.is_empty()
        && directives.is_empty();
    if !shorthand {
        state.write(operation_type.name())?;
        if let Some(name) = name {
            state.write(" ")?;
            state.write(name)?;
        }
        variable_definitions(state, variables)?;
        directive_list(state, directives)?;
        state.write(" ")?;
    }
    curly_brackets(state, selection_set, selection)
}

fn fragment_definition(state: &mut State, def: &FragmentDefinition) -> fmt::Result {
    let FragmentDefinition {
        name,
        variables,
        type_condition,
        directives,
        selection_set,
    } = def;
    state.write("fragment ")?;
    state.write(name)?;
    variable_definitions(state, variables)?;
    state.write(" on ")?;
    state.write(type_condition)?;
    directive_list(state, directives)?;
    state.write(" ")?;
    curly_brackets(state, selection_set, selection)
}

fn variable_definitions(state: &mut State, variables: &[Node<VariableDefinition>]) -> fmt::Result {
    comma_separated(state, "(", ")", variables, |state, var| {
        variable_definition(state, var)
    })
}

fn variable_definition(state: &mut State, var: &VariableDefinition) -> fmt::Result {
    let VariableDefinition {
        name,
        ty,
        default_value,
        directives,
    } = var;
    state.write("$")?;
    state.write(name)?;
    state.write(": ")?;
    state.write_display(ty)?;
    if let Some(default) = default_value {
        state.write(" = ")?;
        value(state, default)?;
    }
    directive_list(state, directives)
}

fn selection(state: &mut State, sel: &Selection) -> fmt::Result {
    match sel {
        Selection::Field(sel) => field(state, sel),
        Selection::FragmentSpread(sel) => fragment_spread(state, sel),
        Selection::InlineFragment(sel) => inline_fragment(state, sel),
    }
}

fn field(state: &mut State, sel: &Field) -> fmt::Result {
    let Field {
        alias,
        name,
        arguments,
        directives,
        selection_set,
    } = sel;
    if let Some(alias) = alias {
        state.write(alias)?;
        state.write(": ")?;
    }
    state.write(name)?;
    argument_list(state, arguments)?;
    directive_list(state, directives)?;
    if !selection_set.is_empty() {
        state.write(" ")?;
        curly_brackets(state, selection_set, selection)?;
    }
    Ok(())
}

fn fragment_spread(state: &mut State, sel: &FragmentSpread) -> fmt::Result {
    let FragmentSpread {
        fragment_name,
        directives,
    } = sel;
    state.write("...")?;
    state.write(fragment_name)?;
    directive_list(state, directives)
}

fn inline_fragment(state: &mut State, sel: &InlineFragment) -> fmt::Result {
    let InlineFragment {
        type_condition,
        directives,
        selection_set,
    } = sel;
    state.write("...")?;
    if let Some(type_condition) = type_condition {
        state.write(" on ")?;
        state.write(type_condition)?;
    }
    directive_list(state, directives)?;
    state.write(" ")?;
    curly_brackets(state, selection_set, selection)
}

fn directive_list(state: &mut State, directives: &Directives) -> fmt::Result {
    directives.0.iter().try_for_each(|dir| {
        state.write(" ")?;
        directive(state, dir)
    })
}

fn directive(state: &mut State, dir: &Directive) -> fmt::Result {
    let Directive { name, arguments } = dir;
    state.write("@")?;
    state.write(name)?;
    argument_list(state, arguments)
}

fn argument_list(state: &mut State, arguments: &[Node<Argument>]) -> fmt::Result {
    comma_separated(state, "(", ")", arguments, |state, argument| {
        state.write(&argument.name)?;
        state.write(": ")?;
        value(state, &argument.value)
    })
}

pub(crate) fn value(state: &mut State, val: &Value) -> fmt::Result {
    match val {
        Value::Null => state.write("null"),
        Value::Enum(name) => state.write(name),
        Value::Variable(name) => {
            state.write("$")?;
            state.write(name)
        }
        Value::String(text) => {
            if text.contains('\n') {
                state.write(&print_block_string(text))
            } else {
                state.write(&print_string(text))
            }
        }
        Value::Float(float) => state.write_display(FloatDisplay(float.into_inner())),
        Value::Int(int) => state.write_display(int),
        Value::BigInt(digits) => state.write(digits),
        Value::Boolean(true) => state.write("true"),
        Value::Boolean(false) => state.write("false"),
        Value::List(items) => {
            state.write("[")?;
            let mut items = items.iter();
            if let Some(first) = items.next() {
                value(state, first)?;
                items.try_for_each(|item| {
                    state.write(", ")?;
                    value(state, item)
                })?;
            }
            state.write("]")
        }
        Value::Object(fields) => comma_separated(state, "{", "}", fields, |state, field| {
            let (name, val) = field;
            state.write(name)?;
            state.write(": ")?;
            value(state, val)
        }),
    }
}

/// `{:?}` of `f64` is the shortest form that parses back to the same value,
/// and always either contains a decimal point or an exponent, so a printed
/// `Float` value never re-lexes as an `Int` token.
struct FloatDisplay(f64);

impl fmt::Display for FloatDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

fn description(state: &mut State, description: &Option<String>) -> fmt::Result {
    if let Some(text) = description {
        if text.contains('\n') || text.ends_with('"') {
            state.write(&print_block_string(text))?;
        } else {
            state.write(&print_string(text))?;
        }
        state.new_line()?;
    }
    Ok(())
}

fn directive_definition(state: &mut State, def: &DirectiveDefinition) -> fmt::Result {
    let DirectiveDefinition {
        description: desc,
        name,
        arguments,
        repeatable,
        locations,
    } = def;
    description(state, desc)?;
    state.write("directive @")?;
    state.write(name)?;
    input_value_definitions(state, arguments)?;
    if *repeatable {
        state.write(" repeatable")?;
    }
    let mut locations = locations.iter();
    if let Some(first) = locations.next() {
        state.write(" on ")?;
        state.write(first.name())?;
        locations.try_for_each(|loc| {
            state.write(" | ")?;
            state.write(loc.name())
        })?;
    }
    Ok(())
}

fn schema_definition(state: &mut State, def: &SchemaDefinition) -> fmt::Result {
    let SchemaDefinition {
        description: desc,
        directives,
        root_operations,
    } = def;
    description(state, desc)?;
    state.write("schema")?;
    directive_list(state, directives)?;
    state.write(" ")?;
    curly_brackets(state, root_operations, |state, op| {
        let (operation_type, object_type) = &**op;
        state.write(operation_type.name())?;
        state.write(": ")?;
        state.write(object_type)
    })
}

fn scalar_type_definition(state: &mut State, def: &ScalarTypeDefinition) -> fmt::Result {
    let ScalarTypeDefinition {
        description: desc,
        name,
        directives,
    } = def;
    description(state, desc)?;
    state.write("scalar ")?;
    state.write(name)?;
    directive_list(state, directives)
}

fn implements_interfaces(state: &mut State, interfaces: &[NamedType]) -> fmt::Result {
    let mut interfaces = interfaces.iter();
    if let Some(first) = interfaces.next() {
        state.write(" implements ")?;
        state.write(first)?;
        interfaces.try_for_each(|interface| {
            state.write(" & ")?;
            state.write(interface)
        })?;
    }
    Ok(())
}

fn fields_definition(state: &mut State, fields: &[Node<FieldDefinition>]) -> fmt::Result {
    if fields.is_empty() {
        return Ok(());
    }
    state.write(" ")?;
    curly_brackets(state, fields, |state, def| {
        let FieldDefinition {
            description: desc,
            name,
            arguments,
            ty,
            directives,
        } = &**def;
        description(state, desc)?;
        state.write(name)?;
        input_value_definitions(state, arguments)?;
        state.write(": ")?;
        state.write_display(ty)?;
        directive_list(state, directives)
    })
}

fn input_value_definitions(
    state: &mut State,
    arguments: &[Node<InputValueDefinition>],
) -> fmt::Result {
    comma_separated(state, "(", ")", arguments, |state, def| {
        input_value_definition(state, def)
    })
}

fn input_value_definition(state: &mut State, def: &InputValueDefinition) -> fmt::Result {
    let InputValueDefinition {
        description: desc,
        name,
        ty,
        default_value,
        directives,
    } = def;
    // Descriptions of arguments are kept on the same line to stay inside
    // the parenthesised list.
    if let Some(text) = desc {
        state.write(&print_string(text))?;
        state.write(" ")?;
    }
    state.write(name)?;
    state.write(": ")?;
    state.write_display(ty)?;
    if let Some(default) = default_value {
        state.write(" = ")?;
        value(state, default)?;
    }
    directive_list(state, directives)
}

fn object_type_definition(state: &mut State, def: &ObjectTypeDefinition) -> fmt::Result {
    let ObjectTypeDefinition {
        description: desc,
        name,
        implements_interfaces: interfaces,
        directives,
        fields,
    } = def;
    description(state, desc)?;
    state.write("type ")?;
    state.write(name)?;
    implements_interfaces(state, interfaces)?;
    directive_list(state, directives)?;
    fields_definition(state, fields)
}

fn interface_type_definition(state: &mut State, def: &InterfaceTypeDefinition) -> fmt::Result {
    let InterfaceTypeDefinition {
        description: desc,
        name,
        implements_interfaces: interfaces,
        directives,
        fields,
    } = def;
    description(state, desc)?;
    state.write("interface ")?;
    state.write(name)?;
    implements_interfaces(state, interfaces)?;
    directive_list(state, directives)?;
    fields_definition(state, fields)
}

fn union_members(state: &mut State, members: &[NamedType]) -> fmt::Result {
    let mut members = members.iter();
    if let Some(first) = members.next() {
        state.write(" = ")?;
        state.write(first)?;
        members.try_for_each(|member| {
            state.write(" | ")?;
            state.write(member)
        })?;
    }
    Ok(())
}

fn union_type_definition(state: &mut State, def: &UnionTypeDefinition) -> fmt::Result {
    let UnionTypeDefinition {
        description: desc,
        name,
        directives,
        members,
    } = def;
    description(state, desc)?;
    state.write("union ")?;
    state.write(name)?;
    directive_list(state, directives)?;
    union_members(state, members)
}

fn enum_values(state: &mut State, values: &[Node<EnumValueDefinition>]) -> fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    state.write(" ")?;
    curly_brackets(state, values, |state, def| {
        let EnumValueDefinition {
            description: desc,
            value,
            directives,
        } = &**def;
        description(state, desc)?;
        state.write(value)?;
        directive_list(state, directives)
    })
}

fn enum_type_definition(state: &mut State, def: &EnumTypeDefinition) -> fmt::Result {
    let EnumTypeDefinition {
        description: desc,
        name,
        directives,
        values,
    } = def;
    description(state, desc)?;
    state.write("enum ")?;
    state.write(name)?;
    directive_list(state, directives)?;
    enum_values(state, values)
}

fn input_fields(state: &mut State, fields: &[Node<InputValueDefinition>]) -> fmt::Result {
    if fields.is_empty() {
        return Ok(());
    }
    state.write(" ")?;
    curly_brackets(state, fields, |state, def| input_value_definition(state, def))
}

fn input_object_type_definition(state: &mut State, def: &InputObjectTypeDefinition) -> fmt::Result {
    let InputObjectTypeDefinition {
        description: desc,
        name,
        directives,
        fields,
    } = def;
    description(state, desc)?;
    state.write("input ")?;
    state.write(name)?;
    directive_list(state, directives)?;
    input_fields(state, fields)
}

fn schema_extension(state: &mut State, def: &SchemaExtension) -> fmt::Result {
    let SchemaExtension {
        directives,
        root_operations,
    } = def;
    state.write("extend schema")?;
    directive_list(state, directives)?;
    if root_operations.is_empty() {
        return Ok(());
    }
    state.write(" ")?;
    curly_brackets(state, root_operations, |state, op| {
        let (operation_type, object_type) = &**op;
        state.write(operation_type.name())?;
        state.write(": ")?;
        state.write(object_type)
    })
}

fn scalar_type_extension(state: &mut State, def: &ScalarTypeExtension) -> fmt::Result {
    let ScalarTypeExtension { name, directives } = def;
    state.write("extend scalar ")?;
    state.write(name)?;
    directive_list(state, directives)
}

fn object_type_extension(state: &mut State, def: &ObjectTypeExtension) -> fmt::Result {
    let ObjectTypeExtension {
        name,
        implements_interfaces: interfaces,
        directives,
        fields,
    } = def;
    state.write("extend type ")?;
    state.write(name)?;
    implements_interfaces(state, interfaces)?;
    directive_list(state, directives)?;
    fields_definition(state, fields)
}

fn interface_type_extension(state: &mut State, def: &InterfaceTypeExtension) -> fmt::Result {
    let InterfaceTypeExtension {
        name,
        implements_interfaces: interfaces,
        directives,
        fields,
    } = def;
    state.write("extend interface ")?;
    state.write(name)?;
    implements_interfaces(state, interfaces)?;
    directive_list(state, directives)?;
    fields_definition(state, fields)
}

fn union_type_extension(state: &mut State, def: &UnionTypeExtension) -> fmt::Result {
    let UnionTypeExtension {
        name,
        directives,
        members,
    } = def;
    state.write("extend union ")?;
    state.write(name)?;
    directive_list(state, directives)?;
    union_members(state, members)
}

fn enum_type_extension(state: &mut State, def: &EnumTypeExtension) -> fmt::Result {
    let EnumTypeExtension {
        name,
        directives,
        values,
    } = def;
    state.write("extend enum ")?;
    state.write(name)?;
    directive_list(state, directives)?;
    enum_values(state, values)
}

fn input_object_type_extension(state: &mut State, def: &InputObjectTypeExtension) -> fmt::Result {
    let InputObjectTypeExtension {
        name,
        directives,
        fields,
    } = def;
    state.write("extend input ")?;
    state.write(name)?;
    directive_list(state, directives)?;
    input_fields(state, fields)
}

fn comma_separated<T>(
    state: &mut State,
    open: &str,
    close: &str,
    items: &[T],
    serialize_one: impl Fn(&mut State, &T) -> fmt::Result,
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    state.write(open)?;
    let mut items = items.iter();
    if let Some(first) = items.next() {
        serialize_one(state, first)?;
        items.try_for_each(|item| {
            state.write(", ")?;
            serialize_one(state, item)
        })?;
    }
    state.write(close)
}

fn curly_brackets<T>(
    state: &mut State,
    items: &[T],
    serialize_one: impl Fn(&mut State, &T) -> fmt::Result,
) -> fmt::Result {
    state.write("{")?;
    let mut items = items.iter();
    if let Some(first) = items.next() {
        state.indent()?;
        serialize_one(state, first)?;
        items.try_for_each(|item| {
            state.new_line()?;
            serialize_one(state, item)
        })?;
        state.dedent()?;
    }
    state.write("}")
}

macro_rules! display_impl {
    ($ty: ty, $serialize: path) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $serialize(&mut State::new(f), self)
            }
        }
    };
}

display_impl!(Document, document);
display_impl!(Definition, definition);
display_impl!(OperationDefinition, operation_definition);
display_impl!(FragmentDefinition, fragment_definition);
display_impl!(VariableDefinition, variable_definition);
display_impl!(Selection, selection);
display_impl!(Field, field);
display_impl!(FragmentSpread, fragment_spread);
display_impl!(InlineFragment, inline_fragment);
display_impl!(Directive, directive);
display_impl!(Value, value);
display_impl!(DirectiveDefinition, directive_definition);
display_impl!(SchemaDefinition, schema_definition);
display_impl!(ScalarTypeDefinition, scalar_type_definition);
display_impl!(ObjectTypeDefinition, object_type_definition);
display_impl!(InterfaceTypeDefinition, interface_type_definition);
display_impl!(UnionTypeDefinition, union_type_definition);
display_impl!(EnumTypeDefinition, enum_type_definition);
display_impl!(InputObjectTypeDefinition, input_object_type_definition);
display_impl!(InputValueDefinition, input_value_definition);

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{name}"),
            Type::NonNullNamed(name) => write!(f, "{name}!"),
            Type::List(inner) => write!(f, "[{inner}]"),
            Type::NonNullList(inner) => write!(f, "[{inner}]!"),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt(f)
    }
}
