use super::*;
use crate::name;
use crate::Parser;
use crate::SourceSpan;
use crate::SyntaxError;
use std::fmt;
use std::hash;
use std::path::Path;

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            source: None,
            definitions: Vec::new(),
        }
    }

    /// Return a new configurable parser
    pub fn parser() -> Parser {
        Parser::new()
    }

    /// Parse `source_text` with the default parser configuration.
    ///
    /// `path` becomes the label error reports print for this input.
    pub fn parse(
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, SyntaxError> {
        Self::parser().parse(source_text, path)
    }

    /// Iterate the fragment definitions of this document.
    pub fn fragments(&self) -> impl Iterator<Item = &Node<FragmentDefinition>> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::FragmentDefinition(frag) => Some(frag),
            _ => None,
        })
    }

    /// Iterate the operation definitions of this document.
    pub fn operations(&self) -> impl Iterator<Item = &Node<OperationDefinition>> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::OperationDefinition(operation) => Some(operation),
            _ => None,
        })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Eq for Document {}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        let Self {
            source: _, // ignored, like node locations
            definitions,
        } = self;
        *definitions == other.definitions
    }
}

impl hash::Hash for Document {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.definitions.hash(state) // source not included
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Skip two not-useful indentation levels
        for def in &self.definitions {
            def.fmt(f)?;
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl Definition {
    /// Returns true if this is an executable definition (operation or fragment).
    pub fn is_executable_definition(&self) -> bool {
        matches!(
            self,
            Self::OperationDefinition(_) | Self::FragmentDefinition(_)
        )
    }

    /// Returns true if this is an extension of another definition.
    pub fn is_extension_definition(&self) -> bool {
        matches!(
            self,
            Self::SchemaExtension(_)
                | Self::ScalarTypeExtension(_)
                | Self::ObjectTypeExtension(_)
                | Self::InterfaceTypeExtension(_)
                | Self::UnionTypeExtension(_)
                | Self::EnumTypeExtension(_)
                | Self::InputObjectTypeExtension(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::OperationDefinition(_) => "OperationDefinition",
            Self::FragmentDefinition(_) => "FragmentDefinition",
            Self::DirectiveDefinition(_) => "DirectiveDefinition",
            Self::SchemaDefinition(_) => "SchemaDefinition",
            Self::ScalarTypeDefinition(_) => "ScalarTypeDefinition",
            Self::ObjectTypeDefinition(_) => "ObjectTypeDefinition",
            Self::InterfaceTypeDefinition(_) => "InterfaceTypeDefinition",
            Self::UnionTypeDefinition(_) => "UnionTypeDefinition",
            Self::EnumTypeDefinition(_) => "EnumTypeDefinition",
            Self::InputObjectTypeDefinition(_) => "InputObjectTypeDefinition",
            Self::SchemaExtension(_) => "SchemaExtension",
            Self::ScalarTypeExtension(_) => "ScalarTypeExtension",
            Self::ObjectTypeExtension(_) => "ObjectTypeExtension",
            Self::InterfaceTypeExtension(_) => "InterfaceTypeExtension",
            Self::UnionTypeExtension(_) => "UnionTypeExtension",
            Self::EnumTypeExtension(_) => "EnumTypeExtension",
            Self::InputObjectTypeExtension(_) => "InputObjectTypeExtension",
        }
    }

    /// The name of the definition, if it has one: extensions share the name
    /// of the definition they extend, and operations may be anonymous.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Self::OperationDefinition(def) => def.name.as_ref(),
            Self::FragmentDefinition(def) => Some(&def.name),
            Self::DirectiveDefinition(def) => Some(&def.name),
            Self::SchemaDefinition(_) | Self::SchemaExtension(_) => None,
            Self::ScalarTypeDefinition(def) => Some(&def.name),
            Self::ObjectTypeDefinition(def) => Some(&def.name),
            Self::InterfaceTypeDefinition(def) => Some(&def.name),
            Self::UnionTypeDefinition(def) => Some(&def.name),
            Self::EnumTypeDefinition(def) => Some(&def.name),
            Self::InputObjectTypeDefinition(def) => Some(&def.name),
            Self::ScalarTypeExtension(def) => Some(&def.name),
            Self::ObjectTypeExtension(def) => Some(&def.name),
            Self::InterfaceTypeExtension(def) => Some(&def.name),
            Self::UnionTypeExtension(def) => Some(&def.name),
            Self::EnumTypeExtension(def) => Some(&def.name),
            Self::InputObjectTypeExtension(def) => Some(&def.name),
        }
    }

    pub fn location(&self) -> Option<SourceSpan> {
        match self {
            Self::OperationDefinition(def) => def.location(),
            Self::FragmentDefinition(def) => def.location(),
            Self::DirectiveDefinition(def) => def.location(),
            Self::SchemaDefinition(def) => def.location(),
            Self::ScalarTypeDefinition(def) => def.location(),
            Self::ObjectTypeDefinition(def) => def.location(),
            Self::InterfaceTypeDefinition(def) => def.location(),
            Self::UnionTypeDefinition(def) => def.location(),
            Self::EnumTypeDefinition(def) => def.location(),
            Self::InputObjectTypeDefinition(def) => def.location(),
            Self::SchemaExtension(def) => def.location(),
            Self::ScalarTypeExtension(def) => def.location(),
            Self::ObjectTypeExtension(def) => def.location(),
            Self::InterfaceTypeExtension(def) => def.location(),
            Self::UnionTypeExtension(def) => def.location(),
            Self::EnumTypeExtension(def) => def.location(),
            Self::InputObjectTypeExtension(def) => def.location(),
        }
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Skip the enum variant name as it’s redundant with the struct name in it
        match self {
            Self::OperationDefinition(def) => def.fmt(f),
            Self::FragmentDefinition(def) => def.fmt(f),
            Self::DirectiveDefinition(def) => def.fmt(f),
            Self::SchemaDefinition(def) => def.fmt(f),
            Self::ScalarTypeDefinition(def) => def.fmt(f),
            Self::ObjectTypeDefinition(def) => def.fmt(f),
            Self::InterfaceTypeDefinition(def) => def.fmt(f),
            Self::UnionTypeDefinition(def) => def.fmt(f),
            Self::EnumTypeDefinition(def) => def.fmt(f),
            Self::InputObjectTypeDefinition(def) => def.fmt(f),
            Self::SchemaExtension(def) => def.fmt(f),
            Self::ScalarTypeExtension(def) => def.fmt(f),
            Self::ObjectTypeExtension(def) => def.fmt(f),
            Self::InterfaceTypeExtension(def) => def.fmt(f),
            Self::UnionTypeExtension(def) => def.fmt(f),
            Self::EnumTypeExtension(def) => def.fmt(f),
            Self::InputObjectTypeExtension(def) => def.fmt(f),
        }
    }
}

impl OperationType {
    /// Get the name of this operation type as it would appear in the source text
    pub fn name(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }

    /// The default name of the object type for this root operation type
    pub fn default_type_name(self) -> Name {
        match self {
            Self::Query => name!("Query"),
            Self::Mutation => name!("Mutation"),
            Self::Subscription => name!("Subscription"),
        }
    }

    /// The directive location for an operation of this type
    pub fn directive_location(self) -> DirectiveLocation {
        match self {
            Self::Query => DirectiveLocation::Query,
            Self::Mutation => DirectiveLocation::Mutation,
            Self::Subscription => DirectiveLocation::Subscription,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl DirectiveLocation {
    /// Get the name of this directive location as it would appear in the source text
    pub fn name(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
            Self::Subscription => "SUBSCRIPTION",
            Self::Field => "FIELD",
            Self::FragmentDefinition => "FRAGMENT_DEFINITION",
            Self::FragmentSpread => "FRAGMENT_SPREAD",
            Self::InlineFragment => "INLINE_FRAGMENT",
            Self::VariableDefinition => "VARIABLE_DEFINITION",
            Self::Schema => "SCHEMA",
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::FieldDefinition => "FIELD_DEFINITION",
            Self::ArgumentDefinition => "ARGUMENT_DEFINITION",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::EnumValue => "ENUM_VALUE",
            Self::InputObject => "INPUT_OBJECT",
            Self::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "QUERY" => Self::Query,
            "MUTATION" => Self::Mutation,
            "SUBSCRIPTION" => Self::Subscription,
            "FIELD" => Self::Field,
            "FRAGMENT_DEFINITION" => Self::FragmentDefinition,
            "FRAGMENT_SPREAD" => Self::FragmentSpread,
            "INLINE_FRAGMENT" => Self::InlineFragment,
            "VARIABLE_DEFINITION" => Self::VariableDefinition,
            "SCHEMA" => Self::Schema,
            "SCALAR" => Self::Scalar,
            "OBJECT" => Self::Object,
            "FIELD_DEFINITION" => Self::FieldDefinition,
            "ARGUMENT_DEFINITION" => Self::ArgumentDefinition,
            "INTERFACE" => Self::Interface,
            "UNION" => Self::Union,
            "ENUM" => Self::Enum,
            "ENUM_VALUE" => Self::EnumValue,
            "INPUT_OBJECT" => Self::InputObject,
            "INPUT_FIELD_DEFINITION" => Self::InputFieldDefinition,
            _ => return None,
        })
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Directives {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns an iterator of directives with the given name.
    ///
    /// This method is best for repeatable directives. For non-repeatable
    /// directives, see [`get`][Self::get] (singular).
    pub fn get_all<'def: 'name, 'name>(
        &'def self,
        name: &'name str,
    ) -> impl Iterator<Item = &'def Node<Directive>> + 'name {
        self.0.iter().filter(move |dir| dir.name == name)
    }

    /// Returns the first directive with the given name, if any.
    ///
    /// This method is best for non-repeatable directives. For repeatable
    /// directives, see [`get_all`][Self::get_all] (plural).
    pub fn get(&self, name: &str) -> Option<&Node<Directive>> {
        self.get_all(name).next()
    }

    /// Returns whether there is a directive with the given name
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl fmt::Debug for Directives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::ops::Deref for Directives {
    type Target = Vec<Node<Directive>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for Directives {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a Directives {
    type Item = &'a Node<Directive>;
    type IntoIter = std::slice::Iter<'a, Node<Directive>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Node<Directive>> for Directives {
    fn from_iter<T: IntoIterator<Item = Node<Directive>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Directive {
    /// Returns the value of the argument with the given name, if any.
    pub fn specified_argument_by_name(&self, name: &str) -> Option<&Node<Value>> {
        self.arguments
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }
}

impl OperationDefinition {
    pub fn is_query(&self) -> bool {
        self.operation_type == OperationType::Query
    }

    pub fn is_mutation(&self) -> bool {
        self.operation_type == OperationType::Mutation
    }

    pub fn is_subscription(&self) -> bool {
        self.operation_type == OperationType::Subscription
    }
}

impl Field {
    /// Get the name that will be used for this field selection in the
    /// response format: the alias if there is one, else the field name.
    pub fn response_key(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

impl Type {
    /// Returns a new `Type::Named` with the given name
    pub fn new_named(name: Name) -> Self {
        Self::Named(name)
    }

    /// Returns this type made non-null, if it isn’t already
    pub fn non_null(self) -> Self {
        match self {
            Self::Named(name) => Self::NonNullNamed(name),
            Self::List(inner) => Self::NonNullList(inner),
            ty @ (Self::NonNullNamed(_) | Self::NonNullList(_)) => ty,
        }
    }

    /// Returns this type made nullable, if it isn’t already
    pub fn nullable(self) -> Self {
        match self {
            Self::NonNullNamed(name) => Self::Named(name),
            Self::NonNullList(inner) => Self::List(inner),
            ty @ (Self::Named(_) | Self::List(_)) => ty,
        }
    }

    /// Returns a list type whose items are this type
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNullNamed(_) | Self::NonNullList(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_) | Self::NonNullList(_))
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_) | Self::NonNullNamed(_))
    }

    /// Returns the inner type of a (possibly non-null) list type
    pub fn item_type(&self) -> Option<&Type> {
        match self {
            Self::List(inner) | Self::NonNullList(inner) => Some(inner),
            Self::Named(_) | Self::NonNullNamed(_) => None,
        }
    }

    /// Returns the name of the type at the bottom of the wrapper chain
    pub fn inner_named_type(&self) -> &NamedType {
        match self {
            Self::Named(name) | Self::NonNullNamed(name) => name,
            Self::List(inner) | Self::NonNullList(inner) => inner.inner_named_type(),
        }
    }
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Enum(_) => "Enum",
            Value::Variable(_) => "Variable",
            Value::String(_) => "String",
            Value::Float(_) => "Float",
            Value::Int(_) => "Int",
            Value::BigInt(_) => "BigInt",
            Value::Boolean(_) => "Boolean",
            Value::List(_) => "List",
            Value::Object(_) => "Object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_enum(&self) -> Option<&Name> {
        match self {
            Value::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Name> {
        match self {
            Value::Variable(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// The numeric value as a float, for `Int`, `BigInt`, and `Float` values.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(value.into_inner()),
            Value::Int(value) => Some(f64::from(*value)),
            Value::BigInt(digits) => digits.parse().ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node<Value>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(Name, Node<Value>)]> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}
