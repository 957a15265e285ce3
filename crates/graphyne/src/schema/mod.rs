//! High-level representation of a GraphQL schema: the type system the
//! validator checks documents against and the executor resolves with.

use crate::execution::JsonMap;
use crate::execution::JsonValue;
use crate::validation::Valid;
use crate::SchemaError;
use crate::SourceMap;
use graphyne_parser::ast;
use graphyne_parser::name;
use graphyne_parser::Name;
use graphyne_parser::Node;
use graphyne_parser::SourceSpan;
use indexmap::IndexMap;
use indexmap::IndexSet;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::OnceLock;

mod from_ast;
mod to_ast;
pub(crate) mod validation;

pub use self::from_ast::BuildError;
pub use self::from_ast::SchemaBuilder;
pub use graphyne_parser::ast::{
    Directive, DirectiveDefinition, DirectiveLocation, Directives, EnumValueDefinition,
    FieldDefinition, InputValueDefinition, NamedType, Type, Value,
};

/// High-level representation of a GraphQL schema.
///
/// A schema is constructed once (from SDL via [`Schema::parse`], or
/// programmatically via [`SchemaBuilder`]) and thereafter read-only; it may
/// be shared across any number of concurrent executions.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Source files, if any, that were parsed to contribute to this schema.
    pub sources: SourceMap,

    /// The description of the `schema` definition
    pub description: Option<String>,

    /// Built-in and explicit directive definitions
    pub directive_definitions: IndexMap<Name, Node<DirectiveDefinition>>,

    /// Definitions of built-in scalars, introspection types,
    /// and explicit types, with any extensions folded in
    pub types: IndexMap<NamedType, ExtendedType>,

    /// Name of the object type for the `query` root operation
    pub query_type: Option<NamedType>,

    /// Name of the object type for the `mutation` root operation
    pub mutation_type: Option<NamedType>,

    /// Name of the object type for the `subscription` root operation
    pub subscription_type: Option<NamedType>,

    /// Custom scalar coercion hooks, keyed by scalar name
    pub scalars: ScalarRegistry,
}

/// The definition of a named type, with all information from type extensions
/// folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedType {
    Scalar(Node<ScalarType>),
    Object(Node<ObjectType>),
    Interface(Node<InterfaceType>),
    Union(Node<UnionType>),
    Enum(Node<EnumType>),
    InputObject(Node<InputObjectType>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Directives,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub implements_interfaces: IndexSet<Name>,
    pub directives: Directives,
    /// Explicit field definitions.
    ///
    /// When looking up a definition, consider using [`Schema::type_field`]
    /// instead to include meta-fields.
    pub fields: IndexMap<Name, Node<FieldDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub name: Name,
    pub description: Option<String>,
    pub implements_interfaces: IndexSet<Name>,
    pub directives: Directives,
    pub fields: IndexMap<Name, Node<FieldDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Directives,
    /// Names of the member object types
    pub members: IndexSet<NamedType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Directives,
    pub values: IndexMap<Name, Node<EnumValueDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputObjectType {
    pub name: Name,
    pub description: Option<String>,
    pub directives: Directives,
    pub fields: IndexMap<Name, Node<InputValueDefinition>>,
}

/// Could not find the requested field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLookupError {
    NoSuchType,
    NoSuchField,
}

/// Input and result coercion hooks for a custom scalar.
///
/// Built-in scalars are coerced natively; custom scalars without a
/// registered coercer pass values through as-is.
pub trait ScalarCoercion: Send + Sync {
    /// Result coercion: turn an internal (resolver-produced) value into the
    /// value included in a response.
    fn serialize(&self, value: &JsonValue) -> Result<JsonValue, String>;

    /// Input coercion for values arriving through variables.
    fn parse_value(&self, value: &JsonValue) -> Result<JsonValue, String>;

    /// Input coercion for literal values in a document. `variables` carries
    /// the coerced variable values so embedded variable references can be
    /// substituted.
    fn parse_literal(&self, value: &Value, variables: &JsonMap) -> Result<JsonValue, String> {
        let json = crate::execution::literal_to_json(value, variables)?;
        self.parse_value(&json)
    }
}

/// Custom scalar coercers, keyed by scalar name.
#[derive(Clone, Default)]
pub struct ScalarRegistry {
    coercers: IndexMap<Name, Arc<dyn ScalarCoercion>>,
}

impl ScalarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: Name, coercion: impl ScalarCoercion + 'static) {
        self.coercers.insert(name, Arc::new(coercion));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ScalarCoercion>> {
        self.coercers.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.coercers.is_empty()
    }
}

impl fmt::Debug for ScalarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.coercers.keys().map(Name::as_str))
            .finish()
    }
}

impl Schema {
    /// Returns an (almost) empty schema.
    ///
    /// It starts with built-in directives, built-in scalars, and
    /// introspection types. It can then be filled programmatically.
    #[allow(clippy::new_without_default)] // not a great implicit default in generic contexts
    pub fn new() -> Self {
        SchemaBuilder::new()
            .build()
            .expect("the built-in type system document is valid")
    }

    /// Parse a single source file into a schema, with the default parser
    /// configuration.
    ///
    /// Use [`builder()`][Self::builder] to build a schema from multiple
    /// parsed files.
    pub fn parse(
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, SchemaError> {
        let mut builder = Self::builder();
        builder.parse(source_text, path)?;
        builder.build()
    }

    /// Parse and validate a single source file, ready for execution.
    pub fn parse_and_validate(
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Valid<Schema>, SchemaError> {
        Self::parse(source_text, path)?.validate()
    }

    /// Returns a new builder for creating a schema from AST documents,
    /// initialized with built-in directives, built-in scalars,
    /// and introspection types.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Run structural validation, witnessed by the [`Valid`] wrapper.
    pub fn validate(self) -> Result<Valid<Schema>, SchemaError> {
        let errors = validation::validate_schema(&self);
        if errors.is_empty() {
            Ok(Valid(self))
        } else {
            Err(SchemaError::Validation(errors))
        }
    }

    /// Returns the type with the given name, if it is a scalar type
    pub fn get_scalar(&self, name: &str) -> Option<&Node<ScalarType>> {
        if let Some(ExtendedType::Scalar(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is an object type
    pub fn get_object(&self, name: &str) -> Option<&Node<ObjectType>> {
        if let Some(ExtendedType::Object(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is an interface type
    pub fn get_interface(&self, name: &str) -> Option<&Node<InterfaceType>> {
        if let Some(ExtendedType::Interface(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is a union type
    pub fn get_union(&self, name: &str) -> Option<&Node<UnionType>> {
        if let Some(ExtendedType::Union(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is an enum type
    pub fn get_enum(&self, name: &str) -> Option<&Node<EnumType>> {
        if let Some(ExtendedType::Enum(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the type with the given name, if it is an input object type
    pub fn get_input_object(&self, name: &str) -> Option<&Node<InputObjectType>> {
        if let Some(ExtendedType::InputObject(ty)) = self.types.get(name) {
            Some(ty)
        } else {
            None
        }
    }

    /// Returns the name of the object type for the root operation with the
    /// given operation kind
    pub fn root_operation(&self, operation_type: ast::OperationType) -> Option<&NamedType> {
        match operation_type {
            ast::OperationType::Query => &self.query_type,
            ast::OperationType::Mutation => &self.mutation_type,
            ast::OperationType::Subscription => &self.subscription_type,
        }
        .as_ref()
    }

    /// Returns the definition of a type's explicit field or meta-field.
    pub fn type_field(
        &self,
        type_name: &str,
        field_name: &str,
    ) -> Result<&Node<FieldDefinition>, FieldLookupError> {
        let ty_def = self
            .types
            .get(type_name)
            .ok_or(FieldLookupError::NoSuchType)?;
        self.meta_fields_definitions(type_name)
            .iter()
            .find(|def| def.name == field_name)
            .or_else(|| match ty_def {
                ExtendedType::Object(ty) => ty.fields.get(field_name),
                ExtendedType::Interface(ty) => ty.fields.get(field_name),
                ExtendedType::Scalar(_)
                | ExtendedType::Union(_)
                | ExtendedType::Enum(_)
                | ExtendedType::InputObject(_) => None,
            })
            .ok_or(FieldLookupError::NoSuchField)
    }

    /// Returns a map of interface names to names of types that implement
    /// that interface.
    ///
    /// `Schema` only stores the inverse relationship (in
    /// [`ObjectType::implements_interfaces`] and
    /// [`InterfaceType::implements_interfaces`]), so iterating the
    /// implementers of an interface requires a linear scan of all types in
    /// the schema. If that is repeated for multiple interfaces, gathering
    /// them all at once amortizes that cost.
    pub fn implementers_map(&self) -> HashMap<Name, HashSet<Name>> {
        let mut map = HashMap::<Name, HashSet<Name>>::new();
        for (ty_name, ty) in &self.types {
            let interfaces = match ty {
                ExtendedType::Object(def) => &def.implements_interfaces,
                ExtendedType::Interface(def) => &def.implements_interfaces,
                ExtendedType::Scalar(_)
                | ExtendedType::Union(_)
                | ExtendedType::Enum(_)
                | ExtendedType::InputObject(_) => continue,
            };
            for interface in interfaces {
                map.entry(interface.clone())
                    .or_default()
                    .insert(ty_name.clone());
            }
        }
        map
    }

    /// Returns whether `maybe_subtype` is a subtype of `abstract_type`,
    /// which means either:
    ///
    /// * `maybe_subtype` implements the interface `abstract_type`
    /// * `maybe_subtype` is a member of the union type `abstract_type`
    pub fn is_subtype(&self, abstract_type: &str, maybe_subtype: &str) -> bool {
        self.types.get(abstract_type).is_some_and(|ty| match ty {
            ExtendedType::Interface(_) => self.types.get(maybe_subtype).is_some_and(|ty2| {
                match ty2 {
                    ExtendedType::Object(def) => &def.implements_interfaces,
                    ExtendedType::Interface(def) => &def.implements_interfaces,
                    ExtendedType::Scalar(_)
                    | ExtendedType::Union(_)
                    | ExtendedType::Enum(_)
                    | ExtendedType::InputObject(_) => return false,
                }
                .contains(abstract_type)
            }),
            ExtendedType::Union(def) => def.members.contains(maybe_subtype),
            ExtendedType::Scalar(_)
            | ExtendedType::Object(_)
            | ExtendedType::Enum(_)
            | ExtendedType::InputObject(_) => false,
        })
    }

    /// The names of the object types an abstract type may resolve to.
    pub fn possible_types(&self, abstract_type: &str) -> Vec<Name> {
        match self.types.get(abstract_type) {
            Some(ExtendedType::Union(def)) => def.members.iter().cloned().collect(),
            Some(ExtendedType::Interface(def)) => {
                let name = &def.name;
                self.types
                    .iter()
                    .filter_map(|(ty_name, ty)| match ty {
                        ExtendedType::Object(object)
                            if object.implements_interfaces.contains(name.as_str()) =>
                        {
                            Some(ty_name.clone())
                        }
                        _ => None,
                    })
                    .collect()
            }
            Some(ExtendedType::Object(def)) => vec![def.name.clone()],
            _ => Vec::new(),
        }
    }

    /// Return the meta-fields of the given type:
    /// `__typename` everywhere, plus `__schema` and `__type` on the query root.
    pub(crate) fn meta_fields_definitions(&self, type_name: &str) -> &'static [Node<FieldDefinition>] {
        static ROOT_QUERY_FIELDS: OnceLock<[Node<FieldDefinition>; 3]> = OnceLock::new();
        let fields = ROOT_QUERY_FIELDS.get_or_init(|| {
            [
                // __typename: String!
                Node::new(FieldDefinition {
                    description: None,
                    name: name!("__typename"),
                    arguments: Vec::new(),
                    ty: Type::new_named(name!("String")).non_null(),
                    directives: Directives::new(),
                }),
                // __schema: __Schema!
                Node::new(FieldDefinition {
                    description: None,
                    name: name!("__schema"),
                    arguments: Vec::new(),
                    ty: Type::new_named(name!("__Schema")).non_null(),
                    directives: Directives::new(),
                }),
                // __type(name: String!): __Type
                Node::new(FieldDefinition {
                    description: None,
                    name: name!("__type"),
                    arguments: vec![Node::new(InputValueDefinition {
                        description: None,
                        name: name!("name"),
                        ty: Type::new_named(name!("String")).non_null(),
                        default_value: None,
                        directives: Directives::new(),
                    })],
                    ty: Type::new_named(name!("__Type")),
                    directives: Directives::new(),
                }),
            ]
        });
        if self
            .query_type
            .as_ref()
            .is_some_and(|name| name == type_name)
        {
            fields
        } else {
            std::slice::from_ref(&fields[0])
        }
    }

    /// Returns whether the type `ty` is defined as an input type
    ///
    /// <https://spec.graphql.org/October2021/#sec-Input-and-Output-Types>
    pub fn is_input_type(&self, ty: &Type) -> bool {
        matches!(
            self.types.get(ty.inner_named_type()),
            Some(ExtendedType::Scalar(_) | ExtendedType::Enum(_) | ExtendedType::InputObject(_))
        )
    }

    /// Returns whether the type `ty` is defined as an output type
    ///
    /// <https://spec.graphql.org/October2021/#sec-Input-and-Output-Types>
    pub fn is_output_type(&self, ty: &Type) -> bool {
        matches!(
            self.types.get(ty.inner_named_type()),
            Some(
                ExtendedType::Scalar(_)
                    | ExtendedType::Object(_)
                    | ExtendedType::Interface(_)
                    | ExtendedType::Union(_)
                    | ExtendedType::Enum(_)
            )
        )
    }
}

impl Eq for Schema {}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        let Self {
            sources: _,
            scalars: _, // function objects are not comparable
            description,
            directive_definitions,
            types,
            query_type,
            mutation_type,
            subscription_type,
        } = self;
        *description == other.description
            && *directive_definitions == other.directive_definitions
            && *types == other.types
            && *query_type == other.query_type
            && *mutation_type == other.mutation_type
            && *subscription_type == other.subscription_type
    }
}

impl fmt::Display for Schema {
    /// Serializes the schema as SDL, excluding built-in definitions.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_ast().fmt(f)
    }
}

impl ExtendedType {
    pub fn name(&self) -> &Name {
        match self {
            Self::Scalar(ty) => &ty.name,
            Self::Object(ty) => &ty.name,
            Self::Interface(ty) => &ty.name,
            Self::Union(ty) => &ty.name,
            Self::Enum(ty) => &ty.name,
            Self::InputObject(ty) => &ty.name,
        }
    }

    /// The source location of the type's base definition.
    pub fn location(&self) -> Option<SourceSpan> {
        match self {
            Self::Scalar(ty) => ty.location(),
            Self::Object(ty) => ty.location(),
            Self::Interface(ty) => ty.location(),
            Self::Union(ty) => ty.location(),
            Self::Enum(ty) => ty.location(),
            Self::InputObject(ty) => ty.location(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, Self::Interface(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Self::Union(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    pub fn is_input_object(&self) -> bool {
        matches!(self, Self::InputObject(_))
    }

    /// Returns whether this type is a composite type, i.e. can appear as the
    /// parent of a selection set.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::Object(_) | Self::Interface(_) | Self::Union(_)
        )
    }

    /// Returns whether this is a leaf type in the response: an enum or scalar.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    /// This implements spec function `IsInputType(type)`
    pub fn is_input_type(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    /// This implements spec function `IsOutputType(type)`
    pub fn is_output_type(&self) -> bool {
        matches!(
            self,
            Self::Scalar(_) | Self::Enum(_) | Self::Object(_) | Self::Interface(_) | Self::Union(_)
        )
    }

    /// Returns whether this is a built-in scalar or introspection type
    pub fn is_built_in(&self) -> bool {
        match self {
            Self::Scalar(ty) => ty.is_built_in(),
            Self::Object(ty) => ty.is_built_in(),
            Self::Interface(ty) => ty.is_built_in(),
            Self::Union(ty) => ty.is_built_in(),
            Self::Enum(ty) => ty.is_built_in(),
            Self::InputObject(ty) => ty.is_built_in(),
        }
    }

    pub fn directives(&self) -> &Directives {
        match self {
            Self::Scalar(ty) => &ty.directives,
            Self::Object(ty) => &ty.directives,
            Self::Interface(ty) => &ty.directives,
            Self::Union(ty) => &ty.directives,
            Self::Enum(ty) => &ty.directives,
            Self::InputObject(ty) => &ty.directives,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(ty) => ty.description.as_deref(),
            Self::Object(ty) => ty.description.as_deref(),
            Self::Interface(ty) => ty.description.as_deref(),
            Self::Union(ty) => ty.description.as_deref(),
            Self::Enum(ty) => ty.description.as_deref(),
            Self::InputObject(ty) => ty.description.as_deref(),
        }
    }

    /// The kind of the type, as introspection's `__TypeKind` spells it.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "SCALAR",
            Self::Object(_) => "OBJECT",
            Self::Interface(_) => "INTERFACE",
            Self::Union(_) => "UNION",
            Self::Enum(_) => "ENUM",
            Self::InputObject(_) => "INPUT_OBJECT",
        }
    }
}

impl ScalarType {
    /// The value of the `@specifiedBy(url:)` directive, if any.
    pub fn specified_by_url(&self) -> Option<&str> {
        self.directives
            .get("specifiedBy")?
            .specified_argument_by_name("url")?
            .as_str()
    }

    /// Whether this is one of the five built-in scalars.
    pub fn is_built_in_scalar(&self) -> bool {
        matches!(
            self.name.as_str(),
            "Int" | "Float" | "String" | "Boolean" | "ID"
        )
    }
}

impl InputObjectType {
    /// Whether the `@oneOf` directive applies: exactly one field must be
    /// supplied, and it must not be null.
    pub fn is_one_of(&self) -> bool {
        self.directives.has("oneOf")
    }
}

impl From<Node<ScalarType>> for ExtendedType {
    fn from(ty: Node<ScalarType>) -> Self {
        Self::Scalar(ty)
    }
}

impl From<Node<ObjectType>> for ExtendedType {
    fn from(ty: Node<ObjectType>) -> Self {
        Self::Object(ty)
    }
}

impl From<Node<InterfaceType>> for ExtendedType {
    fn from(ty: Node<InterfaceType>) -> Self {
        Self::Interface(ty)
    }
}

impl From<Node<UnionType>> for ExtendedType {
    fn from(ty: Node<UnionType>) -> Self {
        Self::Union(ty)
    }
}

impl From<Node<EnumType>> for ExtendedType {
    fn from(ty: Node<EnumType>) -> Self {
        Self::Enum(ty)
    }
}

impl From<Node<InputObjectType>> for ExtendedType {
    fn from(ty: Node<InputObjectType>) -> Self {
        Self::InputObject(ty)
    }
}
