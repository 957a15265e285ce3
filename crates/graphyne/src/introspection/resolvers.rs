//! Resolver objects over the schema graph, backing the `__schema` and
//! `__type` meta-fields.

use crate::execution::JsonMap;
use crate::execution::JsonValue;
use crate::execution::ResolveError;
use crate::execution::ResolvedValue;
use crate::execution::Resolver;
use crate::schema::ExtendedType;
use crate::validation::Valid;
use crate::Schema;
use graphyne_parser::ast;
use graphyne_parser::Name;
use graphyne_parser::Node;
use std::sync::Arc;

type SharedSchema = Arc<Valid<Schema>>;

/// The resolved value of the `__schema` meta-field.
pub(crate) fn schema_resolver(schema: SharedSchema) -> ResolvedValue {
    ResolvedValue::object(SchemaIntrospection { schema })
}

/// The resolved value of the `__type(name:)` meta-field.
pub(crate) fn type_resolver(schema: SharedSchema, name: &str) -> ResolvedValue {
    match schema.types.get(name) {
        Some(_) => {
            let name = Name::new_unchecked(name);
            ResolvedValue::object(TypeIntrospection {
                schema,
                ty: TypeRef::Named(name),
            })
        }
        None => ResolvedValue::null(),
    }
}

/// A type reference as introspection sees it: list and non-null wrappers
/// unwrap through `ofType`.
#[derive(Clone)]
enum TypeRef {
    Named(Name),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    fn from_ast(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Named(name) => Self::Named(name.clone()),
            ast::Type::NonNullNamed(name) => {
                Self::NonNull(Box::new(Self::Named(name.clone())))
            }
            ast::Type::List(inner) => Self::List(Box::new(Self::from_ast(inner))),
            ast::Type::NonNullList(inner) => Self::NonNull(Box::new(Self::List(Box::new(
                Self::from_ast(inner),
            )))),
        }
    }
}

fn is_deprecated(directives: &ast::Directives) -> bool {
    directives.has("deprecated")
}

fn deprecation_reason(directives: &ast::Directives) -> ResolvedValue {
    match directives.get("deprecated") {
        Some(directive) => ResolvedValue::leaf(
            directive
                .specified_argument_by_name("reason")
                .and_then(|value| value.as_str())
                .unwrap_or("No longer supported"),
        ),
        None => ResolvedValue::null(),
    }
}

fn include_deprecated(arguments: &JsonMap) -> bool {
    arguments
        .get("includeDeprecated")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false)
}

fn opt_leaf(value: Option<&str>) -> ResolvedValue {
    match value {
        Some(value) => ResolvedValue::leaf(value),
        None => ResolvedValue::null(),
    }
}

struct SchemaIntrospection {
    schema: SharedSchema,
}

impl Resolver for SchemaIntrospection {
    fn type_name(&self) -> &str {
        "__Schema"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        let named = |name: &Name| TypeIntrospection {
            schema: self.schema.clone(),
            ty: TypeRef::Named(name.clone()),
        };
        Ok(match field_name {
            "description" => opt_leaf(self.schema.description.as_deref()),
            "types" => ResolvedValue::list(
                self.schema
                    .types
                    .keys()
                    .map(|name| ResolvedValue::object(named(name)))
                    .collect::<Vec<_>>(),
            ),
            "queryType" => ResolvedValue::opt_object(self.schema.query_type.as_ref().map(named)),
            "mutationType" => {
                ResolvedValue::opt_object(self.schema.mutation_type.as_ref().map(named))
            }
            "subscriptionType" => {
                ResolvedValue::opt_object(self.schema.subscription_type.as_ref().map(named))
            }
            "directives" => ResolvedValue::list(
                self.schema
                    .directive_definitions
                    .values()
                    .map(|definition| {
                        ResolvedValue::object(DirectiveIntrospection {
                            schema: self.schema.clone(),
                            definition: definition.clone(),
                        })
                    })
                    .collect::<Vec<_>>(),
            ),
            _ => return Err(ResolveError::unknown_field(field_name, self)),
        })
    }
}

struct TypeIntrospection {
    schema: SharedSchema,
    ty: TypeRef,
}

impl TypeIntrospection {
    fn definition(&self) -> Option<&ExtendedType> {
        match &self.ty {
            TypeRef::Named(name) => self.schema.types.get(name.as_str()),
            TypeRef::List(_) | TypeRef::NonNull(_) => None,
        }
    }

    fn of(&self, ty: TypeRef) -> TypeIntrospection {
        TypeIntrospection {
            schema: self.schema.clone(),
            ty,
        }
    }
}

impl Resolver for TypeIntrospection {
    fn type_name(&self) -> &str {
        "__Type"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        Ok(match field_name {
            "kind" => match &self.ty {
                TypeRef::List(_) => ResolvedValue::leaf("LIST"),
                TypeRef::NonNull(_) => ResolvedValue::leaf("NON_NULL"),
                TypeRef::Named(_) => match self.definition() {
                    Some(definition) => ResolvedValue::leaf(definition.kind()),
                    None => ResolvedValue::null(),
                },
            },
            "name" => match &self.ty {
                TypeRef::Named(name) => ResolvedValue::leaf(name.as_str()),
                TypeRef::List(_) | TypeRef::NonNull(_) => ResolvedValue::null(),
            },
            "description" => opt_leaf(self.definition().and_then(ExtendedType::description)),
            "specifiedByURL" => match self.definition() {
                Some(ExtendedType::Scalar(scalar)) => opt_leaf(scalar.specified_by_url()),
                _ => ResolvedValue::null(),
            },
            "ofType" => match &self.ty {
                TypeRef::List(inner) | TypeRef::NonNull(inner) => {
                    ResolvedValue::object(self.of((**inner).clone()))
                }
                TypeRef::Named(_) => ResolvedValue::null(),
            },
            "fields" => {
                let fields = match self.definition() {
                    Some(ExtendedType::Object(def)) => Some(&def.fields),
                    Some(ExtendedType::Interface(def)) => Some(&def.fields),
                    _ => None,
                };
                match fields {
                    Some(fields) => {
                        let include = include_deprecated(arguments);
                        ResolvedValue::list(
                            fields
                                .values()
                                .filter(|field| include || !is_deprecated(&field.directives))
                                .map(|field| {
                                    ResolvedValue::object(FieldIntrospection {
                                        schema: self.schema.clone(),
                                        definition: field.clone(),
                                    })
                                })
                                .collect::<Vec<_>>(),
                        )
                    }
                    None => ResolvedValue::null(),
                }
            }
            "interfaces" => match self.definition() {
                Some(ExtendedType::Object(def)) => ResolvedValue::list(
                    def.implements_interfaces
                        .iter()
                        .map(|name| ResolvedValue::object(self.of(TypeRef::Named(name.clone()))))
                        .collect::<Vec<_>>(),
                ),
                Some(ExtendedType::Interface(def)) => ResolvedValue::list(
                    def.implements_interfaces
                        .iter()
                        .map(|name| ResolvedValue::object(self.of(TypeRef::Named(name.clone()))))
                        .collect::<Vec<_>>(),
                ),
                _ => ResolvedValue::null(),
            },
            "possibleTypes" => match self.definition() {
                Some(ExtendedType::Interface(def)) => ResolvedValue::list(
                    self.schema
                        .possible_types(&def.name)
                        .into_iter()
                        .map(|name| ResolvedValue::object(self.of(TypeRef::Named(name))))
                        .collect::<Vec<_>>(),
                ),
                Some(ExtendedType::Union(def)) => ResolvedValue::list(
                    def.members
                        .iter()
                        .map(|name| ResolvedValue::object(self.of(TypeRef::Named(name.clone()))))
                        .collect::<Vec<_>>(),
                ),
                _ => ResolvedValue::null(),
            },
            "enumValues" => match self.definition() {
                Some(ExtendedType::Enum(def)) => {
                    let include = include_deprecated(arguments);
                    ResolvedValue::list(
                        def.values
                            .values()
                            .filter(|value| include || !is_deprecated(&value.directives))
                            .map(|value| {
                                ResolvedValue::object(EnumValueIntrospection {
                                    definition: value.clone(),
                                })
                            })
                            .collect::<Vec<_>>(),
                    )
                }
                _ => ResolvedValue::null(),
            },
            "inputFields" => match self.definition() {
                Some(ExtendedType::InputObject(def)) => {
                    let include = include_deprecated(arguments);
                    ResolvedValue::list(
                        def.fields
                            .values()
                            .filter(|field| include || !is_deprecated(&field.directives))
                            .map(|field| {
                                ResolvedValue::object(InputValueIntrospection {
                                    schema: self.schema.clone(),
                                    definition: field.clone(),
                                })
                            })
                            .collect::<Vec<_>>(),
                    )
                }
                _ => ResolvedValue::null(),
            },
            _ => return Err(ResolveError::unknown_field(field_name, self)),
        })
    }
}

struct FieldIntrospection {
    schema: SharedSchema,
    definition: Node<ast::FieldDefinition>,
}

impl Resolver for FieldIntrospection {
    fn type_name(&self) -> &str {
        "__Field"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        Ok(match field_name {
            "name" => ResolvedValue::leaf(self.definition.name.as_str()),
            "description" => opt_leaf(self.definition.description.as_deref()),
            "args" => {
                let include = include_deprecated(arguments);
                ResolvedValue::list(
                    self.definition
                        .arguments
                        .iter()
                        .filter(|argument| include || !is_deprecated(&argument.directives))
                        .map(|argument| {
                            ResolvedValue::object(InputValueIntrospection {
                                schema: self.schema.clone(),
                                definition: argument.clone(),
                            })
                        })
                        .collect::<Vec<_>>(),
                )
            }
            "type" => ResolvedValue::object(TypeIntrospection {
                schema: self.schema.clone(),
                ty: TypeRef::from_ast(&self.definition.ty),
            }),
            "isDeprecated" => ResolvedValue::leaf(is_deprecated(&self.definition.directives)),
            "deprecationReason" => deprecation_reason(&self.definition.directives),
            _ => return Err(ResolveError::unknown_field(field_name, self)),
        })
    }
}

struct InputValueIntrospection {
    schema: SharedSchema,
    definition: Node<ast::InputValueDefinition>,
}

impl Resolver for InputValueIntrospection {
    fn type_name(&self) -> &str {
        "__InputValue"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        Ok(match field_name {
            "name" => ResolvedValue::leaf(self.definition.name.as_str()),
            "description" => opt_leaf(self.definition.description.as_deref()),
            "type" => ResolvedValue::object(TypeIntrospection {
                schema: self.schema.clone(),
                ty: TypeRef::from_ast(&self.definition.ty),
            }),
            // A GraphQL-syntax representation of the default value
            "defaultValue" => match &self.definition.default_value {
                Some(default) => ResolvedValue::leaf(default.to_string()),
                None => ResolvedValue::null(),
            },
            "isDeprecated" => ResolvedValue::leaf(is_deprecated(&self.definition.directives)),
            "deprecationReason" => deprecation_reason(&self.definition.directives),
            _ => return Err(ResolveError::unknown_field(field_name, self)),
        })
    }
}

struct EnumValueIntrospection {
    definition: Node<ast::EnumValueDefinition>,
}

impl Resolver for EnumValueIntrospection {
    fn type_name(&self) -> &str {
        "__EnumValue"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        Ok(match field_name {
            "name" => ResolvedValue::leaf(self.definition.value.as_str()),
            "description" => opt_leaf(self.definition.description.as_deref()),
            "isDeprecated" => ResolvedValue::leaf(is_deprecated(&self.definition.directives)),
            "deprecationReason" => deprecation_reason(&self.definition.directives),
            _ => return Err(ResolveError::unknown_field(field_name, self)),
        })
    }
}

struct DirectiveIntrospection {
    schema: SharedSchema,
    definition: Node<ast::DirectiveDefinition>,
}

impl Resolver for DirectiveIntrospection {
    fn type_name(&self) -> &str {
        "__Directive"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        Ok(match field_name {
            "name" => ResolvedValue::leaf(self.definition.name.as_str()),
            "description" => opt_leaf(self.definition.description.as_deref()),
            "locations" => ResolvedValue::list(
                self.definition
                    .locations
                    .iter()
                    .map(|location| ResolvedValue::leaf(location.name()))
                    .collect::<Vec<_>>(),
            ),
            "args" => {
                let include = include_deprecated(arguments);
                ResolvedValue::list(
                    self.definition
                        .arguments
                        .iter()
                        .filter(|argument| include || !is_deprecated(&argument.directives))
                        .map(|argument| {
                            ResolvedValue::object(InputValueIntrospection {
                                schema: self.schema.clone(),
                                definition: argument.clone(),
                            })
                        })
                        .collect::<Vec<_>>(),
                )
            }
            "isRepeatable" => ResolvedValue::leaf(self.definition.repeatable),
            _ => return Err(ResolveError::unknown_field(field_name, self)),
        })
    }
}
