//! Folding AST documents (definitions and extensions) into a [`Schema`].

use super::EnumType;
use super::ExtendedType;
use super::InputObjectType;
use super::InterfaceType;
use super::ObjectType;
use super::ScalarRegistry;
use super::ScalarType;
use super::Schema;
use super::UnionType;
use crate::SchemaError;
use graphyne_parser::ast;
use graphyne_parser::Name;
use graphyne_parser::Node;
use graphyne_parser::SourceSpan;
use indexmap::IndexMap;
use indexmap::IndexSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::OnceLock;

/// An AST definition that could not be folded into the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("an executable definition is not allowed in a schema document")]
    ExecutableDefinition { location: Option<SourceSpan> },

    #[error("there can be only one `schema` definition")]
    SchemaDefinitionCollision { location: Option<SourceSpan> },

    #[error("the type `{name}` is defined multiple times in the schema")]
    TypeCollision {
        name: Name,
        location: Option<SourceSpan>,
    },

    #[error("the directive `@{name}` is defined multiple times in the schema")]
    DirectiveCollision {
        name: Name,
        location: Option<SourceSpan>,
    },

    #[error("duplicate `{operation_type}` root operation definition")]
    DuplicateRootOperation {
        operation_type: ast::OperationType,
        location: Option<SourceSpan>,
    },

    #[error("type `{name}` cannot be extended because it is not defined")]
    OrphanExtension {
        name: Name,
        location: Option<SourceSpan>,
    },

    #[error("the `{name}` extension does not match the kind of the `{name}` definition")]
    ExtensionKindMismatch {
        name: Name,
        location: Option<SourceSpan>,
    },

    #[error("duplicate definitions for the `{name}` field of `{type_name}`")]
    FieldCollision {
        type_name: Name,
        name: Name,
        location: Option<SourceSpan>,
    },

    #[error("duplicate definitions for the `{name}` value of enum `{enum_name}`")]
    EnumValueCollision {
        enum_name: Name,
        name: Name,
        location: Option<SourceSpan>,
    },

    #[error("duplicate member `{name}` of union `{union_name}`")]
    UnionMemberCollision {
        union_name: Name,
        name: Name,
        location: Option<SourceSpan>,
    },

    #[error("`{type_name}` declares that it implements `{name}` multiple times")]
    DuplicateImplementsInterface {
        type_name: Name,
        name: Name,
        location: Option<SourceSpan>,
    },
}

impl BuildError {
    pub fn location(&self) -> Option<SourceSpan> {
        match self {
            Self::ExecutableDefinition { location }
            | Self::SchemaDefinitionCollision { location }
            | Self::TypeCollision { location, .. }
            | Self::DirectiveCollision { location, .. }
            | Self::DuplicateRootOperation { location, .. }
            | Self::OrphanExtension { location, .. }
            | Self::ExtensionKindMismatch { location, .. }
            | Self::FieldCollision { location, .. }
            | Self::EnumValueCollision { location, .. }
            | Self::UnionMemberCollision { location, .. }
            | Self::DuplicateImplementsInterface { location, .. } => *location,
        }
    }
}

/// Builds a [`Schema`] from AST documents, initialized with built-in
/// directives, built-in scalars, and introspection types.
///
/// Definitions are folded in as documents are added; extensions are applied
/// by [`build`][Self::build], so they may precede the definition they extend.
pub struct SchemaBuilder {
    schema: Schema,
    has_schema_definition: bool,
    extensions: Vec<ast::Definition>,
    errors: Vec<BuildError>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The names a schema document may redefine: doing so replaces the built-in
/// definition instead of colliding with it.
fn is_replaceable_built_in(name: &str) -> bool {
    matches!(
        name,
        "Int"
            | "Float"
            | "String"
            | "Boolean"
            | "ID"
            | "skip"
            | "include"
            | "deprecated"
            | "specifiedBy"
            | "defer"
            | "stream"
            | "oneOf"
    )
}

fn built_in_document() -> &'static ast::Document {
    static DOCUMENT: OnceLock<ast::Document> = OnceLock::new();
    DOCUMENT.get_or_init(|| {
        let text = include_str!("built_in.graphql");
        graphyne_parser::Parser::new()
            .parse_with_file_id(text, "built_in.graphql", graphyne_parser::FileId::BUILT_IN)
            .expect("the built-in type system document is valid")
    })
}

impl SchemaBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            schema: Schema {
                sources: Arc::new(IndexMap::new()),
                description: None,
                directive_definitions: IndexMap::new(),
                types: IndexMap::new(),
                query_type: None,
                mutation_type: None,
                subscription_type: None,
                scalars: ScalarRegistry::new(),
            },
            has_schema_definition: false,
            extensions: Vec::new(),
            errors: Vec::new(),
        };
        builder.add_document(built_in_document());
        debug_assert!(builder.errors.is_empty());
        builder
    }

    /// Parse one more source file into this schema.
    /// A syntax error aborts immediately; build errors surface in `build`.
    pub fn parse(
        &mut self,
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), SchemaError> {
        let document =
            graphyne_parser::parse(source_text, path).map_err(SchemaError::Syntax)?;
        self.add_document(&document);
        Ok(())
    }

    /// Fold the definitions of an already parsed document into the schema.
    pub fn add_document(&mut self, document: &ast::Document) {
        if let Some((file_id, source)) = &document.source {
            Arc::make_mut(&mut self.schema.sources).insert(*file_id, source.clone());
        }
        for definition in &document.definitions {
            match definition {
                ast::Definition::OperationDefinition(_)
                | ast::Definition::FragmentDefinition(_) => {
                    self.errors.push(BuildError::ExecutableDefinition {
                        location: definition.location(),
                    });
                }
                ast::Definition::SchemaDefinition(def) => self.add_schema_definition(def),
                ast::Definition::DirectiveDefinition(def) => {
                    let collides = self
                        .schema
                        .directive_definitions
                        .contains_key(def.name.as_str());
                    if collides && !is_replaceable_built_in(&def.name) {
                        self.errors.push(BuildError::DirectiveCollision {
                            name: def.name.clone(),
                            location: def.location(),
                        });
                    } else {
                        self.schema
                            .directive_definitions
                            .insert(def.name.clone(), def.clone());
                    }
                }
                ast::Definition::ScalarTypeDefinition(def) => {
                    let ty = ExtendedType::Scalar(def.rewrap(ScalarType {
                        name: def.name.clone(),
                        description: def.description.clone(),
                        directives: def.directives.clone(),
                    }));
                    self.add_type(def.name.clone(), ty, def.location());
                }
                ast::Definition::ObjectTypeDefinition(def) => {
                    let object = ObjectType {
                        name: def.name.clone(),
                        description: def.description.clone(),
                        implements_interfaces: self
                            .implements_set(&def.name, &def.implements_interfaces),
                        directives: def.directives.clone(),
                        fields: self.field_map(&def.name, &def.fields),
                    };
                    let ty = ExtendedType::Object(def.rewrap(object));
                    self.add_type(def.name.clone(), ty, def.location());
                }
                ast::Definition::InterfaceTypeDefinition(def) => {
                    let interface = InterfaceType {
                        name: def.name.clone(),
                        description: def.description.clone(),
                        implements_interfaces: self
                            .implements_set(&def.name, &def.implements_interfaces),
                        directives: def.directives.clone(),
                        fields: self.field_map(&def.name, &def.fields),
                    };
                    let ty = ExtendedType::Interface(def.rewrap(interface));
                    self.add_type(def.name.clone(), ty, def.location());
                }
                ast::Definition::UnionTypeDefinition(def) => {
                    let union_ = UnionType {
                        name: def.name.clone(),
                        description: def.description.clone(),
                        directives: def.directives.clone(),
                        members: self.member_set(&def.name, &def.members, def.location()),
                    };
                    let ty = ExtendedType::Union(def.rewrap(union_));
                    self.add_type(def.name.clone(), ty, def.location());
                }
                ast::Definition::EnumTypeDefinition(def) => {
                    let enum_ = EnumType {
                        name: def.name.clone(),
                        description: def.description.clone(),
                        directives: def.directives.clone(),
                        values: self.enum_value_map(&def.name, &def.values),
                    };
                    let ty = ExtendedType::Enum(def.rewrap(enum_));
                    self.add_type(def.name.clone(), ty, def.location());
                }
                ast::Definition::InputObjectTypeDefinition(def) => {
                    let input = InputObjectType {
                        name: def.name.clone(),
                        description: def.description.clone(),
                        directives: def.directives.clone(),
                        fields: self.input_field_map(&def.name, &def.fields),
                    };
                    let ty = ExtendedType::InputObject(def.rewrap(input));
                    self.add_type(def.name.clone(), ty, def.location());
                }
                extension => self.extensions.push(extension.clone()),
            }
        }
    }

    /// Apply queued extensions and finish the schema.
    pub fn build(mut self) -> Result<Schema, SchemaError> {
        let extensions = std::mem::take(&mut self.extensions);
        for extension in &extensions {
            self.apply_extension(extension);
        }
        // Without an explicit `schema` definition, root operation types are
        // picked up by their conventional names
        if !self.has_schema_definition {
            for operation_type in [
                ast::OperationType::Query,
                ast::OperationType::Mutation,
                ast::OperationType::Subscription,
            ] {
                let name = operation_type.default_type_name();
                if self.schema.root_operation(operation_type).is_none()
                    && self.schema.get_object(&name).is_some()
                {
                    self.set_root_operation(operation_type, name, None);
                }
            }
        }
        if self.errors.is_empty() {
            Ok(self.schema)
        } else {
            Err(SchemaError::Build(self.errors))
        }
    }

    fn add_schema_definition(&mut self, def: &Node<ast::SchemaDefinition>) {
        if self.has_schema_definition {
            self.errors.push(BuildError::SchemaDefinitionCollision {
                location: def.location(),
            });
            return;
        }
        self.has_schema_definition = true;
        self.schema.description = def.description.clone();
        for root in &def.root_operations {
            let (operation_type, object_type) = &**root;
            self.set_root_operation(*operation_type, object_type.clone(), root.location());
        }
    }

    fn set_root_operation(
        &mut self,
        operation_type: ast::OperationType,
        object_type: Name,
        location: Option<SourceSpan>,
    ) {
        let slot = match operation_type {
            ast::OperationType::Query => &mut self.schema.query_type,
            ast::OperationType::Mutation => &mut self.schema.mutation_type,
            ast::OperationType::Subscription => &mut self.schema.subscription_type,
        };
        if slot.is_some() {
            self.errors.push(BuildError::DuplicateRootOperation {
                operation_type,
                location,
            });
        } else {
            *slot = Some(object_type);
        }
    }

    fn add_type(&mut self, name: Name, ty: ExtendedType, location: Option<SourceSpan>) {
        let collides = self.schema.types.contains_key(name.as_str());
        if collides && !is_replaceable_built_in(&name) {
            self.errors.push(BuildError::TypeCollision { name, location });
        } else {
            self.schema.types.insert(name, ty);
        }
    }

    fn implements_set(&mut self, type_name: &Name, interfaces: &[Name]) -> IndexSet<Name> {
        let mut set = IndexSet::new();
        for interface in interfaces {
            if !set.insert(interface.clone()) {
                self.errors.push(BuildError::DuplicateImplementsInterface {
                    type_name: type_name.clone(),
                    name: interface.clone(),
                    location: interface.location(),
                });
            }
        }
        set
    }

    fn member_set(
        &mut self,
        union_name: &Name,
        members: &[Name],
        location: Option<SourceSpan>,
    ) -> IndexSet<Name> {
        let mut set = IndexSet::new();
        for member in members {
            if !set.insert(member.clone()) {
                self.errors.push(BuildError::UnionMemberCollision {
                    union_name: union_name.clone(),
                    name: member.clone(),
                    location: member.location().or(location),
                });
            }
        }
        set
    }

    fn field_map(
        &mut self,
        type_name: &Name,
        fields: &[Node<ast::FieldDefinition>],
    ) -> IndexMap<Name, Node<ast::FieldDefinition>> {
        let mut map = IndexMap::with_capacity(fields.len());
        for field in fields {
            if map.insert(field.name.clone(), field.clone()).is_some() {
                self.errors.push(BuildError::FieldCollision {
                    type_name: type_name.clone(),
                    name: field.name.clone(),
                    location: field.location(),
                });
            }
        }
        map
    }

    fn input_field_map(
        &mut self,
        type_name: &Name,
        fields: &[Node<ast::InputValueDefinition>],
    ) -> IndexMap<Name, Node<ast::InputValueDefinition>> {
        let mut map = IndexMap::with_capacity(fields.len());
        for field in fields {
            if map.insert(field.name.clone(), field.clone()).is_some() {
                self.errors.push(BuildError::FieldCollision {
                    type_name: type_name.clone(),
                    name: field.name.clone(),
                    location: field.location(),
                });
            }
        }
        map
    }

    fn enum_value_map(
        &mut self,
        enum_name: &Name,
        values: &[Node<ast::EnumValueDefinition>],
    ) -> IndexMap<Name, Node<ast::EnumValueDefinition>> {
        let mut map = IndexMap::with_capacity(values.len());
        for value in values {
            if map.insert(value.value.clone(), value.clone()).is_some() {
                self.errors.push(BuildError::EnumValueCollision {
                    enum_name: enum_name.clone(),
                    name: value.value.clone(),
                    location: value.location(),
                });
            }
        }
        map
    }

    fn apply_extension(&mut self, extension: &ast::Definition) {
        match extension {
            ast::Definition::SchemaExtension(ext) => {
                for root in &ext.root_operations {
                    let (operation_type, object_type) = &**root;
                    self.set_root_operation(*operation_type, object_type.clone(), root.location());
                }
            }
            ast::Definition::ScalarTypeExtension(ext) => {
                match self.schema.types.get_mut(ext.name.as_str()) {
                    Some(ExtendedType::Scalar(ty)) => {
                        ty.make_mut().directives.extend(ext.directives.0.iter().cloned());
                    }
                    Some(_) => self.errors.push(BuildError::ExtensionKindMismatch {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                    None => self.errors.push(BuildError::OrphanExtension {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                }
            }
            ast::Definition::ObjectTypeExtension(ext) => {
                let implements = self.implements_set(&ext.name, &ext.implements_interfaces);
                let fields = self.field_map(&ext.name, &ext.fields);
                match self.schema.types.get_mut(ext.name.as_str()) {
                    Some(ExtendedType::Object(ty)) => {
                        let ty = ty.make_mut();
                        ty.directives.extend(ext.directives.0.iter().cloned());
                        Self::merge_interfaces(
                            &mut self.errors,
                            &ext.name,
                            &mut ty.implements_interfaces,
                            implements,
                        );
                        Self::merge_fields(&mut self.errors, &ext.name, &mut ty.fields, fields);
                    }
                    Some(_) => self.errors.push(BuildError::ExtensionKindMismatch {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                    None => self.errors.push(BuildError::OrphanExtension {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                }
            }
            ast::Definition::InterfaceTypeExtension(ext) => {
                let implements = self.implements_set(&ext.name, &ext.implements_interfaces);
                let fields = self.field_map(&ext.name, &ext.fields);
                match self.schema.types.get_mut(ext.name.as_str()) {
                    Some(ExtendedType::Interface(ty)) => {
                        let ty = ty.make_mut();
                        ty.directives.extend(ext.directives.0.iter().cloned());
                        Self::merge_interfaces(
                            &mut self.errors,
                            &ext.name,
                            &mut ty.implements_interfaces,
                            implements,
                        );
                        Self::merge_fields(&mut self.errors, &ext.name, &mut ty.fields, fields);
                    }
                    Some(_) => self.errors.push(BuildError::ExtensionKindMismatch {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                    None => self.errors.push(BuildError::OrphanExtension {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                }
            }
            ast::Definition::UnionTypeExtension(ext) => {
                let members = self.member_set(&ext.name, &ext.members, ext.location());
                match self.schema.types.get_mut(ext.name.as_str()) {
                    Some(ExtendedType::Union(ty)) => {
                        let ty = ty.make_mut();
                        ty.directives.extend(ext.directives.0.iter().cloned());
                        for member in members {
                            if !ty.members.insert(member.clone()) {
                                self.errors.push(BuildError::UnionMemberCollision {
                                    union_name: ext.name.clone(),
                                    name: member,
                                    location: ext.location(),
                                });
                            }
                        }
                    }
                    Some(_) => self.errors.push(BuildError::ExtensionKindMismatch {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                    None => self.errors.push(BuildError::OrphanExtension {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                }
            }
            ast::Definition::EnumTypeExtension(ext) => {
                let values = self.enum_value_map(&ext.name, &ext.values);
                match self.schema.types.get_mut(ext.name.as_str()) {
                    Some(ExtendedType::Enum(ty)) => {
                        let ty = ty.make_mut();
                        ty.directives.extend(ext.directives.0.iter().cloned());
                        for (name, value) in values {
                            if ty.values.insert(name.clone(), value).is_some() {
                                self.errors.push(BuildError::EnumValueCollision {
                                    enum_name: ext.name.clone(),
                                    name,
                                    location: ext.location(),
                                });
                            }
                        }
                    }
                    Some(_) => self.errors.push(BuildError::ExtensionKindMismatch {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                    None => self.errors.push(BuildError::OrphanExtension {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                }
            }
            ast::Definition::InputObjectTypeExtension(ext) => {
                let fields = self.input_field_map(&ext.name, &ext.fields);
                match self.schema.types.get_mut(ext.name.as_str()) {
                    Some(ExtendedType::InputObject(ty)) => {
                        let ty = ty.make_mut();
                        ty.directives.extend(ext.directives.0.iter().cloned());
                        for (name, field) in fields {
                            if ty.fields.insert(name.clone(), field).is_some() {
                                self.errors.push(BuildError::FieldCollision {
                                    type_name: ext.name.clone(),
                                    name,
                                    location: ext.location(),
                                });
                            }
                        }
                    }
                    Some(_) => self.errors.push(BuildError::ExtensionKindMismatch {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                    None => self.errors.push(BuildError::OrphanExtension {
                        name: ext.name.clone(),
                        location: ext.location(),
                    }),
                }
            }
            _ => {}
        }
    }

    fn merge_interfaces(
        errors: &mut Vec<BuildError>,
        type_name: &Name,
        existing: &mut IndexSet<Name>,
        additional: IndexSet<Name>,
    ) {
        for interface in additional {
            if !existing.insert(interface.clone()) {
                errors.push(BuildError::DuplicateImplementsInterface {
                    type_name: type_name.clone(),
                    name: interface.clone(),
                    location: interface.location(),
                });
            }
        }
    }

    fn merge_fields(
        errors: &mut Vec<BuildError>,
        type_name: &Name,
        existing: &mut IndexMap<Name, Node<ast::FieldDefinition>>,
        additional: IndexMap<Name, Node<ast::FieldDefinition>>,
    ) {
        for (name, field) in additional {
            let location = field.location();
            if existing.insert(name.clone(), field).is_some() {
                errors.push(BuildError::FieldCollision {
                    type_name: type_name.clone(),
                    name,
                    location,
                });
            }
        }
    }
}
