//! Conversion back to AST documents, which is how a schema serializes to SDL.

use super::ExtendedType;
use super::Schema;
use graphyne_parser::ast;
use graphyne_parser::Node;

impl Schema {
    /// Convert the schema into an AST document, excluding built-in
    /// definitions. Extensions applied during building stay folded in.
    pub fn to_ast(&self) -> ast::Document {
        let mut definitions = Vec::new();
        if let Some(definition) = self.schema_definition_ast() {
            definitions.push(ast::Definition::SchemaDefinition(Node::new(definition)));
        }
        for definition in self.directive_definitions.values() {
            if !definition.is_built_in() {
                definitions.push(ast::Definition::DirectiveDefinition(definition.clone()));
            }
        }
        for ty in self.types.values() {
            if ty.is_built_in() {
                continue;
            }
            definitions.push(match ty {
                ExtendedType::Scalar(def) => ast::Definition::ScalarTypeDefinition(Node::new(
                    ast::ScalarTypeDefinition {
                        description: def.description.clone(),
                        name: def.name.clone(),
                        directives: def.directives.clone(),
                    },
                )),
                ExtendedType::Object(def) => ast::Definition::ObjectTypeDefinition(Node::new(
                    ast::ObjectTypeDefinition {
                        description: def.description.clone(),
                        name: def.name.clone(),
                        implements_interfaces: def.implements_interfaces.iter().cloned().collect(),
                        directives: def.directives.clone(),
                        fields: def.fields.values().cloned().collect(),
                    },
                )),
                ExtendedType::Interface(def) => ast::Definition::InterfaceTypeDefinition(
                    Node::new(ast::InterfaceTypeDefinition {
                        description: def.description.clone(),
                        name: def.name.clone(),
                        implements_interfaces: def.implements_interfaces.iter().cloned().collect(),
                        directives: def.directives.clone(),
                        fields: def.fields.values().cloned().collect(),
                    }),
                ),
                ExtendedType::Union(def) => ast::Definition::UnionTypeDefinition(Node::new(
                    ast::UnionTypeDefinition {
                        description: def.description.clone(),
                        name: def.name.clone(),
                        directives: def.directives.clone(),
                        members: def.members.iter().cloned().collect(),
                    },
                )),
                ExtendedType::Enum(def) => {
                    ast::Definition::EnumTypeDefinition(Node::new(ast::EnumTypeDefinition {
                        description: def.description.clone(),
                        name: def.name.clone(),
                        directives: def.directives.clone(),
                        values: def.values.values().cloned().collect(),
                    }))
                }
                ExtendedType::InputObject(def) => ast::Definition::InputObjectTypeDefinition(
                    Node::new(ast::InputObjectTypeDefinition {
                        description: def.description.clone(),
                        name: def.name.clone(),
                        directives: def.directives.clone(),
                        fields: def.fields.values().cloned().collect(),
                    }),
                ),
            });
        }
        ast::Document {
            source: None,
            definitions,
        }
    }

    /// The explicit `schema { … }` definition, or `None` when the
    /// conventional root type names make it redundant.
    fn schema_definition_ast(&self) -> Option<ast::SchemaDefinition> {
        let mut root_operations = Vec::new();
        let mut uses_conventional_names = true;
        for (operation_type, root) in [
            (ast::OperationType::Query, &self.query_type),
            (ast::OperationType::Mutation, &self.mutation_type),
            (ast::OperationType::Subscription, &self.subscription_type),
        ] {
            if let Some(root) = root {
                uses_conventional_names &= *root == *operation_type.default_type_name();
                root_operations.push(Node::new((operation_type, root.clone())));
            }
        }
        if root_operations.is_empty()
            || (uses_conventional_names && self.description.is_none())
        {
            return None;
        }
        Some(ast::SchemaDefinition {
            description: self.description.clone(),
            directives: ast::Directives::new(),
            root_operations,
        })
    }
}
