//! Executable documents: operations and fragments indexed for execution.

use crate::execution::RequestError;
use crate::validation::Valid;
use crate::Schema;
use crate::SourceMap;
use graphyne_parser::ast;
use graphyne_parser::Name;
use graphyne_parser::Node;
use graphyne_parser::SyntaxError;
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

/// The executable definitions of a document, indexed for execution.
///
/// Selections reuse the AST nodes directly; the document does not need to be
/// valid to be built, validity is witnessed separately by [`Valid`].
#[derive(Debug, Clone, Default)]
pub struct ExecutableDocument {
    /// Source files, if any, that were parsed to contribute to this document.
    pub sources: SourceMap,

    pub named_operations: IndexMap<Name, Node<ast::OperationDefinition>>,

    pub anonymous_operation: Option<Node<ast::OperationDefinition>>,

    pub fragments: IndexMap<Name, Node<ast::FragmentDefinition>>,
}

impl ExecutableDocument {
    /// Parse the given source text into an executable document,
    /// without validating it against a schema.
    pub fn parse(
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, SyntaxError> {
        Ok(Self::from_ast(&graphyne_parser::parse(source_text, path)?))
    }

    /// Parse and validate the given source text, ready for execution
    /// against the given schema.
    pub fn parse_and_validate(
        schema: &Valid<Schema>,
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Valid<Self>, DocumentError> {
        let document = graphyne_parser::parse(source_text, path)?;
        let errors = crate::validation::validate(schema, &document);
        if errors.is_empty() {
            Ok(Valid(Self::from_ast(&document)))
        } else {
            Err(DocumentError::Validation(errors))
        }
    }

    /// Index the executable definitions of an AST document.
    ///
    /// Type system definitions are ignored here; validation rejects them.
    /// For duplicate names (also a validation error), the first definition
    /// wins.
    pub fn from_ast(document: &ast::Document) -> Self {
        let mut executable = Self::default();
        if let Some((file_id, source)) = &document.source {
            Arc::make_mut(&mut executable.sources).insert(*file_id, source.clone());
        }
        for definition in &document.definitions {
            match definition {
                ast::Definition::OperationDefinition(operation) => match &operation.name {
                    Some(name) => {
                        executable
                            .named_operations
                            .entry(name.clone())
                            .or_insert_with(|| operation.clone());
                    }
                    None => {
                        if executable.anonymous_operation.is_none() {
                            executable.anonymous_operation = Some(operation.clone());
                        }
                    }
                },
                ast::Definition::FragmentDefinition(fragment) => {
                    executable
                        .fragments
                        .entry(fragment.name.clone())
                        .or_insert_with(|| fragment.clone());
                }
                _ => {}
            }
        }
        executable
    }

    /// Select the operation to execute.
    ///
    /// With a name, that named operation must exist. Without one, the
    /// document must contain exactly one operation.
    pub fn get_operation(
        &self,
        name: Option<&str>,
    ) -> Result<&Node<ast::OperationDefinition>, RequestError> {
        match name {
            Some(name) => self.named_operations.get(name).ok_or_else(|| {
                RequestError::new(format!("unknown operation named \"{name}\""))
            }),
            None => {
                let mut operations = self
                    .anonymous_operation
                    .iter()
                    .chain(self.named_operations.values());
                match (operations.next(), operations.next()) {
                    (Some(operation), None) => Ok(operation),
                    (None, _) => Err(RequestError::new("the document contains no operations")),
                    (Some(_), Some(_)) => Err(RequestError::new(
                        "the operation name is required when the document \
                         contains multiple operations",
                    )),
                }
            }
        }
    }

    /// Iterate all operations, the anonymous one first.
    pub fn operations(&self) -> impl Iterator<Item = &Node<ast::OperationDefinition>> {
        self.anonymous_operation
            .iter()
            .chain(self.named_operations.values())
    }
}

/// Parsing or validating an executable document failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("the document failed validation with {} errors", .0.len())]
    Validation(Vec<crate::execution::GraphQLError>),
}
