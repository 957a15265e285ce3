//! A GraphQL type system, query validator, and executor with incremental
//! delivery (`@defer` / `@stream`).
//!
//! The pipeline:
//!
//! * [`parse`] source text into a typed AST (re-exported from
//!   [`graphyne_parser`]).
//! * Build a [`Schema`] from SDL ([`Schema::parse_and_validate`]) or
//!   programmatically ([`SchemaBuilder`][schema::SchemaBuilder]).
//! * [`validate`] executable documents against the schema.
//! * [`execute`] operations against [`Resolver`] values — synchronous or
//!   asynchronous, with serial mutations, parallel query fields, and
//!   incremental delivery of deferred fragments and streamed list items.
//! * [`subscribe`] to subscription operations as a stream of responses.
//!
//! ```
//! use graphyne::JsonResolver;
//! use graphyne::Request;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(
//!     graphyne::Schema::parse_and_validate("type Query { hello: String }", "schema.graphql")
//!         .unwrap(),
//! );
//! let document = Arc::new(
//!     graphyne::ExecutableDocument::parse_and_validate(&schema, "{ hello }", "query.graphql")
//!         .unwrap(),
//! );
//! let root = serde_json::json!({ "hello": "world" });
//! let root = Arc::new(JsonResolver::new("Query", root.as_object().unwrap().clone()));
//! let response = graphyne::execute_sync(Request::new(schema, document, root));
//! assert_eq!(
//!     serde_json::to_value(&response).unwrap(),
//!     serde_json::json!({ "data": { "hello": "world" } }),
//! );
//! ```

pub mod diagnostic;
mod executable;
pub mod execution;
pub mod introspection;
pub mod schema;
pub mod validation;

pub use graphyne_parser::ast;
pub use graphyne_parser::name;
pub use graphyne_parser::parse;
pub use graphyne_parser::parse_const_value;
pub use graphyne_parser::parse_type;
pub use graphyne_parser::parse_value;
pub use graphyne_parser::print_ast;
pub use graphyne_parser::visitor;
pub use graphyne_parser::FileId;
pub use graphyne_parser::LineColumn;
pub use graphyne_parser::Name;
pub use graphyne_parser::Node;
pub use graphyne_parser::Parser;
pub use graphyne_parser::SourceFile;
pub use graphyne_parser::SourceSpan;
pub use graphyne_parser::SyntaxError;

pub use crate::executable::DocumentError;
pub use crate::executable::ExecutableDocument;
pub use crate::execution::execute;
pub use crate::execution::execute_sync;
pub use crate::execution::subscribe;
pub use crate::execution::ExecuteResult;
pub use crate::execution::GraphQLError;
pub use crate::execution::IncrementalPayload;
pub use crate::execution::IncrementalResponse;
pub use crate::execution::InitialResponse;
pub use crate::execution::JsonMap;
pub use crate::execution::JsonResolver;
pub use crate::execution::JsonValue;
pub use crate::execution::Request;
pub use crate::execution::RequestError;
pub use crate::execution::ResolveError;
pub use crate::execution::ResolvedValue;
pub use crate::execution::Resolver;
pub use crate::execution::Response;
pub use crate::execution::ResponseData;
pub use crate::execution::ResponseStream;
pub use crate::execution::SourceEventStream;
pub use crate::execution::SubsequentPayloads;
pub use crate::execution::SubsequentResponse;
pub use crate::introspection::build_client_schema;
pub use crate::introspection::get_introspection_query;
pub use crate::introspection::introspection_from_schema;
pub use crate::introspection::IntrospectionQueryOptions;
pub use crate::schema::Schema;
pub use crate::validation::specified_rules;
pub use crate::validation::validate;
pub use crate::validation::validate_with_rules;
pub use crate::validation::Valid;

use indexmap::IndexMap;
use std::sync::Arc;

/// The inputs behind a schema or document, indexed by [`FileId`] so error
/// reports can recover text and positions from spans.
pub type SourceMap = Arc<IndexMap<FileId, Arc<SourceFile>>>;

/// Parsing, building, or validating a schema failed; the schema is unusable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("schema building failed with {} errors", .0.len())]
    Build(Vec<schema::BuildError>),

    #[error("schema validation failed with {} errors", .0.len())]
    Validation(Vec<GraphQLError>),

    #[error("invalid introspection response: {0}")]
    Introspection(String),
}

/// Build a schema from SDL source text, without validating it.
///
/// See [`Schema::parse_and_validate`] for the one-call path to an
/// executable schema.
pub fn build_schema(
    source_text: impl Into<String>,
    path: impl AsRef<std::path::Path>,
) -> Result<Schema, SchemaError> {
    Schema::parse(source_text, path)
}

/// Validate the structure of a schema, returning all errors found.
pub fn validate_schema(schema: &Schema) -> Vec<GraphQLError> {
    schema::validation::validate_schema(schema)
}

/// Serialize a schema as SDL, excluding built-in definitions.
pub fn print_schema(schema: &Schema) -> String {
    schema.to_string()
}
