//! Spec-compliant GraphQL lexer and parser producing a typed AST.
//!
//! * The [`lexer`] turns source text into tokens with precise byte spans.
//! * The [`Parser`] builds the typed [`ast`], supporting both the executable
//!   and the type system grammars of the October 2021 GraphQL specification.
//! * The [`visitor`] walks and edits documents.
//! * Every AST node serializes back to GraphQL syntax via `Display`,
//!   see [`print_ast`].
//!
//! ```
//! let document = graphyne_parser::parse("{ hero { name } }", "query.graphql").unwrap();
//! let printed = graphyne_parser::print_ast(&document);
//! assert_eq!(
//!     graphyne_parser::parse(printed, "printed.graphql").unwrap(),
//!     document,
//! );
//! ```

pub mod ast;
pub mod block_string;
mod error;
pub mod lexer;
mod limit;
mod name;
mod node;
mod parser;
mod source;
pub mod visitor;

#[cfg(test)]
mod tests;

pub use self::error::SyntaxError;
pub use self::limit::LimitTracker;
pub use self::name::InvalidNameError;
pub use self::name::Name;
pub use self::node::Node;
pub use self::parser::Parser;
pub use self::source::FileId;
pub use self::source::LineColumn;
pub use self::source::SourceFile;
pub use self::source::SourceSpan;

use std::path::Path;

/// Parse a document with the default parser configuration.
///
/// `path` becomes the label error reports print for this input;
/// any string works.
pub fn parse(
    source_text: impl Into<String>,
    path: impl AsRef<Path>,
) -> Result<ast::Document, SyntaxError> {
    Parser::new().parse(source_text, path)
}

/// Parse the given source text (e.g. `[Foo!]!`) as a reference to a GraphQL type.
pub fn parse_type(
    source_text: impl Into<String>,
    path: impl AsRef<Path>,
) -> Result<ast::Type, SyntaxError> {
    Parser::new().parse_type(source_text, path)
}

/// Parse the given source text as a value, allowing variable references.
pub fn parse_value(
    source_text: impl Into<String>,
    path: impl AsRef<Path>,
) -> Result<Node<ast::Value>, SyntaxError> {
    Parser::new().parse_value(source_text, path)
}

/// Parse the given source text as a constant value:
/// a variable reference is a syntax error.
pub fn parse_const_value(
    source_text: impl Into<String>,
    path: impl AsRef<Path>,
) -> Result<Node<ast::Value>, SyntaxError> {
    Parser::new().parse_const_value(source_text, path)
}

/// Serialize a document to GraphQL syntax with two-space indentation.
pub fn print_ast(document: &ast::Document) -> String {
    document.to_string()
}
