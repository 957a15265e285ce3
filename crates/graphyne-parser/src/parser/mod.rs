mod grammar;

use crate::ast;
use crate::lexer::Lexer;
use crate::lexer::Token;
use crate::lexer::TokenKind;
use crate::FileId;
use crate::LimitTracker;
use crate::Name;
use crate::Node;
use crate::SourceFile;
use crate::SourceSpan;
use crate::SyntaxError;
use std::path::Path;
use std::sync::Arc;

/// Default recursion limit, the same as graphql-js
const DEFAULT_RECURSION_LIMIT: usize = 500;

/// Configuration for parsing an input string as GraphQL syntax.
///
/// ```
/// use graphyne_parser::Parser;
///
/// let document = Parser::new()
///     .parse("{ hero { name } }", "query.graphql")
///     .unwrap();
/// assert_eq!(document.definitions.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    no_location: bool,
    allow_legacy_fragment_variables: bool,
    recursion_limit: usize,
    token_limit: Option<usize>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a `Parser` with default configuration.
    pub fn new() -> Self {
        Self {
            no_location: false,
            allow_legacy_fragment_variables: false,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            token_limit: None,
        }
    }

    /// Do not record source spans on parsed nodes.
    pub fn no_location(mut self) -> Self {
        self.no_location = true;
        self
    }

    /// Accept the non-standard `fragment Name($var: Type) on …` grammar.
    ///
    /// Off by default; the parsed variable definitions carry no execution
    /// semantics.
    pub fn allow_legacy_fragment_variables(mut self) -> Self {
        self.allow_legacy_fragment_variables = true;
        self
    }

    /// Configure the recursion limit to use while parsing.
    /// This protects against stack overflow on deeply nested input.
    pub fn recursion_limit(mut self, value: usize) -> Self {
        self.recursion_limit = value;
        self
    }

    /// Configure the limit on the number of tokens to parse.
    /// If an input document is too big, parsing is aborted.
    /// By default, there is no limit.
    pub fn token_limit(mut self, value: usize) -> Self {
        self.token_limit = Some(value);
        self
    }

    /// Parse the given source text into a [`Document`][ast::Document].
    ///
    /// `path` becomes the label error reports print for this input;
    /// it can be a real file path or any other string, unique or not.
    pub fn parse(
        &self,
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<ast::Document, SyntaxError> {
        self.parse_with_file_id(source_text, path, FileId::new())
    }

    /// Parse with a caller-chosen [`FileId`] instead of a fresh one.
    ///
    /// This is how a type system keeps a stable identity for documents it
    /// adds implicitly, such as [`FileId::BUILT_IN`].
    pub fn parse_with_file_id(
        &self,
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
        file_id: FileId,
    ) -> Result<ast::Document, SyntaxError> {
        let (mut parser, source) = self.tokenize(source_text.into(), path.as_ref(), file_id)?;
        let mut document = grammar::document(&mut parser)?;
        document.source = Some((file_id, source));
        Ok(document)
    }

    /// Parse the given source text (e.g. `[Foo!]!`) as a reference to a
    /// GraphQL type.
    pub fn parse_type(
        &self,
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<ast::Type, SyntaxError> {
        let (mut parser, _) = self.tokenize(source_text.into(), path.as_ref(), FileId::new())?;
        let ty = grammar::ty(&mut parser)?;
        parser.expect_eof()?;
        Ok(ty)
    }

    /// Parse the given source text as a value, allowing variable references.
    pub fn parse_value(
        &self,
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Node<ast::Value>, SyntaxError> {
        let (mut parser, _) = self.tokenize(source_text.into(), path.as_ref(), FileId::new())?;
        let value = grammar::value(&mut parser, false)?;
        parser.expect_eof()?;
        Ok(value)
    }

    /// Parse the given source text as a constant value:
    /// a variable reference is a syntax error.
    pub fn parse_const_value(
        &self,
        source_text: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Node<ast::Value>, SyntaxError> {
        let (mut parser, _) = self.tokenize(source_text.into(), path.as_ref(), FileId::new())?;
        let value = grammar::value(&mut parser, true)?;
        parser.expect_eof()?;
        Ok(value)
    }

    fn tokenize(
        &self,
        source_text: String,
        path: &Path,
        file_id: FileId,
    ) -> Result<(SyntaxParser, Arc<SourceFile>), SyntaxError> {
        let source = Arc::new(SourceFile::new(path.to_owned(), source_text));
        let tokens =
            Lexer::new(source.source_text(), &source, file_id, self.token_limit).lex()?;
        let parser = SyntaxParser::new(tokens, source.clone(), file_id, self);
        Ok((parser, source))
    }
}

/// Cursor over the token stream, shared by the grammar functions.
pub(crate) struct SyntaxParser {
    /// Lexed tokens with comments stripped; always ends with an `Eof` token.
    tokens: Vec<Token>,
    index: usize,
    /// End offset of the most recently consumed token.
    prev_end: usize,
    source: Arc<SourceFile>,
    file_id: FileId,
    no_location: bool,
    pub(crate) legacy_fragment_variables: bool,
    recursion: LimitTracker,
}

impl SyntaxParser {
    fn new(tokens: Vec<Token>, source: Arc<SourceFile>, file_id: FileId, config: &Parser) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|token| token.kind() != TokenKind::Comment)
            .collect();
        Self {
            tokens,
            index: 0,
            prev_end: 0,
            source,
            file_id,
            no_location: config.no_location,
            legacy_fragment_variables: config.allow_legacy_fragment_variables,
            recursion: LimitTracker::new(config.recursion_limit),
        }
    }

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.index]
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind()
    }

    pub(crate) fn is_kind(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn at_keyword(&self, keyword: &str) -> bool {
        self.is_kind(TokenKind::Name) && self.current().data() == keyword
    }

    /// Consume the current token and return it.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        self.prev_end = token.span().end_offset();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    pub(crate) fn eat_kind(&mut self, kind: TokenKind) -> bool {
        if self.is_kind(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        if self.is_kind(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.description()))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Result<(), SyntaxError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("\"{keyword}\"")))
        }
    }

    pub(crate) fn expect_eof(&mut self) -> Result<(), SyntaxError> {
        if self.is_kind(TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    /// Parse a `Name` token into a [`Name`].
    pub(crate) fn name(&mut self) -> Result<Name, SyntaxError> {
        let token = self.expect(TokenKind::Name)?;
        self.token_name(&token)
    }

    pub(crate) fn token_name(&self, token: &Token) -> Result<Name, SyntaxError> {
        if self.no_location {
            // The lexer only produces valid name tokens
            return Ok(Name::new_unchecked(token.data()));
        }
        Name::parsed(token.data(), token.span())
            .map_err(|err| SyntaxError::new(err.to_string(), &self.source, token.span()))
    }

    /// An error pointing at the current token.
    pub(crate) fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, &self.source, self.current().span())
    }

    pub(crate) fn error_at(&self, message: impl Into<String>, span: SourceSpan) -> SyntaxError {
        SyntaxError::new(message, &self.source, span)
    }

    pub(crate) fn unexpected(&self, expected: &str) -> SyntaxError {
        let current = self.current();
        let found = match current.kind() {
            TokenKind::Eof => "end of input".to_owned(),
            TokenKind::Name | TokenKind::Int | TokenKind::Float => {
                format!("\"{}\"", current.data())
            }
            kind => kind.description().to_owned(),
        };
        self.error(format!("expected {expected}, found {found}"))
    }

    /// Byte offset where the next construct starts.
    pub(crate) fn start(&self) -> usize {
        self.current().span().offset()
    }

    /// Wrap a parsed construct in a [`Node`], spanning from `start` to the
    /// end of the most recently consumed token.
    pub(crate) fn node<T>(&self, start: usize, node: T) -> Node<T> {
        if self.no_location {
            Node::new(node)
        } else {
            Node::at(node, SourceSpan::new(self.file_id, start, self.prev_end))
        }
    }

    pub(crate) fn with_recursion_check<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.recursion.check_and_increment() {
            return Err(self.error(format!(
                "parser recursion limit of {} reached",
                self.recursion.limit
            )));
        }
        let result = f(self);
        self.recursion.decrement();
        result
    }
}
