use crate::LineColumn;
use crate::SourceFile;
use crate::SourceSpan;
use std::fmt;
use std::sync::Arc;

/// An error produced by the lexer or the parser.
///
/// Syntax errors are fatal: the first one aborts parsing of the document.
/// [`Display`][fmt::Display] prints a single-line `path:line:column: message`
/// form; richer caret-annotated reports are available through the engine's
/// diagnostic rendering.
#[derive(Clone)]
pub struct SyntaxError {
    pub(crate) message: String,
    pub(crate) source: Arc<SourceFile>,
    pub(crate) span: SourceSpan,
}

impl SyntaxError {
    pub(crate) fn new(
        message: impl Into<String>,
        source: &Arc<SourceFile>,
        span: SourceSpan,
    ) -> Self {
        Self {
            message: message.into(),
            source: source.clone(),
            span,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }

    /// The source file the error was found in.
    pub fn source(&self) -> &Arc<SourceFile> {
        &self.source
    }

    /// Line and column of the start of the offending range.
    pub fn line_column(&self) -> Option<LineColumn> {
        self.source.get_line_column(self.span.offset())
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.source.path().display())?;
        if let Some(position) = self.line_column() {
            write!(f, "{position}:")?;
        }
        write!(f, " {}", self.message)
    }
}

impl fmt::Debug for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyntaxError@{:?} {:?}", self.span, self.message)
    }
}

impl PartialEq for SyntaxError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message && self.span == other.span
    }
}

impl std::error::Error for SyntaxError {}
