//! Caret-annotated diagnostic reports that reference GraphQL source text,
//! for printing syntax, schema, and validation errors to a CLI.

use crate::execution::GraphQLError;
use crate::SourceMap;
use ariadne::ColorGenerator;
use ariadne::Config;
use ariadne::Label;
use ariadne::Report;
use ariadne::ReportKind;
use graphyne_parser::FileId;
use graphyne_parser::SourceSpan;
use graphyne_parser::SyntaxError;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

type MappedSpan = (FileId, Range<usize>);

/// Render a caret-annotated report for an error at a source span.
///
/// The span is optional; without one the report is just the message.
/// Output is plain text (no colour), one report per call.
pub fn format_diagnostic(
    sources: &SourceMap,
    message: &str,
    location: Option<SourceSpan>,
) -> String {
    let mut colors = ColorGenerator::new();
    let mut cache = Cache::new(sources);
    let span = location
        .and_then(|location| cache.map_span(location))
        .unwrap_or((FileId::NONE, 0..0));
    let mut report = Report::build(ReportKind::Error, span.0, span.1.start)
        .with_config(Config::default().with_color(false))
        .with_message(message);
    if location.is_some() {
        report = report.with_label(
            Label::new(span)
                .with_message(message)
                .with_color(colors.next()),
        );
    }
    let mut output = Vec::new();
    match report.finish().write(&mut cache, &mut output) {
        Ok(()) => String::from_utf8_lossy(&output).into_owned(),
        Err(_) => message.to_owned(),
    }
}

/// Render a [`GraphQLError`] (validation, coercion, or field error)
/// as a diagnostic report.
pub fn format_error(sources: &SourceMap, error: &GraphQLError) -> String {
    format_diagnostic(sources, &error.message, error.source_span())
}

/// Render a [`SyntaxError`] as a diagnostic report.
pub fn format_syntax_error(error: &SyntaxError) -> String {
    let mut sources = indexmap::IndexMap::new();
    sources.insert(error.span().file_id(), error.source().clone());
    format_diagnostic(
        &Arc::new(sources),
        &format!("syntax error: {}", error.message()),
        Some(error.span()),
    )
}

/// Resolves file ids for ariadne, translating byte offsets to the char
/// offsets it expects.
struct Cache<'a> {
    sources: &'a SourceMap,
    cached: HashMap<FileId, ariadne::Source<String>>,
}

impl<'a> Cache<'a> {
    fn new(sources: &'a SourceMap) -> Self {
        Self {
            sources,
            cached: HashMap::new(),
        }
    }

    fn map_span(&self, location: SourceSpan) -> Option<MappedSpan> {
        let source = self.sources.get(&location.file_id())?;
        let text = source.source_text();
        let char_index = |byte_offset: usize| {
            text.get(..byte_offset)
                .map(|prefix| prefix.chars().count())
                .unwrap_or_else(|| text.chars().count())
        };
        Some((
            location.file_id(),
            char_index(location.offset())..char_index(location.end_offset()),
        ))
    }
}

impl ariadne::Cache<FileId> for &mut Cache<'_> {
    type Storage = String;

    fn fetch(
        &mut self,
        file_id: &FileId,
    ) -> Result<&ariadne::Source<String>, Box<dyn fmt::Debug + '_>> {
        let text = self
            .sources
            .get(file_id)
            .map(|source| source.source_text().to_owned())
            .unwrap_or_default();
        Ok(self
            .cached
            .entry(*file_id)
            .or_insert_with(|| ariadne::Source::from(text)))
    }

    fn display<'b>(&self, file_id: &'b FileId) -> Option<Box<dyn fmt::Display + 'b>> {
        match self.sources.get(file_id) {
            Some(source) => Some(Box::new(source.path().display().to_string())),
            None => Some(Box::new("(no source file)".to_owned())),
        }
    }
}
