//! Recursive-descent grammar functions, one module per construct family.
//!
//! Every function takes the parser positioned at the start of its production
//! and either consumes it entirely or returns the first syntax error.

mod directive;
mod fragment;
mod operation;
mod selection;
mod ty;
mod type_system;
mod value;

pub(crate) use self::ty::ty;
pub(crate) use self::value::value;

use super::SyntaxParser;
use crate::ast;
use crate::lexer::TokenKind;
use crate::SyntaxError;

pub(crate) fn document(p: &mut SyntaxParser) -> Result<ast::Document, SyntaxError> {
    let mut definitions = Vec::new();
    while !p.is_kind(TokenKind::Eof) {
        definitions.push(definition(p)?);
    }
    Ok(ast::Document {
        source: None,
        definitions,
    })
}

fn definition(p: &mut SyntaxParser) -> Result<ast::Definition, SyntaxError> {
    let start = p.start();
    if let Some(description) = description(p)? {
        if p.at_keyword("extend") {
            return Err(p.error("a description is not allowed on an extension"));
        }
        return type_system::definition(p, start, Some(description));
    }
    match p.kind() {
        TokenKind::LCurly => operation::operation_definition(p, start),
        TokenKind::Name => match p.current().data() {
            "query" | "mutation" | "subscription" => operation::operation_definition(p, start),
            "fragment" => fragment::fragment_definition(p, start),
            "schema" | "scalar" | "type" | "interface" | "union" | "enum" | "input"
            | "directive" => type_system::definition(p, start, None),
            "extend" => type_system::extension(p, start),
            name => Err(p.error(format!("expected a definition, found \"{name}\""))),
        },
        _ => Err(p.unexpected("a definition")),
    }
}

/// Parse an optional description: a string or block string immediately
/// preceding a type system definition.
pub(crate) fn description(p: &mut SyntaxParser) -> Result<Option<String>, SyntaxError> {
    if matches!(p.kind(), TokenKind::StringValue | TokenKind::BlockString) {
        let token = p.advance();
        Ok(Some(token.data().to_owned()))
    } else {
        Ok(None)
    }
}

/// Parse `open` then one or more `f` then `close`, like `( only: Int )`.
pub(crate) fn many<T>(
    p: &mut SyntaxParser,
    open: TokenKind,
    close: TokenKind,
    what: &str,
    mut f: impl FnMut(&mut SyntaxParser) -> Result<T, SyntaxError>,
) -> Result<Vec<T>, SyntaxError> {
    p.expect(open)?;
    if p.is_kind(close) {
        return Err(p.error(format!("expected at least one {what}")));
    }
    let mut items = Vec::new();
    while !p.eat_kind(close) {
        items.push(f(p)?);
    }
    Ok(items)
}

/// Like [`many`], but the whole group may be absent.
pub(crate) fn optional_many<T>(
    p: &mut SyntaxParser,
    open: TokenKind,
    close: TokenKind,
    what: &str,
    f: impl FnMut(&mut SyntaxParser) -> Result<T, SyntaxError>,
) -> Result<Vec<T>, SyntaxError> {
    if p.is_kind(open) {
        many(p, open, close, what, f)
    } else {
        Ok(Vec::new())
    }
}
