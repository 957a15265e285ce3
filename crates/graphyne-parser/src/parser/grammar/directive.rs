use super::value::value;
use crate::ast;
use crate::lexer::TokenKind;
use crate::parser::SyntaxParser;
use crate::Node;
use crate::SyntaxError;

/// Parse any number of applied directives.
pub(crate) fn directives(
    p: &mut SyntaxParser,
    is_const: bool,
) -> Result<ast::Directives, SyntaxError> {
    let mut list = Vec::new();
    while p.is_kind(TokenKind::At) {
        let start = p.start();
        p.advance();
        let name = p.name()?;
        let arguments = arguments(p, is_const)?;
        list.push(p.node(start, ast::Directive { name, arguments }));
    }
    Ok(ast::Directives(list))
}

/// Parse an optional parenthesised argument list.
pub(crate) fn arguments(
    p: &mut SyntaxParser,
    is_const: bool,
) -> Result<Vec<Node<ast::Argument>>, SyntaxError> {
    super::optional_many(p, TokenKind::LParen, TokenKind::RParen, "argument", |p| {
        let start = p.start();
        let name = p.name()?;
        p.expect(TokenKind::Colon)?;
        let value = value(p, is_const)?;
        Ok(p.node(start, ast::Argument { name, value }))
    })
}
