use crate::ast;
use crate::lexer::TokenKind;
use crate::parser::SyntaxParser;
use crate::SyntaxError;

pub(crate) fn ty(p: &mut SyntaxParser) -> Result<ast::Type, SyntaxError> {
    p.with_recursion_check(|p| {
        let parsed = if p.eat_kind(TokenKind::LBracket) {
            let item = ty(p)?;
            p.expect(TokenKind::RBracket)?;
            ast::Type::List(Box::new(item))
        } else {
            ast::Type::Named(p.name()?)
        };
        if p.eat_kind(TokenKind::Bang) {
            Ok(parsed.non_null())
        } else {
            Ok(parsed)
        }
    })
}
