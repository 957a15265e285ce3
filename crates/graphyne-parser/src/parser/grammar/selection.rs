use super::directive::directives;
use crate::ast;
use crate::lexer::TokenKind;
use crate::parser::SyntaxParser;
use crate::SyntaxError;

pub(crate) fn selection_set(p: &mut SyntaxParser) -> Result<Vec<ast::Selection>, SyntaxError> {
    super::many(p, TokenKind::LCurly, TokenKind::RCurly, "selection", selection)
}

fn selection(p: &mut SyntaxParser) -> Result<ast::Selection, SyntaxError> {
    p.with_recursion_check(|p| match p.kind() {
        TokenKind::Spread => fragment_selection(p),
        TokenKind::Name => field(p),
        _ => Err(p.unexpected("a selection")),
    })
}

fn field(p: &mut SyntaxParser) -> Result<ast::Selection, SyntaxError> {
    let start = p.start();
    let mut alias = None;
    let mut name = p.name()?;
    if p.eat_kind(TokenKind::Colon) {
        alias = Some(name);
        name = p.name()?;
    }
    let arguments = super::directive::arguments(p, false)?;
    let directives = directives(p, false)?;
    let selection_set = if p.is_kind(TokenKind::LCurly) {
        selection_set(p)?
    } else {
        Vec::new()
    };
    Ok(ast::Selection::Field(p.node(
        start,
        ast::Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
        },
    )))
}

/// After `...`: either an inline fragment or a fragment spread.
fn fragment_selection(p: &mut SyntaxParser) -> Result<ast::Selection, SyntaxError> {
    let start = p.start();
    p.expect(TokenKind::Spread)?;
    // `on` is a keyword here, so `... on Foo` is always an inline fragment
    let is_spread = p.is_kind(TokenKind::Name) && !p.at_keyword("on");
    if is_spread {
        let fragment_name = p.name()?;
        let directives = directives(p, false)?;
        return Ok(ast::Selection::FragmentSpread(p.node(
            start,
            ast::FragmentSpread {
                fragment_name,
                directives,
            },
        )));
    }
    let type_condition = if p.eat_keyword("on") {
        Some(p.name()?)
    } else {
        None
    };
    let directives = directives(p, false)?;
    let selection_set = selection_set(p)?;
    Ok(ast::Selection::InlineFragment(p.node(
        start,
        ast::InlineFragment {
            type_condition,
            directives,
            selection_set,
        },
    )))
}
