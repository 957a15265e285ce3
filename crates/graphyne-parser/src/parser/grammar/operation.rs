use super::directive::directives;
use super::selection::selection_set;
use super::ty::ty;
use super::value::value;
use crate::ast;
use crate::lexer::TokenKind;
use crate::parser::SyntaxParser;
use crate::SyntaxError;

pub(crate) fn operation_definition(
    p: &mut SyntaxParser,
    start: usize,
) -> Result<ast::Definition, SyntaxError> {
    if p.is_kind(TokenKind::LCurly) {
        // Anonymous query shorthand
        let selection_set = selection_set(p)?;
        return Ok(ast::Definition::OperationDefinition(p.node(
            start,
            ast::OperationDefinition {
                operation_type: ast::OperationType::Query,
                name: None,
                variables: Vec::new(),
                directives: ast::Directives::new(),
                selection_set,
            },
        )));
    }
    let operation_type = operation_type(p)?;
    let name = if p.is_kind(TokenKind::Name) {
        Some(p.name()?)
    } else {
        None
    };
    let variables = variable_definitions(p)?;
    let directives = directives(p, false)?;
    let selection_set = selection_set(p)?;
    Ok(ast::Definition::OperationDefinition(p.node(
        start,
        ast::OperationDefinition {
            operation_type,
            name,
            variables,
            directives,
            selection_set,
        },
    )))
}

pub(crate) fn operation_type(p: &mut SyntaxParser) -> Result<ast::OperationType, SyntaxError> {
    if p.eat_keyword("query") {
        Ok(ast::OperationType::Query)
    } else if p.eat_keyword("mutation") {
        Ok(ast::OperationType::Mutation)
    } else if p.eat_keyword("subscription") {
        Ok(ast::OperationType::Subscription)
    } else {
        Err(p.unexpected("an operation type"))
    }
}

pub(crate) fn variable_definitions(
    p: &mut SyntaxParser,
) -> Result<Vec<crate::Node<ast::VariableDefinition>>, SyntaxError> {
    super::optional_many(
        p,
        TokenKind::LParen,
        TokenKind::RParen,
        "variable definition",
        variable_definition,
    )
}

fn variable_definition(
    p: &mut SyntaxParser,
) -> Result<crate::Node<ast::VariableDefinition>, SyntaxError> {
    let start = p.start();
    p.expect(TokenKind::Dollar)?;
    let name = p.name()?;
    p.expect(TokenKind::Colon)?;
    let ty = ty(p)?;
    let default_value = if p.eat_kind(TokenKind::Eq) {
        Some(value(p, true)?)
    } else {
        None
    };
    let directives = directives(p, true)?;
    Ok(p.node(
        start,
        ast::VariableDefinition {
            name,
            ty,
            default_value,
            directives,
        },
    ))
}
