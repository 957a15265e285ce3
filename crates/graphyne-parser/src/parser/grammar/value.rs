use crate::ast;
use crate::lexer::TokenKind;
use crate::parser::SyntaxParser;
use crate::Node;
use crate::SyntaxError;

/// Parse a value literal. In a constant context (`is_const`), a variable
/// reference is a syntax error.
pub(crate) fn value(
    p: &mut SyntaxParser,
    is_const: bool,
) -> Result<Node<ast::Value>, SyntaxError> {
    p.with_recursion_check(|p| {
        let start = p.start();
        let parsed = match p.kind() {
            TokenKind::Dollar => {
                let span = p.current().span();
                p.advance();
                let name = p.name()?;
                if is_const {
                    return Err(p.error_at(
                        format!("unexpected variable ${name} in a constant value"),
                        span,
                    ));
                }
                ast::Value::Variable(name)
            }
            TokenKind::Int => {
                let token = p.advance();
                match token.data().parse::<i32>() {
                    Ok(int) => ast::Value::Int(int),
                    // Integer syntax overflowing `i32` is kept as digits;
                    // it is valid where a `Float` is expected
                    Err(_) => ast::Value::BigInt(token.data().to_owned()),
                }
            }
            TokenKind::Float => {
                let token = p.advance();
                let float: f64 = token
                    .data()
                    .parse()
                    .map_err(|_| p.error_at("invalid float value", token.span()))?;
                ast::Value::Float(float.into())
            }
            TokenKind::StringValue | TokenKind::BlockString => {
                let token = p.advance();
                ast::Value::String(token.data().to_owned())
            }
            TokenKind::Name => {
                let token = p.advance();
                match token.data() {
                    "true" => ast::Value::Boolean(true),
                    "false" => ast::Value::Boolean(false),
                    "null" => ast::Value::Null,
                    _ => ast::Value::Enum(p.token_name(&token)?),
                }
            }
            TokenKind::LBracket => {
                p.advance();
                let mut items = Vec::new();
                while !p.eat_kind(TokenKind::RBracket) {
                    items.push(value(p, is_const)?);
                }
                ast::Value::List(items)
            }
            TokenKind::LCurly => {
                p.advance();
                let mut fields: Vec<(crate::Name, Node<ast::Value>)> = Vec::new();
                while !p.eat_kind(TokenKind::RCurly) {
                    let name = p.name()?;
                    p.expect(TokenKind::Colon)?;
                    let field_value = value(p, is_const)?;
                    fields.push((name, field_value));
                }
                ast::Value::Object(fields)
            }
            _ => return Err(p.unexpected("a value")),
        };
        Ok(p.node(start, parsed))
    })
}
