use super::directive::directives;
use super::operation::variable_definitions;
use super::selection::selection_set;
use crate::ast;
use crate::parser::SyntaxParser;
use crate::SyntaxError;

pub(crate) fn fragment_definition(
    p: &mut SyntaxParser,
    start: usize,
) -> Result<ast::Definition, SyntaxError> {
    p.expect_keyword("fragment")?;
    if p.at_keyword("on") {
        return Err(p.error("a fragment cannot be named \"on\""));
    }
    let name = p.name()?;
    let variables = if p.legacy_fragment_variables {
        variable_definitions(p)?
    } else {
        Vec::new()
    };
    p.expect_keyword("on")?;
    let type_condition = p.name()?;
    let directives = directives(p, false)?;
    let selection_set = selection_set(p)?;
    Ok(ast::Definition::FragmentDefinition(p.node(
        start,
        ast::FragmentDefinition {
            name,
            variables,
            type_condition,
            directives,
            selection_set,
        },
    )))
}
