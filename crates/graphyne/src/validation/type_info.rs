//! Schema-derived context tracked alongside the traversal, so rules can ask
//! "what type is this selection on?" without re-deriving it.

use crate::schema::ExtendedType;
use crate::validation::ValidationContext;
use crate::Schema;
use crate::validation::Valid;
use graphyne_parser::ast;
use graphyne_parser::ast::Type;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::ParallelVisitor;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;
use graphyne_parser::Name;
use graphyne_parser::Node;

/// Stacks of output type / parent type / input type / field definition, plus
/// the current directive, argument, and default value, updated as the walker
/// enters and leaves schema-relevant nodes.
pub(crate) struct TypeInfo<'a> {
    schema: &'a Valid<Schema>,
    type_stack: Vec<Option<Type>>,
    parent_type_stack: Vec<Option<Name>>,
    input_type_stack: Vec<Option<Type>>,
    field_def_stack: Vec<Option<Node<ast::FieldDefinition>>>,
    default_value_stack: Vec<Option<Node<ast::Value>>>,
    directive: Option<Node<ast::DirectiveDefinition>>,
    argument: Option<Node<ast::InputValueDefinition>>,
}

impl<'a> TypeInfo<'a> {
    pub(crate) fn new(schema: &'a Valid<Schema>) -> Self {
        Self {
            schema,
            type_stack: Vec::new(),
            parent_type_stack: Vec::new(),
            input_type_stack: Vec::new(),
            field_def_stack: Vec::new(),
            default_value_stack: Vec::new(),
            directive: None,
            argument: None,
        }
    }

    /// The output type of the position being visited, wrappers included.
    pub(crate) fn ty(&self) -> Option<&Type> {
        self.type_stack.last()?.as_ref()
    }

    /// The composite type selections are currently made on.
    pub(crate) fn parent_type(&self) -> Option<&ExtendedType> {
        let name = self.parent_type_stack.last()?.as_ref()?;
        self.schema.types.get(name.as_str())
    }

    pub(crate) fn parent_type_name(&self) -> Option<&Name> {
        self.parent_type_stack.last()?.as_ref()
    }

    /// The composite type enclosing the field frame currently on top of the
    /// stacks. During a field's own events (and those of its arguments and
    /// directives), this is the type the field is selected on.
    pub(crate) fn enclosing_parent_type(&self) -> Option<&ExtendedType> {
        let index = self.parent_type_stack.len().checked_sub(2)?;
        let name = self.parent_type_stack.get(index)?.as_ref()?;
        self.schema.types.get(name.as_str())
    }

    /// The input type of the position being visited, wrappers included.
    pub(crate) fn input_type(&self) -> Option<&Type> {
        self.input_type_stack.last()?.as_ref()
    }

    pub(crate) fn field_def(&self) -> Option<&Node<ast::FieldDefinition>> {
        self.field_def_stack.last()?.as_ref()
    }

    pub(crate) fn default_value(&self) -> Option<&Node<ast::Value>> {
        self.default_value_stack.last()?.as_ref()
    }

    pub(crate) fn directive(&self) -> Option<&Node<ast::DirectiveDefinition>> {
        self.directive.as_ref()
    }

    pub(crate) fn argument(&self) -> Option<&Node<ast::InputValueDefinition>> {
        self.argument.as_ref()
    }

    fn enter(&mut self, node: &AstNode) {
        match node {
            AstNode::Operation(operation) => {
                let root = self
                    .schema
                    .root_operation(operation.operation_type)
                    .cloned();
                self.type_stack
                    .push(root.clone().map(Type::Named));
                self.parent_type_stack.push(root);
            }
            AstNode::Fragment(fragment) => {
                let condition = fragment.type_condition.clone();
                self.type_stack.push(Some(Type::Named(condition.clone())));
                self.parent_type_stack.push(Some(condition));
            }
            AstNode::InlineFragment(inline) => {
                let condition = inline
                    .type_condition
                    .clone()
                    .or_else(|| self.parent_type_stack.last().cloned().flatten());
                self.type_stack
                    .push(condition.clone().map(Type::Named));
                self.parent_type_stack.push(condition);
            }
            AstNode::Field(field) => {
                let field_def = self.parent_type_name().and_then(|parent| {
                    self.schema
                        .type_field(parent.as_str(), field.name.as_str())
                        .ok()
                        .cloned()
                });
                let field_type = field_def.as_ref().map(|def| def.ty.clone());
                // The parent of this field's own selection set
                let child_parent = field_type
                    .as_ref()
                    .map(|ty| ty.inner_named_type().clone());
                self.field_def_stack.push(field_def);
                self.type_stack.push(field_type);
                self.parent_type_stack.push(child_parent);
            }
            AstNode::Directive(directive) => {
                self.directive = self
                    .schema
                    .directive_definitions
                    .get(directive.name.as_str())
                    .cloned();
            }
            AstNode::Argument(argument) => {
                let argument_def = if let Some(directive) = &self.directive {
                    directive
                        .arguments
                        .iter()
                        .find(|def| def.name == argument.name)
                        .cloned()
                } else {
                    self.field_def().and_then(|field| {
                        field
                            .arguments
                            .iter()
                            .find(|def| def.name == argument.name)
                            .cloned()
                    })
                };
                self.input_type_stack
                    .push(argument_def.as_ref().map(|def| def.ty.clone()));
                self.default_value_stack
                    .push(argument_def.as_ref().and_then(|def| def.default_value.clone()));
                self.argument = argument_def;
            }
            AstNode::VariableDefinition(variable) => {
                self.input_type_stack.push(Some(variable.ty.clone()));
                self.default_value_stack
                    .push(variable.default_value.clone());
            }
            _ => {}
        }
    }

    fn leave(&mut self, node: &AstNode) {
        match node {
            AstNode::Operation(_) | AstNode::Fragment(_) | AstNode::InlineFragment(_) => {
                self.type_stack.pop();
                self.parent_type_stack.pop();
            }
            AstNode::Field(_) => {
                self.field_def_stack.pop();
                self.type_stack.pop();
                self.parent_type_stack.pop();
            }
            AstNode::Directive(_) => self.directive = None,
            AstNode::Argument(_) => {
                self.input_type_stack.pop();
                self.default_value_stack.pop();
                self.argument = None;
            }
            AstNode::VariableDefinition(_) => {
                self.input_type_stack.pop();
                self.default_value_stack.pop();
            }
            _ => {}
        }
    }
}

/// Composes [`TypeInfo`] with the rule visitors: the context is updated
/// before rules enter a node and after they leave it.
pub(crate) struct TypeInfoVisitor<'a> {
    pub(crate) ctx: &'a ValidationContext<'a>,
    pub(crate) inner: ParallelVisitor<'a>,
}

impl Visitor for TypeInfoVisitor<'_> {
    fn enter(&mut self, node: &AstNode, info: &VisitInfo<'_>) -> VisitAction {
        self.ctx.type_info.borrow_mut().enter(node);
        self.inner.enter(node, info)
    }

    fn leave(&mut self, node: &AstNode, info: &VisitInfo<'_>) -> VisitAction {
        let action = self.inner.leave(node, info);
        self.ctx.type_info.borrow_mut().leave(node);
        action
    }
}
