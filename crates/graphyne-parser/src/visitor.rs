//! Depth-first AST traversal with enter/leave callbacks and an editing
//! protocol.
//!
//! A [`Visitor`] receives every node of a document wrapped in the dynamic
//! [`AstNode`] enum (node clones are cheap: the underlying data is
//! reference-counted) and controls the walk through the [`VisitAction`] it
//! returns. Editing actions rebuild the affected spine copy-on-write, so the
//! input document is never mutated; [`visit`] returns the edited root.

use crate::ast::*;
use crate::Name;
use crate::Node;
use std::collections::HashMap;

/// What a [`Visitor`] callback tells the walker to do next.
#[derive(Clone, Debug)]
pub enum VisitAction {
    /// Proceed with the traversal.
    Continue,
    /// On enter: do not descend into this node's children,
    /// and do not call `leave` for this node. On leave: same as `Continue`.
    Skip,
    /// Terminate the traversal immediately, keeping any edits made so far.
    Break,
    /// Delete this node from its list parent,
    /// or clear the optional slot it occupies.
    Remove,
    /// Substitute the node. A replacement returned from `enter` has its
    /// children visited; one returned from `leave` does not.
    Replace(AstNode),
}

/// The node kinds delivered to visitors, used as [`VisitorKeyMap`] keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Operation,
    Fragment,
    Field,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Argument,
    Directive,
    Value,
    Type,
    SchemaDefinition,
    ScalarDefinition,
    ObjectDefinition,
    InterfaceDefinition,
    UnionDefinition,
    EnumDefinition,
    EnumValueDefinition,
    InputObjectDefinition,
    FieldDefinition,
    InputValueDefinition,
    DirectiveDefinition,
    SchemaExtension,
    ScalarExtension,
    ObjectExtension,
    InterfaceExtension,
    UnionExtension,
    EnumExtension,
    InputObjectExtension,
}

/// A document node as seen by a visitor.
#[derive(Clone, Debug)]
pub enum AstNode {
    Document(Document),
    Operation(Node<OperationDefinition>),
    Fragment(Node<FragmentDefinition>),
    Field(Node<Field>),
    FragmentSpread(Node<FragmentSpread>),
    InlineFragment(Node<InlineFragment>),
    VariableDefinition(Node<VariableDefinition>),
    Argument(Node<Argument>),
    Directive(Node<Directive>),
    Value(Node<Value>),
    Type(Type),
    SchemaDefinition(Node<SchemaDefinition>),
    ScalarDefinition(Node<ScalarTypeDefinition>),
    ObjectDefinition(Node<ObjectTypeDefinition>),
    InterfaceDefinition(Node<InterfaceTypeDefinition>),
    UnionDefinition(Node<UnionTypeDefinition>),
    EnumDefinition(Node<EnumTypeDefinition>),
    EnumValueDefinition(Node<EnumValueDefinition>),
    InputObjectDefinition(Node<InputObjectTypeDefinition>),
    FieldDefinition(Node<FieldDefinition>),
    InputValueDefinition(Node<InputValueDefinition>),
    DirectiveDefinition(Node<DirectiveDefinition>),
    SchemaExtension(Node<SchemaExtension>),
    ScalarExtension(Node<ScalarTypeExtension>),
    ObjectExtension(Node<ObjectTypeExtension>),
    InterfaceExtension(Node<InterfaceTypeExtension>),
    UnionExtension(Node<UnionTypeExtension>),
    EnumExtension(Node<EnumTypeExtension>),
    InputObjectExtension(Node<InputObjectTypeExtension>),
}

impl AstNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Document(_) => NodeKind::Document,
            Self::Operation(_) => NodeKind::Operation,
            Self::Fragment(_) => NodeKind::Fragment,
            Self::Field(_) => NodeKind::Field,
            Self::FragmentSpread(_) => NodeKind::FragmentSpread,
            Self::InlineFragment(_) => NodeKind::InlineFragment,
            Self::VariableDefinition(_) => NodeKind::VariableDefinition,
            Self::Argument(_) => NodeKind::Argument,
            Self::Directive(_) => NodeKind::Directive,
            Self::Value(_) => NodeKind::Value,
            Self::Type(_) => NodeKind::Type,
            Self::SchemaDefinition(_) => NodeKind::SchemaDefinition,
            Self::ScalarDefinition(_) => NodeKind::ScalarDefinition,
            Self::ObjectDefinition(_) => NodeKind::ObjectDefinition,
            Self::InterfaceDefinition(_) => NodeKind::InterfaceDefinition,
            Self::UnionDefinition(_) => NodeKind::UnionDefinition,
            Self::EnumDefinition(_) => NodeKind::EnumDefinition,
            Self::EnumValueDefinition(_) => NodeKind::EnumValueDefinition,
            Self::InputObjectDefinition(_) => NodeKind::InputObjectDefinition,
            Self::FieldDefinition(_) => NodeKind::FieldDefinition,
            Self::InputValueDefinition(_) => NodeKind::InputValueDefinition,
            Self::DirectiveDefinition(_) => NodeKind::DirectiveDefinition,
            Self::SchemaExtension(_) => NodeKind::SchemaExtension,
            Self::ScalarExtension(_) => NodeKind::ScalarExtension,
            Self::ObjectExtension(_) => NodeKind::ObjectExtension,
            Self::InterfaceExtension(_) => NodeKind::InterfaceExtension,
            Self::UnionExtension(_) => NodeKind::UnionExtension,
            Self::EnumExtension(_) => NodeKind::EnumExtension,
            Self::InputObjectExtension(_) => NodeKind::InputObjectExtension,
        }
    }

    /// The source span of the underlying node, if it was parsed.
    pub fn location(&self) -> Option<crate::SourceSpan> {
        match self {
            Self::Document(_) | Self::Type(_) => None,
            Self::Operation(node) => node.location(),
            Self::Fragment(node) => node.location(),
            Self::Field(node) => node.location(),
            Self::FragmentSpread(node) => node.location(),
            Self::InlineFragment(node) => node.location(),
            Self::VariableDefinition(node) => node.location(),
            Self::Argument(node) => node.location(),
            Self::Directive(node) => node.location(),
            Self::Value(node) => node.location(),
            Self::SchemaDefinition(node) => node.location(),
            Self::ScalarDefinition(node) => node.location(),
            Self::ObjectDefinition(node) => node.location(),
            Self::InterfaceDefinition(node) => node.location(),
            Self::UnionDefinition(node) => node.location(),
            Self::EnumDefinition(node) => node.location(),
            Self::EnumValueDefinition(node) => node.location(),
            Self::InputObjectDefinition(node) => node.location(),
            Self::FieldDefinition(node) => node.location(),
            Self::InputValueDefinition(node) => node.location(),
            Self::DirectiveDefinition(node) => node.location(),
            Self::SchemaExtension(node) => node.location(),
            Self::ScalarExtension(node) => node.location(),
            Self::ObjectExtension(node) => node.location(),
            Self::InterfaceExtension(node) => node.location(),
            Self::UnionExtension(node) => node.location(),
            Self::EnumExtension(node) => node.location(),
            Self::InputObjectExtension(node) => node.location(),
        }
    }
}

/// One step of the path from the document root to a node:
/// a struct field name, or an index in a list of children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathKey {
    Key(&'static str),
    Index(usize),
}

/// Positional context delivered to visitor callbacks.
pub struct VisitInfo<'a> {
    /// Path from the root to the current node.
    pub path: &'a [PathKey],
    /// All nodes between the root (inclusive) and the current node (exclusive).
    pub ancestors: &'a [AstNode],
}

impl VisitInfo<'_> {
    /// The field name or index of this node inside its parent.
    pub fn key(&self) -> Option<&PathKey> {
        self.path.last()
    }

    pub fn parent(&self) -> Option<&AstNode> {
        self.ancestors.last()
    }
}

pub trait Visitor {
    fn enter(&mut self, node: &AstNode, info: &VisitInfo<'_>) -> VisitAction {
        let _ = (node, info);
        VisitAction::Continue
    }

    fn leave(&mut self, node: &AstNode, info: &VisitInfo<'_>) -> VisitAction {
        let _ = (node, info);
        VisitAction::Continue
    }
}

/// Overrides, per node kind, the ordered list of child keys to descend into.
/// Kinds not present in the map use the default keys.
pub type VisitorKeyMap = HashMap<NodeKind, Vec<&'static str>>;

/// The child keys the walker descends into for each node kind.
pub fn default_visitor_keys(kind: NodeKind) -> &'static [&'static str] {
    match kind {
        NodeKind::Document => &["definitions"],
        NodeKind::Operation => &["variables", "directives", "selection_set"],
        NodeKind::Fragment => &["variables", "directives", "selection_set"],
        NodeKind::Field => &["arguments", "directives", "selection_set"],
        NodeKind::FragmentSpread => &["directives"],
        NodeKind::InlineFragment => &["directives", "selection_set"],
        NodeKind::VariableDefinition => &["type", "default_value", "directives"],
        NodeKind::Argument => &["value"],
        NodeKind::Directive => &["arguments"],
        NodeKind::Value => &["values"],
        NodeKind::Type => &["type"],
        NodeKind::SchemaDefinition => &["directives"],
        NodeKind::ScalarDefinition => &["directives"],
        NodeKind::ObjectDefinition => &["directives", "fields"],
        NodeKind::InterfaceDefinition => &["directives", "fields"],
        NodeKind::UnionDefinition => &["directives"],
        NodeKind::EnumDefinition => &["directives", "values"],
        NodeKind::EnumValueDefinition => &["directives"],
        NodeKind::InputObjectDefinition => &["directives", "fields"],
        NodeKind::FieldDefinition => &["arguments", "type", "directives"],
        NodeKind::InputValueDefinition => &["type", "default_value", "directives"],
        NodeKind::DirectiveDefinition => &["arguments"],
        NodeKind::SchemaExtension => &["directives"],
        NodeKind::ScalarExtension => &["directives"],
        NodeKind::ObjectExtension => &["directives", "fields"],
        NodeKind::InterfaceExtension => &["directives", "fields"],
        NodeKind::UnionExtension => &["directives"],
        NodeKind::EnumExtension => &["directives", "values"],
        NodeKind::InputObjectExtension => &["directives", "fields"],
    }
}

/// Walk the document depth-first, delivering every node to the visitor.
/// Returns the (possibly edited) document.
pub fn visit(document: &Document, visitor: &mut dyn Visitor) -> Document {
    visit_inner(document, visitor, None)
}

/// Like [`visit`], with the descent order overridden by `key_map`.
pub fn visit_with_keys(
    document: &Document,
    visitor: &mut dyn Visitor,
    key_map: &VisitorKeyMap,
) -> Document {
    visit_inner(document, visitor, Some(key_map))
}

fn visit_inner(
    document: &Document,
    visitor: &mut dyn Visitor,
    key_map: Option<&VisitorKeyMap>,
) -> Document {
    let mut walk = Walk {
        visitor,
        key_map,
        path: Vec::new(),
        ancestors: Vec::new(),
        broken: false,
    };
    match walk.traverse(AstNode::Document(document.clone())) {
        Some(AstNode::Document(edited)) => edited,
        Some(_) => incompatible_replacement("Document"),
        // Removing the root yields an empty document
        None => Document {
            source: document.source.clone(),
            definitions: Vec::new(),
        },
    }
}

fn incompatible_replacement(expected: &str) -> ! {
    panic!("visitor replaced or removed a node where a {expected} is required")
}

struct Walk<'a> {
    visitor: &'a mut dyn Visitor,
    key_map: Option<&'a VisitorKeyMap>,
    path: Vec<PathKey>,
    ancestors: Vec<AstNode>,
    broken: bool,
}

impl Walk<'_> {
    fn keys(&self, kind: NodeKind) -> Vec<&'static str> {
        self.key_map
            .and_then(|map| map.get(&kind).cloned())
            .unwrap_or_else(|| default_visitor_keys(kind).to_vec())
    }

    fn enter(&mut self, node: &AstNode) -> VisitAction {
        self.visitor.enter(
            node,
            &VisitInfo {
                path: &self.path,
                ancestors: &self.ancestors,
            },
        )
    }

    fn leave(&mut self, node: &AstNode) -> VisitAction {
        self.visitor.leave(
            node,
            &VisitInfo {
                path: &self.path,
                ancestors: &self.ancestors,
            },
        )
    }

    /// Visit one node. `None` means the node was removed.
    fn traverse(&mut self, mut node: AstNode) -> Option<AstNode> {
        match self.enter(&node) {
            VisitAction::Continue => {}
            VisitAction::Skip => return Some(node),
            VisitAction::Break => {
                self.broken = true;
                return Some(node);
            }
            VisitAction::Remove => return None,
            VisitAction::Replace(new) => node = new,
        }
        node = self.walk_children(node);
        if self.broken {
            return Some(node);
        }
        match self.leave(&node) {
            VisitAction::Continue | VisitAction::Skip => Some(node),
            VisitAction::Break => {
                self.broken = true;
                Some(node)
            }
            VisitAction::Remove => None,
            VisitAction::Replace(new) => Some(new),
        }
    }

    /// Visit the children of each list item; removed items are dropped.
    fn walk_list<T: Clone>(
        &mut self,
        key: &'static str,
        items: &[T],
        to_node: impl Fn(&T) -> AstNode,
        from_node: impl Fn(AstNode) -> Option<T>,
    ) -> Vec<T> {
        self.path.push(PathKey::Key(key));
        let mut result = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if self.broken {
                result.push(item.clone());
                continue;
            }
            self.path.push(PathKey::Index(index));
            let visited = self.traverse(to_node(item));
            self.path.pop();
            if let Some(new) = visited {
                result.push(from_node(new).unwrap_or_else(|| incompatible_replacement("list item")));
            }
        }
        self.path.pop();
        result
    }

    /// Visit an optional single child; removal clears the slot.
    fn walk_opt<T: Clone>(
        &mut self,
        key: &'static str,
        item: &Option<T>,
        to_node: impl Fn(&T) -> AstNode,
        from_node: impl Fn(AstNode) -> Option<T>,
    ) -> Option<T> {
        let item = item.as_ref()?;
        if self.broken {
            return Some(item.clone());
        }
        self.path.push(PathKey::Key(key));
        let visited = self.traverse(to_node(item));
        self.path.pop();
        visited.map(|new| from_node(new).unwrap_or_else(|| incompatible_replacement("child node")))
    }

    /// Visit a required single child; removal is an error.
    fn walk_required<T: Clone>(
        &mut self,
        key: &'static str,
        item: &T,
        to_node: impl Fn(&T) -> AstNode,
        from_node: impl Fn(AstNode) -> Option<T>,
    ) -> T {
        if self.broken {
            return item.clone();
        }
        self.path.push(PathKey::Key(key));
        let visited = self.traverse(to_node(item));
        self.path.pop();
        match visited {
            Some(new) => from_node(new).unwrap_or_else(|| incompatible_replacement("child node")),
            None => incompatible_replacement("child node"),
        }
    }

    fn walk_directives(&mut self, directives: &Directives) -> Directives {
        Directives(self.walk_list(
            "directives",
            &directives.0,
            |dir| AstNode::Directive(dir.clone()),
            |node| match node {
                AstNode::Directive(dir) => Some(dir),
                _ => None,
            },
        ))
    }

    fn walk_selections(&mut self, selections: &[Selection]) -> Vec<Selection> {
        self.walk_list(
            "selection_set",
            selections,
            |selection| match selection {
                Selection::Field(node) => AstNode::Field(node.clone()),
                Selection::FragmentSpread(node) => AstNode::FragmentSpread(node.clone()),
                Selection::InlineFragment(node) => AstNode::InlineFragment(node.clone()),
            },
            |node| match node {
                AstNode::Field(field) => Some(Selection::Field(field)),
                AstNode::FragmentSpread(spread) => Some(Selection::FragmentSpread(spread)),
                AstNode::InlineFragment(inline) => Some(Selection::InlineFragment(inline)),
                _ => None,
            },
        )
    }

    fn walk_arguments(&mut self, arguments: &[Node<Argument>]) -> Vec<Node<Argument>> {
        self.walk_list(
            "arguments",
            arguments,
            |argument| AstNode::Argument(argument.clone()),
            |node| match node {
                AstNode::Argument(argument) => Some(argument),
                _ => None,
            },
        )
    }

    fn walk_variables(
        &mut self,
        variables: &[Node<VariableDefinition>],
    ) -> Vec<Node<VariableDefinition>> {
        self.walk_list(
            "variables",
            variables,
            |var| AstNode::VariableDefinition(var.clone()),
            |node| match node {
                AstNode::VariableDefinition(var) => Some(var),
                _ => None,
            },
        )
    }

    fn walk_field_definitions(
        &mut self,
        fields: &[Node<FieldDefinition>],
    ) -> Vec<Node<FieldDefinition>> {
        self.walk_list(
            "fields",
            fields,
            |field| AstNode::FieldDefinition(field.clone()),
            |node| match node {
                AstNode::FieldDefinition(field) => Some(field),
                _ => None,
            },
        )
    }

    fn walk_input_values(
        &mut self,
        key: &'static str,
        values: &[Node<InputValueDefinition>],
    ) -> Vec<Node<InputValueDefinition>> {
        self.walk_list(
            key,
            values,
            |value| AstNode::InputValueDefinition(value.clone()),
            |node| match node {
                AstNode::InputValueDefinition(value) => Some(value),
                _ => None,
            },
        )
    }

    fn walk_enum_values(
        &mut self,
        values: &[Node<EnumValueDefinition>],
    ) -> Vec<Node<EnumValueDefinition>> {
        self.walk_list(
            "values",
            values,
            |value| AstNode::EnumValueDefinition(value.clone()),
            |node| match node {
                AstNode::EnumValueDefinition(value) => Some(value),
                _ => None,
            },
        )
    }

    fn walk_value_slot(&mut self, key: &'static str, value: &Option<Node<Value>>) -> Option<Node<Value>> {
        self.walk_opt(
            key,
            value,
            |value| AstNode::Value(value.clone()),
            |node| match node {
                AstNode::Value(value) => Some(value),
                _ => None,
            },
        )
    }

    fn walk_type(&mut self, ty: &Type) -> Type {
        self.walk_required(
            "type",
            ty,
            |ty| AstNode::Type(ty.clone()),
            |node| match node {
                AstNode::Type(ty) => Some(ty),
                _ => None,
            },
        )
    }

    fn walk_children(&mut self, node: AstNode) -> AstNode {
        self.ancestors.push(node.clone());
        let result = self.walk_children_inner(node);
        self.ancestors.pop();
        result
    }

    fn walk_children_inner(&mut self, node: AstNode) -> AstNode {
        let kind = node.kind();
        match node {
            AstNode::Document(mut document) => {
                for key in self.keys(kind) {
                    if key == "definitions" {
                        document.definitions = self.walk_list(
                            "definitions",
                            &document.definitions,
                            definition_to_node,
                            node_to_definition,
                        );
                    }
                }
                AstNode::Document(document)
            }
            AstNode::Operation(mut operation) => {
                for key in self.keys(kind) {
                    match key {
                        "variables" => {
                            let new = self.walk_variables(&operation.variables);
                            operation.make_mut().variables = new;
                        }
                        "directives" => {
                            let new = self.walk_directives(&operation.directives);
                            operation.make_mut().directives = new;
                        }
                        "selection_set" => {
                            let new = self.walk_selections(&operation.selection_set);
                            operation.make_mut().selection_set = new;
                        }
                        _ => {}
                    }
                }
                AstNode::Operation(operation)
            }
            AstNode::Fragment(mut fragment) => {
                for key in self.keys(kind) {
                    match key {
                        "variables" => {
                            let new = self.walk_variables(&fragment.variables);
                            fragment.make_mut().variables = new;
                        }
                        "directives" => {
                            let new = self.walk_directives(&fragment.directives);
                            fragment.make_mut().directives = new;
                        }
                        "selection_set" => {
                            let new = self.walk_selections(&fragment.selection_set);
                            fragment.make_mut().selection_set = new;
                        }
                        _ => {}
                    }
                }
                AstNode::Fragment(fragment)
            }
            AstNode::Field(mut field) => {
                for key in self.keys(kind) {
                    match key {
                        "arguments" => {
                            let new = self.walk_arguments(&field.arguments);
                            field.make_mut().arguments = new;
                        }
                        "directives" => {
                            let new = self.walk_directives(&field.directives);
                            field.make_mut().directives = new;
                        }
                        "selection_set" => {
                            let new = self.walk_selections(&field.selection_set);
                            field.make_mut().selection_set = new;
                        }
                        _ => {}
                    }
                }
                AstNode::Field(field)
            }
            AstNode::FragmentSpread(mut spread) => {
                for key in self.keys(kind) {
                    if key == "directives" {
                        let new = self.walk_directives(&spread.directives);
                        spread.make_mut().directives = new;
                    }
                }
                AstNode::FragmentSpread(spread)
            }
            AstNode::InlineFragment(mut inline) => {
                for key in self.keys(kind) {
                    match key {
                        "directives" => {
                            let new = self.walk_directives(&inline.directives);
                            inline.make_mut().directives = new;
                        }
                        "selection_set" => {
                            let new = self.walk_selections(&inline.selection_set);
                            inline.make_mut().selection_set = new;
                        }
                        _ => {}
                    }
                }
                AstNode::InlineFragment(inline)
            }
            AstNode::VariableDefinition(mut variable) => {
                for key in self.keys(kind) {
                    match key {
                        "type" => {
                            let new = self.walk_type(&variable.ty);
                            variable.make_mut().ty = new;
                        }
                        "default_value" => {
                            let new = self.walk_value_slot("default_value", &variable.default_value);
                            variable.make_mut().default_value = new;
                        }
                        "directives" => {
                            let new = self.walk_directives(&variable.directives);
                            variable.make_mut().directives = new;
                        }
                        _ => {}
                    }
                }
                AstNode::VariableDefinition(variable)
            }
            AstNode::Argument(mut argument) => {
                for key in self.keys(kind) {
                    if key == "value" {
                        let new = self.walk_required(
                            "value",
                            &argument.value,
                            |value| AstNode::Value(value.clone()),
                            |node| match node {
                                AstNode::Value(value) => Some(value),
                                _ => None,
                            },
                        );
                        argument.make_mut().value = new;
                    }
                }
                AstNode::Argument(argument)
            }
            AstNode::Directive(mut directive) => {
                for key in self.keys(kind) {
                    if key == "arguments" {
                        let new = self.walk_arguments(&directive.arguments);
                        directive.make_mut().arguments = new;
                    }
                }
                AstNode::Directive(directive)
            }
            AstNode::Value(mut value) => {
                for key in self.keys(kind) {
                    if key == "values" {
                        match &*value {
                            Value::List(items) => {
                                let new = self.walk_list(
                                    "values",
                                    items,
                                    |item| AstNode::Value(item.clone()),
                                    |node| match node {
                                        AstNode::Value(item) => Some(item),
                                        _ => None,
                                    },
                                );
                                *value.make_mut() = Value::List(new);
                            }
                            Value::Object(fields) => {
                                let entries: Vec<(Name, Node<Value>)> = fields.clone();
                                self.path.push(PathKey::Key("values"));
                                let mut new = Vec::with_capacity(entries.len());
                                for (index, (name, item)) in entries.into_iter().enumerate() {
                                    if self.broken {
                                        new.push((name, item));
                                        continue;
                                    }
                                    self.path.push(PathKey::Index(index));
                                    let visited = self.traverse(AstNode::Value(item));
                                    self.path.pop();
                                    match visited {
                                        Some(AstNode::Value(item)) => new.push((name, item)),
                                        Some(_) => incompatible_replacement("value"),
                                        // Removing the value drops the whole object field
                                        None => {}
                                    }
                                }
                                self.path.pop();
                                *value.make_mut() = Value::Object(new);
                            }
                            _ => {}
                        }
                    }
                }
                AstNode::Value(value)
            }
            AstNode::Type(ty) => {
                for key in self.keys(kind) {
                    if key == "type" {
                        match &ty {
                            Type::List(inner) => {
                                let new = self.walk_type(inner);
                                return AstNode::Type(Type::List(Box::new(new)));
                            }
                            Type::NonNullList(inner) => {
                                let new = self.walk_type(inner);
                                return AstNode::Type(Type::NonNullList(Box::new(new)));
                            }
                            Type::Named(_) | Type::NonNullNamed(_) => {}
                        }
                    }
                }
                AstNode::Type(ty)
            }
            AstNode::SchemaDefinition(mut def) => {
                for key in self.keys(kind) {
                    if key == "directives" {
                        let new = self.walk_directives(&def.directives);
                        def.make_mut().directives = new;
                    }
                }
                AstNode::SchemaDefinition(def)
            }
            AstNode::ScalarDefinition(mut def) => {
                for key in self.keys(kind) {
                    if key == "directives" {
                        let new = self.walk_directives(&def.directives);
                        def.make_mut().directives = new;
                    }
                }
                AstNode::ScalarDefinition(def)
            }
            AstNode::ObjectDefinition(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        "fields" => {
                            let new = self.walk_field_definitions(&def.fields);
                            def.make_mut().fields = new;
                        }
                        _ => {}
                    }
                }
                AstNode::ObjectDefinition(def)
            }
            AstNode::InterfaceDefinition(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        "fields" => {
                            let new = self.walk_field_definitions(&def.fields);
                            def.make_mut().fields = new;
                        }
                        _ => {}
                    }
                }
                AstNode::InterfaceDefinition(def)
            }
            AstNode::UnionDefinition(mut def) => {
                for key in self.keys(kind) {
                    if key == "directives" {
                        let new = self.walk_directives(&def.directives);
                        def.make_mut().directives = new;
                    }
                }
                AstNode::UnionDefinition(def)
            }
            AstNode::EnumDefinition(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        "values" => {
                            let new = self.walk_enum_values(&def.values);
                            def.make_mut().values = new;
                        }
                        _ => {}
                    }
                }
                AstNode::EnumDefinition(def)
            }
            AstNode::EnumValueDefinition(mut def) => {
                for key in self.keys(kind) {
                    if key == "directives" {
                        let new = self.walk_directives(&def.directives);
                        def.make_mut().directives = new;
                    }
                }
                AstNode::EnumValueDefinition(def)
            }
            AstNode::InputObjectDefinition(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        "fields" => {
                            let new = self.walk_input_values("fields", &def.fields);
                            def.make_mut().fields = new;
                        }
                        _ => {}
                    }
                }
                AstNode::InputObjectDefinition(def)
            }
            AstNode::FieldDefinition(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "arguments" => {
                            let new = self.walk_input_values("arguments", &def.arguments);
                            def.make_mut().arguments = new;
                        }
                        "type" => {
                            let new = self.walk_type(&def.ty);
                            def.make_mut().ty = new;
                        }
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        _ => {}
                    }
                }
                AstNode::FieldDefinition(def)
            }
            AstNode::InputValueDefinition(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "type" => {
                            let new = self.walk_type(&def.ty);
                            def.make_mut().ty = new;
                        }
                        "default_value" => {
                            let new = self.walk_value_slot("default_value", &def.default_value);
                            def.make_mut().default_value = new;
                        }
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        _ => {}
                    }
                }
                AstNode::InputValueDefinition(def)
            }
            AstNode::DirectiveDefinition(mut def) => {
                for key in self.keys(kind) {
                    if key == "arguments" {
                        let new = self.walk_input_values("arguments", &def.arguments);
                        def.make_mut().arguments = new;
                    }
                }
                AstNode::DirectiveDefinition(def)
            }
            AstNode::SchemaExtension(mut def) => {
                for key in self.keys(kind) {
                    if key == "directives" {
                        let new = self.walk_directives(&def.directives);
                        def.make_mut().directives = new;
                    }
                }
                AstNode::SchemaExtension(def)
            }
            AstNode::ScalarExtension(mut def) => {
                for key in self.keys(kind) {
                    if key == "directives" {
                        let new = self.walk_directives(&def.directives);
                        def.make_mut().directives = new;
                    }
                }
                AstNode::ScalarExtension(def)
            }
            AstNode::ObjectExtension(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        "fields" => {
                            let new = self.walk_field_definitions(&def.fields);
                            def.make_mut().fields = new;
                        }
                        _ => {}
                    }
                }
                AstNode::ObjectExtension(def)
            }
            AstNode::InterfaceExtension(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        "fields" => {
                            let new = self.walk_field_definitions(&def.fields);
                            def.make_mut().fields = new;
                        }
                        _ => {}
                    }
                }
                AstNode::InterfaceExtension(def)
            }
            AstNode::UnionExtension(mut def) => {
                for key in self.keys(kind) {
                    if key == "directives" {
                        let new = self.walk_directives(&def.directives);
                        def.make_mut().directives = new;
                    }
                }
                AstNode::UnionExtension(def)
            }
            AstNode::EnumExtension(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        "values" => {
                            let new = self.walk_enum_values(&def.values);
                            def.make_mut().values = new;
                        }
                        _ => {}
                    }
                }
                AstNode::EnumExtension(def)
            }
            AstNode::InputObjectExtension(mut def) => {
                for key in self.keys(kind) {
                    match key {
                        "directives" => {
                            let new = self.walk_directives(&def.directives);
                            def.make_mut().directives = new;
                        }
                        "fields" => {
                            let new = self.walk_input_values("fields", &def.fields);
                            def.make_mut().fields = new;
                        }
                        _ => {}
                    }
                }
                AstNode::InputObjectExtension(def)
            }
        }
    }
}

fn definition_to_node(definition: &Definition) -> AstNode {
    match definition {
        Definition::OperationDefinition(def) => AstNode::Operation(def.clone()),
        Definition::FragmentDefinition(def) => AstNode::Fragment(def.clone()),
        Definition::DirectiveDefinition(def) => AstNode::DirectiveDefinition(def.clone()),
        Definition::SchemaDefinition(def) => AstNode::SchemaDefinition(def.clone()),
        Definition::ScalarTypeDefinition(def) => AstNode::ScalarDefinition(def.clone()),
        Definition::ObjectTypeDefinition(def) => AstNode::ObjectDefinition(def.clone()),
        Definition::InterfaceTypeDefinition(def) => AstNode::InterfaceDefinition(def.clone()),
        Definition::UnionTypeDefinition(def) => AstNode::UnionDefinition(def.clone()),
        Definition::EnumTypeDefinition(def) => AstNode::EnumDefinition(def.clone()),
        Definition::InputObjectTypeDefinition(def) => AstNode::InputObjectDefinition(def.clone()),
        Definition::SchemaExtension(def) => AstNode::SchemaExtension(def.clone()),
        Definition::ScalarTypeExtension(def) => AstNode::ScalarExtension(def.clone()),
        Definition::ObjectTypeExtension(def) => AstNode::ObjectExtension(def.clone()),
        Definition::InterfaceTypeExtension(def) => AstNode::InterfaceExtension(def.clone()),
        Definition::UnionTypeExtension(def) => AstNode::UnionExtension(def.clone()),
        Definition::EnumTypeExtension(def) => AstNode::EnumExtension(def.clone()),
        Definition::InputObjectTypeExtension(def) => AstNode::InputObjectExtension(def.clone()),
    }
}

fn node_to_definition(node: AstNode) -> Option<Definition> {
    Some(match node {
        AstNode::Operation(def) => Definition::OperationDefinition(def),
        AstNode::Fragment(def) => Definition::FragmentDefinition(def),
        AstNode::DirectiveDefinition(def) => Definition::DirectiveDefinition(def),
        AstNode::SchemaDefinition(def) => Definition::SchemaDefinition(def),
        AstNode::ScalarDefinition(def) => Definition::ScalarTypeDefinition(def),
        AstNode::ObjectDefinition(def) => Definition::ObjectTypeDefinition(def),
        AstNode::InterfaceDefinition(def) => Definition::InterfaceTypeDefinition(def),
        AstNode::UnionDefinition(def) => Definition::UnionTypeDefinition(def),
        AstNode::EnumDefinition(def) => Definition::EnumTypeDefinition(def),
        AstNode::InputObjectDefinition(def) => Definition::InputObjectTypeDefinition(def),
        AstNode::SchemaExtension(def) => Definition::SchemaExtension(def),
        AstNode::ScalarExtension(def) => Definition::ScalarTypeExtension(def),
        AstNode::ObjectExtension(def) => Definition::ObjectTypeExtension(def),
        AstNode::InterfaceExtension(def) => Definition::InterfaceTypeExtension(def),
        AstNode::UnionExtension(def) => Definition::UnionTypeExtension(def),
        AstNode::EnumExtension(def) => Definition::EnumTypeExtension(def),
        AstNode::InputObjectExtension(def) => Definition::InputObjectTypeExtension(def),
        _ => return None,
    })
}

/// Fans one traversal out to many visitors.
///
/// Each visitor keeps its own skip/break bookkeeping: once a visitor skips a
/// subtree it receives no events under it, and once it breaks it receives no
/// further events at all. The traversal itself only terminates once every
/// visitor has broken.
pub struct ParallelVisitor<'v> {
    visitors: Vec<Box<dyn Visitor + 'v>>,
    states: Vec<ParallelState>,
}

#[derive(Clone, Copy, Default)]
struct ParallelState {
    /// Depth (path length) of the node whose subtree this visitor skipped
    skipping_at: Option<usize>,
    broken: bool,
}

impl<'v> ParallelVisitor<'v> {
    pub fn new(visitors: Vec<Box<dyn Visitor + 'v>>) -> Self {
        let states = vec![ParallelState::default(); visitors.len()];
        Self { visitors, states }
    }
}

impl Visitor for ParallelVisitor<'_> {
    fn enter(&mut self, node: &AstNode, info: &VisitInfo<'_>) -> VisitAction {
        let depth = info.path.len();
        let mut edit = None;
        for (visitor, state) in self.visitors.iter_mut().zip(&mut self.states) {
            if state.broken || state.skipping_at.is_some() {
                continue;
            }
            match visitor.enter(node, info) {
                VisitAction::Continue => {}
                VisitAction::Skip => state.skipping_at = Some(depth),
                VisitAction::Break => state.broken = true,
                action @ (VisitAction::Remove | VisitAction::Replace(_)) => {
                    if edit.is_none() {
                        edit = Some(action);
                    }
                }
            }
        }
        if self.states.iter().all(|state| state.broken) {
            return VisitAction::Break;
        }
        edit.unwrap_or(VisitAction::Continue)
    }

    fn leave(&mut self, node: &AstNode, info: &VisitInfo<'_>) -> VisitAction {
        let depth = info.path.len();
        let mut edit = None;
        for (visitor, state) in self.visitors.iter_mut().zip(&mut self.states) {
            if state.broken {
                continue;
            }
            if let Some(skip_depth) = state.skipping_at {
                if skip_depth == depth {
                    // This is the leave event of the skipped node itself
                    state.skipping_at = None;
                }
                continue;
            }
            match visitor.leave(node, info) {
                VisitAction::Continue | VisitAction::Skip => {}
                VisitAction::Break => state.broken = true,
                action @ (VisitAction::Remove | VisitAction::Replace(_)) => {
                    if edit.is_none() {
                        edit = Some(action);
                    }
                }
            }
        }
        if self.states.iter().all(|state| state.broken) {
            return VisitAction::Break;
        }
        edit.unwrap_or(VisitAction::Continue)
    }
}
