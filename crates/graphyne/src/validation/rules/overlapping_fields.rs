//! Fields that share a response key must be able to merge: same field name
//! and arguments when they can apply to the same object, and compatible
//! response shapes always.
//!
//! <https://spec.graphql.org/October2021/#sec-Field-Selection-Merging>

use crate::schema::ExtendedType;
use crate::validation::ValidationContext;
use graphyne_parser::ast;
use graphyne_parser::ast::Selection;
use graphyne_parser::ast::Type;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;
use graphyne_parser::Name;
use graphyne_parser::Node;
use indexmap::IndexMap;
use std::collections::HashSet;

pub(crate) struct OverlappingFieldsCanBeMerged<'a> {
    ctx: &'a ValidationContext<'a>,
}

/// One occurrence of a response key: the field, the type it was selected on,
/// and its definition when the schema knows it.
#[derive(Clone)]
struct FieldContext {
    parent: Option<Name>,
    field: Node<ast::Field>,
    definition: Option<Node<ast::FieldDefinition>>,
}

impl<'a> OverlappingFieldsCanBeMerged<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    fn check_selection_set(&self, parent: Option<&Name>, selections: &[Selection]) {
        let mut field_map = IndexMap::new();
        self.collect(parent, selections, &mut HashSet::new(), &mut field_map);
        self.check_map(&field_map, false);
        // Each field's own selection set is checked on its own type too
        for group in field_map.values() {
            for context in group {
                if !context.field.selection_set.is_empty() {
                    let child = context
                        .definition
                        .as_ref()
                        .map(|definition| definition.ty.inner_named_type().clone());
                    self.check_selection_set(child.as_ref(), &context.field.selection_set);
                }
            }
        }
    }

    fn collect(
        &self,
        parent: Option<&Name>,
        selections: &[Selection],
        visited: &mut HashSet<Name>,
        field_map: &mut IndexMap<Name, Vec<FieldContext>>,
    ) {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    let definition = parent.and_then(|parent| {
                        self.ctx
                            .schema
                            .type_field(parent.as_str(), field.name.as_str())
                            .ok()
                            .cloned()
                    });
                    field_map
                        .entry(field.response_key().clone())
                        .or_default()
                        .push(FieldContext {
                            parent: parent.cloned(),
                            field: field.clone(),
                            definition,
                        });
                }
                Selection::InlineFragment(inline) => {
                    let condition = inline.type_condition.as_ref().or(parent);
                    self.collect(condition, &inline.selection_set, visited, field_map);
                }
                Selection::FragmentSpread(spread) => {
                    if !visited.insert(spread.fragment_name.clone()) {
                        continue;
                    }
                    if let Some(fragment) = self.ctx.fragments.get(spread.fragment_name.as_str())
                    {
                        self.collect(
                            Some(&fragment.type_condition),
                            &fragment.selection_set,
                            visited,
                            field_map,
                        );
                    }
                }
            }
        }
    }

    fn check_map(&self, field_map: &IndexMap<Name, Vec<FieldContext>>, parents_exclusive: bool) {
        for (response_key, group) in field_map {
            for (index, a) in group.iter().enumerate() {
                for b in &group[index + 1..] {
                    self.find_conflict(response_key, a, b, parents_exclusive);
                }
            }
        }
    }

    /// Two occurrences can never apply to the same object when both parent
    /// types are distinct concrete objects.
    fn exclusive_parents(&self, a: &FieldContext, b: &FieldContext) -> bool {
        match (&a.parent, &b.parent) {
            (Some(a), Some(b)) if a != b => {
                let object = |name: &Name| {
                    matches!(
                        self.ctx.schema.types.get(name.as_str()),
                        Some(ExtendedType::Object(_))
                    )
                };
                object(a) && object(b)
            }
            _ => false,
        }
    }

    fn find_conflict(
        &self,
        response_key: &Name,
        a: &FieldContext,
        b: &FieldContext,
        parents_exclusive: bool,
    ) {
        let exclusive = parents_exclusive || self.exclusive_parents(a, b);
        let location = a.field.location().or(b.field.location());
        if !exclusive {
            if a.field.name != b.field.name {
                self.ctx.report(
                    format!(
                        "fields \"{response_key}\" conflict because \"{}\" and \"{}\" \
                         are different fields; consider using different aliases",
                        a.field.name, b.field.name
                    ),
                    location,
                );
                return;
            }
            if !same_arguments(&a.field.arguments, &b.field.arguments) {
                self.ctx.report(
                    format!(
                        "fields \"{response_key}\" conflict because \
                         they have differing arguments; \
                         consider using different aliases"
                    ),
                    location,
                );
                return;
            }
        }
        if let (Some(a_def), Some(b_def)) = (&a.definition, &b.definition) {
            if self.types_conflict(&a_def.ty, &b_def.ty) {
                self.ctx.report(
                    format!(
                        "fields \"{response_key}\" conflict because they return \
                         conflicting types \"{}\" and \"{}\"; \
                         consider using different aliases",
                        a_def.ty, b_def.ty
                    ),
                    location,
                );
                return;
            }
        }
        if !a.field.selection_set.is_empty() || !b.field.selection_set.is_empty() {
            let mut merged = IndexMap::new();
            let mut visited = HashSet::new();
            let a_child = a
                .definition
                .as_ref()
                .map(|definition| definition.ty.inner_named_type().clone());
            let b_child = b
                .definition
                .as_ref()
                .map(|definition| definition.ty.inner_named_type().clone());
            self.collect(
                a_child.as_ref(),
                &a.field.selection_set,
                &mut visited,
                &mut merged,
            );
            self.collect(
                b_child.as_ref(),
                &b.field.selection_set,
                &mut visited,
                &mut merged,
            );
            self.check_map(&merged, exclusive);
        }
    }

    /// Whether two types can never produce values of the same shape:
    /// differing nullability or list depth always conflicts, and differing
    /// leaf types conflict. Two composite types leave the decision to the
    /// merged sub-selections.
    fn types_conflict(&self, a: &Type, b: &Type) -> bool {
        match (a, b) {
            (Type::Named(a_name), Type::Named(b_name))
            | (Type::NonNullNamed(a_name), Type::NonNullNamed(b_name)) => {
                let leaf = |name: &Name| {
                    matches!(
                        self.ctx.schema.types.get(name.as_str()),
                        Some(ExtendedType::Scalar(_) | ExtendedType::Enum(_)) | None
                    )
                };
                if leaf(a_name) || leaf(b_name) {
                    a_name != b_name
                } else {
                    false
                }
            }
            (Type::List(a_inner), Type::List(b_inner))
            | (Type::NonNullList(a_inner), Type::NonNullList(b_inner)) => {
                self.types_conflict(a_inner, b_inner)
            }
            _ => true,
        }
    }
}

fn same_arguments(a: &[Node<ast::Argument>], b: &[Node<ast::Argument>]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|argument| {
        b.iter()
            .any(|other| other.name == argument.name && other.value == argument.value)
    })
}

impl Visitor for OverlappingFieldsCanBeMerged<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        match node {
            AstNode::Operation(operation) => {
                let parent = self
                    .ctx
                    .schema
                    .root_operation(operation.operation_type)
                    .cloned();
                self.check_selection_set(parent.as_ref(), &operation.selection_set);
                VisitAction::Skip
            }
            AstNode::Fragment(fragment) => {
                self.check_selection_set(
                    Some(&fragment.type_condition),
                    &fragment.selection_set,
                );
                VisitAction::Skip
            }
            _ => VisitAction::Continue,
        }
    }
}
