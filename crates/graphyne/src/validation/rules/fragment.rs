use crate::validation::ValidationContext;
use graphyne_parser::ast::Selection;
use graphyne_parser::visitor::AstNode;
use graphyne_parser::visitor::VisitAction;
use graphyne_parser::visitor::VisitInfo;
use graphyne_parser::visitor::Visitor;
use graphyne_parser::Name;
use std::collections::HashSet;

/// Fragment names are unique within a document.
pub(crate) struct UniqueFragmentNames<'a> {
    ctx: &'a ValidationContext<'a>,
    known: HashSet<Name>,
}

impl<'a> UniqueFragmentNames<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self {
            ctx,
            known: HashSet::new(),
        }
    }
}

impl Visitor for UniqueFragmentNames<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Fragment(fragment) = node {
            if !self.known.insert(fragment.name.clone()) {
                self.ctx.report(
                    format!("there can be only one fragment named \"{}\"", fragment.name),
                    fragment.name.location().or(fragment.location()),
                );
            }
            return VisitAction::Skip;
        }
        VisitAction::Continue
    }
}

/// Every spread fragment is defined.
pub(crate) struct KnownFragmentNames<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> KnownFragmentNames<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Visitor for KnownFragmentNames<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::FragmentSpread(spread) = node {
            if !self.ctx.fragments.contains_key(spread.fragment_name.as_str()) {
                self.ctx.report(
                    format!("unknown fragment \"{}\"", spread.fragment_name),
                    spread.fragment_name.location().or(spread.location()),
                );
            }
        }
        VisitAction::Continue
    }
}

/// Fragment type conditions are object, interface, or union types.
pub(crate) struct FragmentsOnCompositeTypes<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> FragmentsOnCompositeTypes<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    fn check(&self, condition: &Name, on_fragment: Option<&Name>) {
        match self.ctx.schema.types.get(condition.as_str()) {
            Some(ty) if ty.is_composite() => {}
            // Unknown types are reported by known_type_names
            None => {}
            Some(_) => {
                let message = match on_fragment {
                    Some(name) => format!(
                        "fragment \"{name}\" cannot condition \
                         on non composite type \"{condition}\""
                    ),
                    None => format!(
                        "fragments cannot condition on non composite type \"{condition}\""
                    ),
                };
                self.ctx.report(message, condition.location());
            }
        }
    }
}

impl Visitor for FragmentsOnCompositeTypes<'_> {
    fn enter(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        match node {
            AstNode::Fragment(fragment) => {
                self.check(&fragment.type_condition, Some(&fragment.name));
            }
            AstNode::InlineFragment(inline) => {
                if let Some(condition) = &inline.type_condition {
                    self.check(condition, None);
                }
            }
            _ => {}
        }
        VisitAction::Continue
    }
}

/// Every defined fragment is reachable from some operation.
pub(crate) struct NoUnusedFragments<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> NoUnusedFragments<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    fn reachable(&self, selections: &[Selection], used: &mut HashSet<Name>) {
        for selection in selections {
            match selection {
                Selection::Field(field) => self.reachable(&field.selection_set, used),
                Selection::InlineFragment(inline) => {
                    self.reachable(&inline.selection_set, used)
                }
                Selection::FragmentSpread(spread) => {
                    if used.insert(spread.fragment_name.clone()) {
                        if let Some(fragment) =
                            self.ctx.fragments.get(spread.fragment_name.as_str())
                        {
                            self.reachable(&fragment.selection_set, used);
                        }
                    }
                }
            }
        }
    }
}

impl Visitor for NoUnusedFragments<'_> {
    fn leave(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Document(document) = node {
            let mut used = HashSet::new();
            for operation in document.operations() {
                self.reachable(&operation.selection_set, &mut used);
            }
            for fragment in document.fragments() {
                if !used.contains(&fragment.name) {
                    self.ctx.report(
                        format!("fragment \"{}\" is never used", fragment.name),
                        fragment.location(),
                    );
                }
            }
        }
        VisitAction::Continue
    }
}

/// Spreading fragments must not form cycles.
pub(crate) struct NoFragmentCycles<'a> {
    ctx: &'a ValidationContext<'a>,
}

impl<'a> NoFragmentCycles<'a> {
    pub(crate) fn new(ctx: &'a ValidationContext<'a>) -> Self {
        Self { ctx }
    }

    fn spreads(selections: &[Selection], out: &mut Vec<Name>) {
        for selection in selections {
            match selection {
                Selection::Field(field) => Self::spreads(&field.selection_set, out),
                Selection::InlineFragment(inline) => Self::spreads(&inline.selection_set, out),
                Selection::FragmentSpread(spread) => out.push(spread.fragment_name.clone()),
            }
        }
    }

    fn detect(
        &self,
        name: &Name,
        visited: &mut HashSet<Name>,
        stack: &mut Vec<Name>,
        reported: &mut HashSet<Name>,
    ) {
        if let Some(position) = stack.iter().position(|on_stack| on_stack == name) {
            if reported.insert(name.clone()) {
                let via: Vec<&str> = stack[position + 1..]
                    .iter()
                    .map(Name::as_str)
                    .collect();
                let message = if via.is_empty() {
                    format!("cannot spread fragment \"{name}\" within itself")
                } else {
                    format!(
                        "cannot spread fragment \"{name}\" within itself via {}",
                        via.join(", ")
                    )
                };
                let location = self
                    .ctx
                    .fragments
                    .get(name.as_str())
                    .and_then(|fragment| fragment.location());
                self.ctx.report(message, location);
            }
            return;
        }
        if !visited.insert(name.clone()) {
            return;
        }
        let Some(fragment) = self.ctx.fragments.get(name.as_str()) else {
            return;
        };
        let mut nested = Vec::new();
        Self::spreads(&fragment.selection_set, &mut nested);
        stack.push(name.clone());
        for spread in &nested {
            self.detect(spread, visited, stack, reported);
        }
        stack.pop();
    }
}

impl Visitor for NoFragmentCycles<'_> {
    fn leave(&mut self, node: &AstNode, _info: &VisitInfo<'_>) -> VisitAction {
        if let AstNode::Document(_) = node {
            let mut visited = HashSet::new();
            let mut reported = HashSet::new();
            for name in self.ctx.fragments.keys() {
                self.detect(name, &mut visited, &mut Vec::new(), &mut reported);
            }
        }
        VisitAction::Continue
    }
}
