//! Rule-driven validation of executable documents against a schema.
//!
//! Every rule is a visitor; the validator runs them all over a single
//! traversal through a [`ParallelVisitor`], wrapped by a
//! [`TypeInfoVisitor`][type_info::TypeInfoVisitor] that maintains the
//! schema-derived context rules query.

pub(crate) mod rules;
pub(crate) mod type_info;

use crate::execution::GraphQLError;
use crate::Schema;
use crate::SourceMap;
use graphyne_parser::ast;
use graphyne_parser::visitor;
use graphyne_parser::visitor::ParallelVisitor;
use graphyne_parser::visitor::Visitor;
use graphyne_parser::Name;
use graphyne_parser::Node;
use graphyne_parser::SourceSpan;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::sync::Arc;

use self::type_info::TypeInfo;
use self::type_info::TypeInfoVisitor;

/// A value of type `T` that was validated.
///
/// The executor only accepts `Valid<Schema>` and `Valid<ExecutableDocument>`;
/// this wrapper is how validity travels through APIs without re-checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Valid<T>(pub(crate) T);

impl<T> Valid<T> {
    /// Declare the value valid without running validation.
    ///
    /// Execution with an invalid schema or document may produce unexpected
    /// field errors, but no memory unsafety.
    pub fn assume_valid(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Valid<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Valid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything a validation rule may consult, shared by all rules of one run.
pub struct ValidationContext<'a> {
    pub(crate) schema: &'a Valid<Schema>,
    pub(crate) document: &'a ast::Document,
    pub(crate) fragments: IndexMap<Name, Node<ast::FragmentDefinition>>,
    pub(crate) sources: SourceMap,
    pub(crate) type_info: RefCell<TypeInfo<'a>>,
    pub(crate) errors: RefCell<Vec<GraphQLError>>,
}

impl<'a> ValidationContext<'a> {
    fn new(schema: &'a Valid<Schema>, document: &'a ast::Document) -> Self {
        let mut sources = (*schema.sources).clone();
        if let Some((file_id, source)) = &document.source {
            sources.insert(*file_id, source.clone());
        }
        let fragments = document
            .fragments()
            .map(|fragment| (fragment.name.clone(), fragment.clone()))
            .collect();
        Self {
            schema,
            document,
            fragments,
            sources: Arc::new(sources),
            type_info: RefCell::new(TypeInfo::new(schema)),
            errors: RefCell::new(Vec::new()),
        }
    }

    /// Record a validation error.
    pub(crate) fn report(&self, message: impl Into<String>, location: Option<SourceSpan>) {
        self.errors
            .borrow_mut()
            .push(GraphQLError::new(message, location, &self.sources));
    }
}

/// A validation rule: builds the rule's visitor for one run.
pub type Rule = for<'a> fn(&'a ValidationContext<'a>) -> Box<dyn Visitor + 'a>;

/// The rules `validate` runs by default.
pub fn specified_rules() -> Vec<Rule> {
    vec![
        |ctx| Box::new(rules::ExecutableDefinitions::new(ctx)),
        |ctx| Box::new(rules::UniqueOperationNames::new(ctx)),
        |ctx| Box::new(rules::LoneAnonymousOperation::new(ctx)),
        |ctx| Box::new(rules::SingleFieldSubscriptions::new(ctx)),
        |ctx| Box::new(rules::KnownTypeNames::new(ctx)),
        |ctx| Box::new(rules::FragmentsOnCompositeTypes::new(ctx)),
        |ctx| Box::new(rules::VariablesAreInputTypes::new(ctx)),
        |ctx| Box::new(rules::FieldsOnCorrectType::new(ctx)),
        |ctx| Box::new(rules::UniqueFragmentNames::new(ctx)),
        |ctx| Box::new(rules::KnownFragmentNames::new(ctx)),
        |ctx| Box::new(rules::NoUnusedFragments::new(ctx)),
        |ctx| Box::new(rules::NoFragmentCycles::new(ctx)),
        |ctx| Box::new(rules::UniqueVariableNames::new(ctx)),
        |ctx| Box::new(rules::NoUndefinedVariables::new(ctx)),
        |ctx| Box::new(rules::NoUnusedVariables::new(ctx)),
        |ctx| Box::new(rules::KnownDirectives::new(ctx)),
        |ctx| Box::new(rules::UniqueDirectivesPerLocation::new(ctx)),
        |ctx| Box::new(rules::KnownArgumentNames::new(ctx)),
        |ctx| Box::new(rules::UniqueArgumentNames::new(ctx)),
        |ctx| Box::new(rules::ValuesOfCorrectType::new(ctx)),
        |ctx| Box::new(rules::ProvidedRequiredArguments::new(ctx)),
        |ctx| Box::new(rules::VariablesInAllowedPosition::new(ctx)),
        |ctx| Box::new(rules::OverlappingFieldsCanBeMerged::new(ctx)),
        |ctx| Box::new(rules::UniqueInputFieldNames::new(ctx)),
    ]
}

/// Validate an executable document against a schema with the default rules.
///
/// All rules run in one traversal; the full error list is returned and an
/// empty list means the document is valid. Validation is pure: for a fixed
/// schema and document, the same errors are produced regardless of rule
/// order.
pub fn validate(schema: &Valid<Schema>, document: &ast::Document) -> Vec<GraphQLError> {
    validate_with_rules(schema, document, &specified_rules())
}

/// Validate with a custom rule set.
pub fn validate_with_rules(
    schema: &Valid<Schema>,
    document: &ast::Document,
    rules: &[Rule],
) -> Vec<GraphQLError> {
    let ctx = ValidationContext::new(schema, document);
    let rule_visitors = rules.iter().map(|rule| rule(&ctx)).collect();
    let mut traversal = TypeInfoVisitor {
        ctx: &ctx,
        inner: ParallelVisitor::new(rule_visitors),
    };
    visitor::visit(document, &mut traversal);
    drop(traversal);
    let errors = std::mem::take(&mut *ctx.errors.borrow_mut());
    errors
}
