//! The specified validation rules, each implemented as a visitor.

mod argument;
mod directive;
mod executable;
mod field;
mod fragment;
mod operation;
mod overlapping_fields;
mod type_names;
mod usages;
mod value;
mod variable;

pub(crate) use self::argument::KnownArgumentNames;
pub(crate) use self::argument::ProvidedRequiredArguments;
pub(crate) use self::argument::UniqueArgumentNames;
pub(crate) use self::directive::KnownDirectives;
pub(crate) use self::directive::UniqueDirectivesPerLocation;
pub(crate) use self::executable::ExecutableDefinitions;
pub(crate) use self::field::FieldsOnCorrectType;
pub(crate) use self::fragment::FragmentsOnCompositeTypes;
pub(crate) use self::fragment::KnownFragmentNames;
pub(crate) use self::fragment::NoFragmentCycles;
pub(crate) use self::fragment::NoUnusedFragments;
pub(crate) use self::fragment::UniqueFragmentNames;
pub(crate) use self::operation::LoneAnonymousOperation;
pub(crate) use self::operation::SingleFieldSubscriptions;
pub(crate) use self::operation::UniqueOperationNames;
pub(crate) use self::overlapping_fields::OverlappingFieldsCanBeMerged;
pub(crate) use self::type_names::KnownTypeNames;
pub(crate) use self::value::UniqueInputFieldNames;
pub(crate) use self::value::ValuesOfCorrectType;
pub(crate) use self::variable::NoUndefinedVariables;
pub(crate) use self::variable::NoUnusedVariables;
pub(crate) use self::variable::UniqueVariableNames;
pub(crate) use self::variable::VariablesAreInputTypes;
pub(crate) use self::variable::VariablesInAllowedPosition;
