//! Field collection, field execution, and non-null propagation.
//!
//! <https://spec.graphql.org/October2021/#sec-Executing-Selection-Sets>

use crate::execution::incremental::DeferredFields;
use crate::execution::incremental::IncrementalGraph;
use crate::execution::incremental::RecordId;
use crate::execution::input_coercion::coerce_argument_values;
use crate::execution::resolver::ResolveError;
use crate::execution::resolver::ResolvedValue;
use crate::execution::resolver::SharedResolver;
use crate::execution::result_coercion::complete_value;
use crate::execution::GraphQLError;
use crate::execution::JsonMap;
use crate::execution::JsonValue;
use crate::execution::PathSegment;
use crate::execution::ResponsePath;
use crate::introspection;
use crate::schema::ExtendedType;
use crate::schema::ObjectType;
use crate::validation::Valid;
use crate::ExecutableDocument;
use crate::Schema;
use crate::SourceMap;
use futures::future::try_join_all;
use futures::future::BoxFuture;
use futures::FutureExt;
use graphyne_parser::ast;
use graphyne_parser::ast::Selection;
use graphyne_parser::Name;
use graphyne_parser::Node;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;

/// <https://spec.graphql.org/October2021/#sec-Normal-and-Serial-Execution>
#[derive(Debug, Copy, Clone)]
pub(crate) enum ExecutionMode {
    /// Fields may resolve in any order; pending siblings are awaited together.
    Normal,
    /// Top-level fields of a mutation execute and complete strictly serially.
    Sequential,
}

/// Returned in `Err` when a field error occurred at some non-nullable place.
///
/// <https://spec.graphql.org/October2021/#sec-Handling-Field-Errors>
pub(crate) struct PropagateNull;

/// Errors recorded while producing one response payload. Sibling futures
/// share the sink; each incremental record gets a fresh one.
pub(crate) type ErrorSink = Mutex<Vec<GraphQLError>>;

pub(crate) fn push_error(errors: &ErrorSink, error: GraphQLError) {
    errors.lock().expect("error sink poisoned").push(error)
}

pub(crate) fn take_errors(errors: ErrorSink) -> Vec<GraphQLError> {
    errors.into_inner().expect("error sink poisoned")
}

/// Per-request state, shared by every field execution of the request
/// including deferred and streamed continuations.
pub(crate) struct ExecutionContext {
    pub(crate) schema: Arc<Valid<Schema>>,
    pub(crate) document: Arc<Valid<ExecutableDocument>>,
    pub(crate) variable_values: JsonMap,
    /// Bookkeeping for `@defer`/`@stream`, when the operation uses them.
    /// Weak so that record tasks (which hold the context) do not keep the
    /// graph alive once the payload stream is dropped.
    pub(crate) incremental: Option<Weak<IncrementalGraph>>,
    /// Set when any resolver suspended; `execute_sync` turns this
    /// into an error.
    pub(crate) suspended: AtomicBool,
}

impl ExecutionContext {
    pub(crate) fn sources(&self) -> &SourceMap {
        &self.document.sources
    }

    pub(crate) fn incremental(&self) -> Option<Arc<IncrementalGraph>> {
        self.incremental.as_ref()?.upgrade()
    }

    pub(crate) fn mark_suspended(&self) {
        self.suspended.store(true, Ordering::Relaxed);
    }
}

/// <https://spec.graphql.org/October2021/#ExecuteSelectionSet()>
pub(crate) fn execute_selection_set<'a>(
    ctx: &'a Arc<ExecutionContext>,
    errors: &'a ErrorSink,
    parent_record: Option<RecordId>,
    path: ResponsePath,
    mode: ExecutionMode,
    object_type: Node<ObjectType>,
    object_value: SharedResolver,
    selections: Vec<Selection>,
) -> BoxFuture<'a, Result<JsonMap, PropagateNull>> {
    async move {
        let mut grouped_field_set = IndexMap::new();
        let mut deferred = Vec::new();
        collect_fields(
            ctx,
            &object_type,
            &selections,
            &mut HashSet::new(),
            &mut grouped_field_set,
            &mut deferred,
        );

        for fields in deferred {
            if let Some(graph) = ctx.incremental() {
                graph.defer_fragment(
                    ctx,
                    parent_record,
                    path.clone(),
                    object_type.clone(),
                    object_value.clone(),
                    fields,
                );
            }
        }

        let mut response_map = JsonMap::with_capacity(grouped_field_set.len());
        match mode {
            ExecutionMode::Normal => {
                // Siblings resolve together; the first propagating error
                // cancels in-flight siblings since the enclosing value
                // is discarded anyway
                let field_results =
                    try_join_all(grouped_field_set.into_iter().map(|(response_key, fields)| {
                        let mut field_path = path.clone();
                        field_path.push(PathSegment::Field(response_key.clone()));
                        let object_type = &object_type;
                        let object_value = &object_value;
                        async move {
                            let value = execute_field(
                                ctx,
                                errors,
                                parent_record,
                                field_path,
                                mode,
                                object_type,
                                object_value,
                                Arc::new(fields),
                            )
                            .await?;
                            Ok((response_key, value))
                        }
                    }))
                    .await?;
                for (response_key, value) in field_results {
                    if let Some(value) = value {
                        response_map.insert(response_key.to_string(), value);
                    }
                }
            }
            ExecutionMode::Sequential => {
                for (response_key, fields) in grouped_field_set {
                    let mut field_path = path.clone();
                    field_path.push(PathSegment::Field(response_key.clone()));
                    let value = execute_field(
                        ctx,
                        errors,
                        parent_record,
                        field_path,
                        mode,
                        &object_type,
                        &object_value,
                        Arc::new(fields),
                    )
                    .await?;
                    if let Some(value) = value {
                        response_map.insert(response_key.to_string(), value);
                    }
                }
            }
        }
        Ok(response_map)
    }
    .boxed()
}

/// <https://spec.graphql.org/October2021/#CollectFields()>
///
/// Fragments under an applicable `@defer` are collected separately instead of
/// being merged into the grouped field set.
pub(crate) fn collect_fields(
    ctx: &Arc<ExecutionContext>,
    object_type: &Node<ObjectType>,
    selections: &[Selection],
    visited_fragments: &mut HashSet<Name>,
    grouped_fields: &mut IndexMap<Name, Vec<Node<ast::Field>>>,
    deferred: &mut Vec<DeferredFields>,
) {
    for selection in selections {
        let directives = match selection {
            Selection::Field(field) => &field.directives,
            Selection::FragmentSpread(spread) => &spread.directives,
            Selection::InlineFragment(inline) => &inline.directives,
        };
        if eval_if_arg(directives, "skip", &ctx.variable_values).unwrap_or(false)
            || !eval_if_arg(directives, "include", &ctx.variable_values).unwrap_or(true)
        {
            continue;
        }
        match selection {
            Selection::Field(field) => grouped_fields
                .entry(field.response_key().clone())
                .or_default()
                .push(field.clone()),
            Selection::FragmentSpread(spread) => {
                let Some(fragment) = ctx.document.fragments.get(spread.fragment_name.as_str())
                else {
                    continue;
                };
                if !does_fragment_type_apply(&ctx.schema, object_type, &fragment.type_condition) {
                    continue;
                }
                if let Some(label) = defer_label(ctx, directives) {
                    deferred.push(DeferredFields {
                        label,
                        selections: fragment.selection_set.clone(),
                    });
                    continue;
                }
                if !visited_fragments.insert(spread.fragment_name.clone()) {
                    continue;
                }
                collect_fields(
                    ctx,
                    object_type,
                    &fragment.selection_set,
                    visited_fragments,
                    grouped_fields,
                    deferred,
                )
            }
            Selection::InlineFragment(inline) => {
                if let Some(condition) = &inline.type_condition {
                    if !does_fragment_type_apply(&ctx.schema, object_type, condition) {
                        continue;
                    }
                }
                if let Some(label) = defer_label(ctx, directives) {
                    deferred.push(DeferredFields {
                        label,
                        selections: inline.selection_set.clone(),
                    });
                    continue;
                }
                collect_fields(
                    ctx,
                    object_type,
                    &inline.selection_set,
                    visited_fragments,
                    grouped_fields,
                    deferred,
                )
            }
        }
    }
}

/// When an applicable `@defer` is present (and incremental delivery is on),
/// returns its label wrapped one level: `Some(label)`.
fn defer_label(
    ctx: &Arc<ExecutionContext>,
    directives: &ast::Directives,
) -> Option<Option<String>> {
    if ctx.incremental.is_none() {
        return None;
    }
    let defer = directives.get("defer")?;
    // `if:` defaults to true
    let applies = match defer.specified_argument_by_name("if") {
        Some(condition) => eval_bool(condition, &ctx.variable_values).unwrap_or(true),
        None => true,
    };
    if !applies {
        return None;
    }
    let label = defer
        .specified_argument_by_name("label")
        .and_then(|value| value.as_str())
        .map(str::to_owned);
    Some(label)
}

/// <https://spec.graphql.org/October2021/#DoesFragmentTypeApply()>
pub(crate) fn does_fragment_type_apply(
    schema: &Schema,
    object_type: &ObjectType,
    fragment_type: &Name,
) -> bool {
    match schema.types.get(fragment_type.as_str()) {
        Some(ExtendedType::Object(_)) => *fragment_type == object_type.name,
        Some(ExtendedType::Interface(_)) => object_type
            .implements_interfaces
            .contains(fragment_type.as_str()),
        Some(ExtendedType::Union(def)) => def.members.contains(fragment_type.as_str()),
        // Undefined or not a composite type: validation should have caught this
        _ => false,
    }
}

fn eval_if_arg(
    directives: &ast::Directives,
    directive_name: &str,
    variable_values: &JsonMap,
) -> Option<bool> {
    eval_bool(
        directives
            .get(directive_name)?
            .specified_argument_by_name("if")?,
        variable_values,
    )
}

fn eval_bool(value: &ast::Value, variable_values: &JsonMap) -> Option<bool> {
    match value {
        ast::Value::Boolean(value) => Some(*value),
        ast::Value::Variable(name) => variable_values.get(name.as_str())?.as_bool(),
        _ => None,
    }
}

/// <https://spec.graphql.org/October2021/#ExecuteField()>
///
/// Returns `Ok(None)` for silently skipping a field whose definition
/// does not exist.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn execute_field(
    ctx: &Arc<ExecutionContext>,
    errors: &ErrorSink,
    parent_record: Option<RecordId>,
    path: ResponsePath,
    mode: ExecutionMode,
    object_type: &Node<ObjectType>,
    object_value: &SharedResolver,
    fields: Arc<Vec<Node<ast::Field>>>,
) -> Result<Option<JsonValue>, PropagateNull> {
    let field = &fields[0];
    let Ok(field_def) = ctx.schema.type_field(&object_type.name, &field.name) else {
        return Ok(None);
    };
    let field_def = field_def.clone();
    let argument_values = {
        let coerced = {
            let mut sink = errors.lock().expect("error sink poisoned");
            coerce_argument_values(
                &ctx.schema,
                ctx.sources(),
                &ctx.variable_values,
                &mut sink,
                &path,
                &field_def,
                field,
            )
        };
        match coerced {
            Ok(argument_values) => argument_values,
            Err(PropagateNull) if field_def.ty.is_non_null() => return Err(PropagateNull),
            Err(PropagateNull) => return Ok(Some(JsonValue::Null)),
        }
    };
    let is_field_of_root_query = || {
        ctx.schema
            .query_type
            .as_ref()
            .is_some_and(|query| *query == object_type.name)
    };
    let resolved_result = match field.name.as_str() {
        "__typename" => Ok(ResolvedValue::leaf(object_type.name.as_str())),
        "__schema" if is_field_of_root_query() => {
            Ok(introspection::schema_resolver(ctx.schema.clone()))
        }
        "__type" if is_field_of_root_query() => {
            let name = argument_values
                .get("name")
                .and_then(JsonValue::as_str)
                .unwrap_or_default();
            Ok(introspection::type_resolver(ctx.schema.clone(), name))
        }
        _ => object_value.resolve_field(&field.name, &argument_values),
    };
    let completed_result = match resolved_result {
        Ok(resolved) => {
            complete_value(
                ctx,
                errors,
                parent_record,
                path.clone(),
                mode,
                field_def.ty.clone(),
                resolved,
                fields.clone(),
            )
            .await
        }
        Err(ResolveError { message }) => {
            push_error(
                errors,
                GraphQLError::field_error(message, &path, field.name.location(), ctx.sources()),
            );
            Err(PropagateNull)
        }
    };
    try_nullify(ctx, &field_def.ty, &path, completed_result).map(Some)
}

/// Try to insert a propagated null if possible, or keep propagating it.
///
/// Inserting the null also cancels any pending deferred or streamed work
/// beneath the nulled path: its payloads would be filtered anyway.
///
/// <https://spec.graphql.org/October2021/#sec-Handling-Field-Errors>
pub(crate) fn try_nullify(
    ctx: &Arc<ExecutionContext>,
    ty: &ast::Type,
    path: &[PathSegment],
    result: Result<JsonValue, PropagateNull>,
) -> Result<JsonValue, PropagateNull> {
    match result {
        Ok(json) => Ok(json),
        Err(PropagateNull) => {
            if ty.is_non_null() {
                Err(PropagateNull)
            } else {
                if let Some(graph) = ctx.incremental() {
                    graph.cancel_under(path);
                }
                Ok(JsonValue::Null)
            }
        }
    }
}
