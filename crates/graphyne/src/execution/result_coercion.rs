//! <https://spec.graphql.org/October2021/#CompleteValue()>

use crate::execution::engine::push_error;
use crate::execution::engine::try_nullify;
use crate::execution::engine::ErrorSink;
use crate::execution::engine::ExecutionContext;
use crate::execution::engine::ExecutionMode;
use crate::execution::engine::PropagateNull;
use crate::execution::engine::execute_selection_set;
use crate::execution::incremental::RecordId;
use crate::execution::incremental::StreamNext;
use crate::execution::resolver::ResolveError;
use crate::execution::resolver::ResolvedValue;
use crate::execution::resolver::SharedResolver;
use crate::execution::GraphQLError;
use crate::execution::JsonValue;
use crate::execution::PathSegment;
use crate::execution::ResponsePath;
use crate::schema::ExtendedType;
use crate::schema::ObjectType;
use futures::future::try_join_all;
use futures::future::BoxFuture;
use futures::FutureExt;
use futures::StreamExt;
use graphyne_parser::ast;
use graphyne_parser::ast::Type;
use graphyne_parser::Node;
use std::sync::Arc;

/// The items of a list-valued field, pulled one at a time:
/// eagerly resolved, lazily iterated, or asynchronously streamed.
pub(crate) enum ListSource {
    Sync(Box<dyn Iterator<Item = Result<ResolvedValue, ResolveError>> + Send>),
    Async(futures::stream::BoxStream<'static, Result<ResolvedValue, ResolveError>>),
}

impl ListSource {
    pub(crate) async fn next(
        &mut self,
        ctx: &Arc<ExecutionContext>,
    ) -> Option<Result<ResolvedValue, ResolveError>> {
        match self {
            Self::Sync(iter) => iter.next(),
            Self::Async(stream) => {
                ctx.mark_suspended();
                stream.next().await
            }
        }
    }
}

/// Returns `Err` for a field error being propagated upwards
/// to find a nullable place.
pub(crate) fn complete_value<'a>(
    ctx: &'a Arc<ExecutionContext>,
    errors: &'a ErrorSink,
    parent_record: Option<RecordId>,
    path: ResponsePath,
    mode: ExecutionMode,
    ty: Type,
    resolved: ResolvedValue,
    fields: Arc<Vec<Node<ast::Field>>>,
) -> BoxFuture<'a, Result<JsonValue, PropagateNull>> {
    async move {
        let location = fields[0].name.location();
        let mut resolved = resolved;
        // A resolver may hand back a chain of futures; unwrap them all
        while let ResolvedValue::Pending(future) = resolved {
            ctx.mark_suspended();
            match future.await {
                Ok(value) => resolved = value,
                Err(ResolveError { message }) => {
                    push_error(
                        errors,
                        GraphQLError::field_error(message, &path, location, ctx.sources()),
                    );
                    return Err(PropagateNull);
                }
            }
        }
        match resolved {
            ResolvedValue::Leaf(json) => {
                complete_leaf(ctx, errors, &path, &ty, json, location)
            }
            ResolvedValue::Object(resolver) => {
                complete_object(
                    ctx,
                    errors,
                    parent_record,
                    path,
                    mode,
                    &ty,
                    resolver,
                    fields,
                )
                .await
            }
            ResolvedValue::List(items) => {
                if stream_directive(ctx, &fields).is_some() {
                    // Streamed lists go through the sequential source path
                    // so items beyond `initialCount` are pulled lazily
                    let source = ListSource::Sync(Box::new(items.into_iter().map(Ok)));
                    complete_list_source(
                        ctx,
                        errors,
                        parent_record,
                        path,
                        mode,
                        &ty,
                        source,
                        fields,
                    )
                    .await
                } else {
                    complete_list_items(
                        ctx,
                        errors,
                        parent_record,
                        path,
                        mode,
                        &ty,
                        items,
                        fields,
                    )
                    .await
                }
            }
            ResolvedValue::Iter(iter) => {
                complete_list_source(
                    ctx,
                    errors,
                    parent_record,
                    path,
                    mode,
                    &ty,
                    ListSource::Sync(iter),
                    fields,
                )
                .await
            }
            ResolvedValue::Stream(stream) => {
                complete_list_source(
                    ctx,
                    errors,
                    parent_record,
                    path,
                    mode,
                    &ty,
                    ListSource::Async(stream),
                    fields,
                )
                .await
            }
            ResolvedValue::Pending(_) => unreachable!("unwrapped above"),
        }
    }
    .boxed()
}

fn complete_leaf(
    ctx: &Arc<ExecutionContext>,
    errors: &ErrorSink,
    path: &ResponsePath,
    ty: &Type,
    json: JsonValue,
    location: Option<graphyne_parser::SourceSpan>,
) -> Result<JsonValue, PropagateNull> {
    macro_rules! field_error {
        ($($arg: tt)+) => {{
            push_error(
                errors,
                GraphQLError::field_error(format!($($arg)+), path, location, ctx.sources()),
            );
            return Err(PropagateNull);
        }};
    }
    if json.is_null() {
        if ty.is_non_null() {
            field_error!("non-null type {ty} resolved to null")
        }
        return Ok(JsonValue::Null);
    }
    let ty_name = match ty {
        Type::List(_) | Type::NonNullList(_) => {
            field_error!("list type {ty} resolved to a non-list value")
        }
        Type::Named(name) | Type::NonNullNamed(name) => name,
    };
    let Some(ty_def) = ctx.schema.types.get(ty_name.as_str()) else {
        field_error!("undefined type {ty_name}")
    };
    match ty_def {
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
            field_error!("resolver returned a leaf value, expected an object for type {ty_name}")
        }
        ExtendedType::InputObject(_) => {
            field_error!("field with input object type {ty_name}")
        }
        ExtendedType::Enum(enum_def) => {
            // https://spec.graphql.org/October2021/#sec-Enums.Result-Coercion
            if !json
                .as_str()
                .is_some_and(|value| enum_def.values.contains_key(value))
            {
                field_error!("resolver returned {json}, expected a value of enum {ty_name}")
            }
            Ok(json)
        }
        ExtendedType::Scalar(_) => match ty_name.as_str() {
            "Int" => {
                // https://spec.graphql.org/October2021/#sec-Int.Result-Coercion
                match json.as_i64() {
                    Some(int) if i32::try_from(int).is_ok() => Ok(json),
                    Some(_) => field_error!("resolver returned {json}, which overflows Int"),
                    None => field_error!("resolver returned {json}, expected Int"),
                }
            }
            "Float" => {
                // https://spec.graphql.org/October2021/#sec-Float.Result-Coercion
                if json.as_f64().is_some() {
                    Ok(json)
                } else {
                    field_error!("resolver returned {json}, expected Float")
                }
            }
            "String" => {
                if json.is_string() {
                    Ok(json)
                } else {
                    field_error!("resolver returned {json}, expected String")
                }
            }
            "Boolean" => {
                if json.is_boolean() {
                    Ok(json)
                } else {
                    field_error!("resolver returned {json}, expected Boolean")
                }
            }
            "ID" => {
                // https://spec.graphql.org/October2021/#sec-ID.Result-Coercion
                if json.is_string() {
                    Ok(json)
                } else if let Some(int) = json.as_i64() {
                    Ok(int.to_string().into())
                } else {
                    field_error!("resolver returned {json}, expected ID")
                }
            }
            custom => match ctx.schema.scalars.get(custom) {
                Some(coercion) => match coercion.serialize(&json) {
                    Ok(serialized) => Ok(serialized),
                    Err(message) => {
                        field_error!("cannot serialize {json} as {custom}: {message}")
                    }
                },
                // Custom scalar without a coercer: any JSON value passes
                // through as-is, including arrays and objects
                None => Ok(json),
            },
        },
    }
}

#[allow(clippy::too_many_arguments)]
async fn complete_object(
    ctx: &Arc<ExecutionContext>,
    errors: &ErrorSink,
    parent_record: Option<RecordId>,
    path: ResponsePath,
    mode: ExecutionMode,
    ty: &Type,
    resolver: SharedResolver,
    fields: Arc<Vec<Node<ast::Field>>>,
) -> Result<JsonValue, PropagateNull> {
    let location = fields[0].name.location();
    macro_rules! field_error {
        ($($arg: tt)+) => {{
            push_error(
                errors,
                GraphQLError::field_error(format!($($arg)+), &path, location, ctx.sources()),
            );
            return Err(PropagateNull);
        }};
    }
    let ty_name = match ty {
        Type::List(_) | Type::NonNullList(_) => {
            field_error!("list type {ty} resolved to an object")
        }
        Type::Named(name) | Type::NonNullNamed(name) => name,
    };
    let object_type: Node<ObjectType> = match ctx.schema.types.get(ty_name.as_str()) {
        None => field_error!("undefined type {ty_name}"),
        Some(ExtendedType::Scalar(_) | ExtendedType::Enum(_)) => {
            field_error!(
                "resolver returned an object of type {}, expected the leaf type {ty_name}",
                resolver.type_name()
            )
        }
        Some(ExtendedType::InputObject(_)) => {
            field_error!("field with input object type {ty_name}")
        }
        Some(ExtendedType::Object(def)) => def.clone(),
        Some(ExtendedType::Interface(_) | ExtendedType::Union(_)) => {
            // Abstract type: the resolver names the concrete object type,
            // which must be a possible type of the abstract one
            let concrete_name = resolver.type_name().to_owned();
            let Some(def) = ctx.schema.get_object(&concrete_name) else {
                field_error!(
                    "resolver returned an object of type {concrete_name} \
                     which is not defined in the schema"
                )
            };
            if !ctx.schema.is_subtype(ty_name, &concrete_name) {
                field_error!(
                    "resolver returned an object of type {concrete_name} \
                     which is not a possible type of {ty_name}"
                )
            }
            def.clone()
        }
    };
    let selections: Vec<_> = fields
        .iter()
        .flat_map(|field| field.selection_set.iter().cloned())
        .collect();
    execute_selection_set(
        ctx,
        errors,
        parent_record,
        path,
        mode,
        object_type,
        resolver,
        selections,
    )
    .await
    .map(JsonValue::Object)
}

/// Complete the items of an already materialised list, in parallel.
#[allow(clippy::too_many_arguments)]
async fn complete_list_items(
    ctx: &Arc<ExecutionContext>,
    errors: &ErrorSink,
    parent_record: Option<RecordId>,
    path: ResponsePath,
    mode: ExecutionMode,
    ty: &Type,
    items: Vec<ResolvedValue>,
    fields: Arc<Vec<Node<ast::Field>>>,
) -> Result<JsonValue, PropagateNull> {
    let Some(inner_ty) = ty.item_type() else {
        push_error(
            errors,
            GraphQLError::field_error(
                format!("non-list type {ty} resolved to a list"),
                &path,
                fields[0].name.location(),
                ctx.sources(),
            ),
        );
        return Err(PropagateNull);
    };
    let completed = try_join_all(items.into_iter().enumerate().map(|(index, item)| {
        let mut item_path = path.clone();
        item_path.push(PathSegment::ListIndex(index));
        let fields = fields.clone();
        async move {
            let item_result = complete_value(
                ctx,
                errors,
                parent_record,
                item_path.clone(),
                mode,
                inner_ty.clone(),
                item,
                fields,
            )
            .await;
            // A failed item nullifies itself if it can; a non-null item
            // error propagates and cancels the in-flight siblings
            try_nullify(ctx, inner_ty, &item_path, item_result)
        }
    }))
    .await;
    match completed {
        Ok(values) => Ok(values.into()),
        Err(PropagateNull) => try_nullify(ctx, ty, &path, Err(PropagateNull)),
    }
}

/// Complete a lazily produced list sequentially, handing items beyond
/// `@stream(initialCount:)` over to the incremental graph.
#[allow(clippy::too_many_arguments)]
async fn complete_list_source(
    ctx: &Arc<ExecutionContext>,
    errors: &ErrorSink,
    parent_record: Option<RecordId>,
    path: ResponsePath,
    mode: ExecutionMode,
    ty: &Type,
    mut source: ListSource,
    fields: Arc<Vec<Node<ast::Field>>>,
) -> Result<JsonValue, PropagateNull> {
    let location = fields[0].name.location();
    let Some(inner_ty) = ty.item_type() else {
        push_error(
            errors,
            GraphQLError::field_error(
                format!("non-list type {ty} resolved to a list"),
                &path,
                location,
                ctx.sources(),
            ),
        );
        return Err(PropagateNull);
    };
    let stream = stream_directive(ctx, &fields);
    let mut completed_list = Vec::new();
    let mut index = 0;
    loop {
        if let Some(stream) = &stream {
            if index >= stream.initial_count {
                break;
            }
        }
        let Some(item) = source.next(ctx).await else {
            return Ok(completed_list.into());
        };
        let mut item_path = path.clone();
        item_path.push(PathSegment::ListIndex(index));
        let item_result = match item {
            Ok(resolved) => {
                complete_value(
                    ctx,
                    errors,
                    parent_record,
                    item_path.clone(),
                    mode,
                    inner_ty.clone(),
                    resolved,
                    fields.clone(),
                )
                .await
            }
            Err(ResolveError { message }) => {
                push_error(
                    errors,
                    GraphQLError::field_error(message, &item_path, location, ctx.sources()),
                );
                Err(PropagateNull)
            }
        };
        match try_nullify(ctx, inner_ty, &item_path, item_result) {
            Ok(value) => completed_list.push(value),
            // A non-null item error nullifies the whole list
            Err(PropagateNull) => return try_nullify(ctx, ty, &path, Err(PropagateNull)),
        }
        index += 1;
    }
    // The remainder of the list is delivered incrementally. Pulling one item
    // ahead makes `hasNext` accurate on the payload carrying the last item.
    let stream = stream.expect("loop only breaks when streaming");
    if let Some(graph) = ctx.incremental() {
        if let Some(lookahead) = source.next(ctx).await {
            graph.stream_items(
                ctx,
                parent_record,
                StreamNext {
                    path: path.clone(),
                    label: stream.label,
                    index,
                    inner_ty: inner_ty.clone(),
                    fields: fields.clone(),
                    item: lookahead,
                    source,
                },
            );
        }
    }
    Ok(completed_list.into())
}

pub(crate) struct StreamDirective {
    pub(crate) label: Option<String>,
    pub(crate) initial_count: usize,
}

/// The `@stream` directive of the field, when incremental delivery is on
/// and its `if:` argument does not disable it.
pub(crate) fn stream_directive(
    ctx: &Arc<ExecutionContext>,
    fields: &[Node<ast::Field>],
) -> Option<StreamDirective> {
    ctx.incremental.as_ref()?;
    let directive = fields[0].directives.get("stream")?;
    let applies = match directive.specified_argument_by_name("if") {
        Some(condition) => match condition.as_ref() {
            ast::Value::Boolean(value) => *value,
            ast::Value::Variable(name) => ctx
                .variable_values
                .get(name.as_str())
                .and_then(JsonValue::as_bool)
                .unwrap_or(true),
            _ => true,
        },
        None => true,
    };
    if !applies {
        return None;
    }
    let label = directive
        .specified_argument_by_name("label")
        .and_then(|value| value.as_str())
        .map(str::to_owned);
    let initial_count = directive
        .specified_argument_by_name("initialCount")
        .and_then(|value| match value.as_ref() {
            ast::Value::Int(int) => usize::try_from(*int).ok(),
            ast::Value::Variable(name) => ctx
                .variable_values
                .get(name.as_str())
                .and_then(JsonValue::as_u64)
                .map(|count| count as usize),
            _ => None,
        })
        .unwrap_or(0);
    Some(StreamDirective {
        label,
        initial_count,
    })
}
