//! Subscriptions: resolve the root field to a stream of source events, then
//! execute the operation once per event.
//!
//! <https://spec.graphql.org/October2021/#sec-Subscription>

use crate::execution::engine;
use crate::execution::engine::take_errors;
use crate::execution::engine::ErrorSink;
use crate::execution::engine::ExecutionContext;
use crate::execution::engine::ExecutionMode;
use crate::execution::input_coercion;
use crate::execution::GraphQLError;
use crate::execution::JsonMap;
use crate::execution::Request;
use crate::execution::RequestError;
use crate::execution::ResolveError;
use crate::execution::ResolvedValue;
use crate::execution::Resolver;
use crate::execution::Response;
use crate::execution::ResponseData;
use futures::stream::BoxStream;
use futures::StreamExt;
use graphyne_parser::Name;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::sync::Mutex;

/// The responses of a subscription, one per source event.
pub type ResponseStream = BoxStream<'static, Response>;

/// Start a subscription.
///
/// The root field's [`Resolver::resolve_subscription`] produces the stream of
/// source events; each event is then executed like a query rooted at that
/// event's value. Failing to establish the source stream is a request error.
pub async fn subscribe(request: Request) -> Result<ResponseStream, Box<Response>> {
    let Request {
        schema,
        document,
        root_value,
        variable_values,
        operation_name,
    } = request;
    let operation = match document.get_operation(operation_name.as_deref()) {
        Ok(operation) => operation.clone(),
        Err(error) => return Err(Box::new(error.into())),
    };
    if !operation.is_subscription() {
        return Err(Box::new(
            RequestError::new("subscribe requires a subscription operation").into(),
        ));
    }
    let coerced_variables = match input_coercion::coerce_variable_values(
        &schema,
        &operation,
        &variable_values,
        &document.sources,
        None,
    ) {
        Ok(values) => values.into_inner(),
        Err(errors) => return Err(Box::new(Response::from_errors(errors))),
    };
    let Some(root_type_name) = schema
        .root_operation(graphyne_parser::ast::OperationType::Subscription)
        .cloned()
    else {
        return Err(Box::new(
            RequestError::new("the schema does not support subscription operations").into(),
        ));
    };
    let Some(root_type) = schema.get_object(&root_type_name).cloned() else {
        return Err(Box::new(
            RequestError::new(format!(
                "the subscription root type {root_type_name} is not an object type"
            ))
            .into(),
        ));
    };
    let ctx = Arc::new(ExecutionContext {
        schema,
        document,
        variable_values: coerced_variables,
        incremental: None,
        suspended: AtomicBool::new(false),
    });

    // CreateSourceEventStream: the single root field's subscribe resolver
    let mut grouped = IndexMap::new();
    let mut deferred = Vec::new();
    engine::collect_fields(
        &ctx,
        &root_type,
        &operation.selection_set,
        &mut HashSet::new(),
        &mut grouped,
        &mut deferred,
    );
    let Some((_, fields)) = grouped.into_iter().next() else {
        return Err(Box::new(
            RequestError::new("a subscription operation must select a field").into(),
        ));
    };
    let field = fields[0].clone();
    let field_def = match ctx.schema.type_field(&root_type.name, &field.name) {
        Ok(def) => def.clone(),
        Err(_) => {
            return Err(Box::new(
                RequestError::new(format!(
                    "the subscription root type {root_type_name} has no field {}",
                    field.name
                ))
                .into(),
            ))
        }
    };
    let argument_values = {
        let errors = ErrorSink::default();
        let coerced = {
            let mut sink = errors.lock().expect("error sink poisoned");
            input_coercion::coerce_argument_values(
                &ctx.schema,
                ctx.sources(),
                &ctx.variable_values,
                &mut sink,
                &[],
                &field_def,
                &field,
            )
        };
        match coerced {
            Ok(values) => values,
            Err(_) => return Err(Box::new(Response::from_errors(take_errors(errors)))),
        }
    };
    let source_stream = match root_value.resolve_subscription(&field.name, &argument_values) {
        Ok(stream) => stream,
        Err(ResolveError { message }) => {
            return Err(Box::new(Response::from_errors(vec![
                GraphQLError::field_error(message, &[], field.name.location(), ctx.sources()),
            ])))
        }
    };
    ctx.mark_suspended();

    // MapSourceToResponseEvent: one ordinary execution per event
    let selection_set = operation.selection_set.clone();
    let responses = source_stream
        .then(move |event| {
            let ctx = ctx.clone();
            let root_type = root_type.clone();
            let selection_set = selection_set.clone();
            let field_name = field.name.clone();
            let field_location = field.name.location();
            async move {
                let event = match event {
                    Ok(event) => event,
                    Err(ResolveError { message }) => {
                        return Response {
                            errors: vec![GraphQLError::field_error(
                                message,
                                &[],
                                field_location,
                                ctx.sources(),
                            )],
                            data: ResponseData::Null,
                            extensions: JsonMap::new(),
                        }
                    }
                };
                let root = EventRoot {
                    type_name: root_type.name.to_string(),
                    field: field_name,
                    event: Mutex::new(Some(event)),
                };
                let errors = ErrorSink::default();
                let result = engine::execute_selection_set(
                    &ctx,
                    &errors,
                    None,
                    Vec::new(),
                    ExecutionMode::Normal,
                    root_type,
                    Arc::new(root),
                    selection_set,
                )
                .await;
                let data = match result {
                    Ok(map) => ResponseData::Object(map),
                    Err(_) => ResponseData::Null,
                };
                Response {
                    errors: take_errors(errors),
                    data,
                    extensions: JsonMap::new(),
                }
            }
        })
        .boxed();
    Ok(responses)
}

/// Root object for executing one subscription event: the subscribed field
/// resolves to the event value.
struct EventRoot {
    type_name: String,
    field: Name,
    event: Mutex<Option<ResolvedValue>>,
}

impl Resolver for EventRoot {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn resolve_field(
        &self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        if field_name == self.field.as_str() {
            self.event
                .lock()
                .expect("event slot poisoned")
                .take()
                .ok_or_else(|| ResolveError::new("the subscription event was already consumed"))
        } else {
            Ok(ResolvedValue::null())
        }
    }
}
