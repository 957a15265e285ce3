//! Operation execution: request building, the executor entry points, and the
//! response model.

pub(crate) mod engine;
pub(crate) mod incremental;
mod input_coercion;
mod resolver;
mod response;
mod result_coercion;
mod subscribe;

pub use self::incremental::SubsequentPayloads;
pub use self::input_coercion::coerce_variable_values;
pub use self::input_coercion::const_value_to_json;
pub use self::input_coercion::literal_to_json;
pub use self::resolver::JsonResolver;
pub use self::resolver::ResolveError;
pub use self::resolver::ResolvedValue;
pub use self::resolver::Resolver;
pub use self::resolver::SharedResolver;
pub use self::resolver::SourceEventStream;
pub use self::response::GraphQLError;
pub use self::response::GraphQLLocation;
pub use self::response::IncrementalPayload;
pub use self::response::InitialResponse;
pub use self::response::JsonMap;
pub use self::response::JsonValue;
pub use self::response::PathSegment;
pub use self::response::RequestError;
pub use self::response::Response;
pub use self::response::ResponseData;
pub use self::response::ResponsePath;
pub use self::response::SubsequentResponse;
pub use self::subscribe::subscribe;
pub use self::subscribe::ResponseStream;

use self::engine::take_errors;
use self::engine::ErrorSink;
use self::engine::ExecutionContext;
use self::engine::ExecutionMode;
use self::engine::PropagateNull;
use self::incremental::IncrementalGraph;
use crate::validation::Valid;
use crate::ExecutableDocument;
use crate::Schema;
use futures::FutureExt;
use graphyne_parser::ast;
use graphyne_parser::ast::Selection;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// One GraphQL request, ready to execute.
///
/// The schema and document are shared pointers because deferred and streamed
/// work may outlive the initial response.
#[derive(Clone)]
pub struct Request {
    pub schema: Arc<Valid<Schema>>,
    pub document: Arc<Valid<ExecutableDocument>>,
    pub root_value: SharedResolver,
    pub variable_values: JsonMap,
    pub operation_name: Option<String>,
}

impl Request {
    pub fn new(
        schema: Arc<Valid<Schema>>,
        document: Arc<Valid<ExecutableDocument>>,
        root_value: SharedResolver,
    ) -> Self {
        Self {
            schema,
            document,
            root_value,
            variable_values: JsonMap::new(),
            operation_name: None,
        }
    }

    /// The variable values of the request, as plain JSON; they are coerced
    /// against the operation's variable definitions before execution.
    pub fn variables(mut self, variable_values: JsonMap) -> Self {
        self.variable_values = variable_values;
        self
    }

    /// Which operation of the document to execute. Required when the
    /// document contains more than one.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// What [`execute`] produced: a complete response, or an initial payload
/// followed by a stream of subsequent ones when the operation used
/// `@defer` or `@stream`.
#[derive(Debug)]
pub enum ExecuteResult {
    Complete(Response),
    Incremental(IncrementalResponse),
}

/// An incremental-delivery response: deferred and streamed work is still
/// outstanding after the initial payload. Dropping [`subsequent`]
/// [IncrementalResponse::subsequent] cancels that work.
#[derive(Debug)]
pub struct IncrementalResponse {
    pub initial: InitialResponse,
    pub subsequent: SubsequentPayloads,
}

impl ExecuteResult {
    /// The response of an execution that did not use incremental delivery.
    ///
    /// An incremental result is turned into a request error, for callers
    /// that cannot deliver subsequent payloads.
    pub fn into_response(self) -> Response {
        match self {
            Self::Complete(response) => response,
            Self::Incremental(_) => RequestError::new(
                "the operation uses @defer or @stream \
                 and requires incremental delivery",
            )
            .into(),
        }
    }

    pub fn is_incremental(&self) -> bool {
        matches!(self, Self::Incremental(_))
    }
}

/// Execute a request.
///
/// Request errors (unknown operation, variable coercion failure, unsupported
/// root operation) produce a response with no data; field errors surface in
/// the response's `errors` while execution continues.
pub async fn execute(request: Request) -> ExecuteResult {
    execute_inner(request).await.0
}

/// Execute a request whose resolvers are all synchronous.
///
/// Any resolver suspending, or an operation requiring incremental delivery,
/// is a request error.
pub fn execute_sync(request: Request) -> Response {
    match execute_inner(request).now_or_never() {
        None => RequestError::new(
            "execution failed to complete synchronously: a resolver suspended",
        )
        .into(),
        Some((_, true)) => RequestError::new(
            "execution failed to complete synchronously: a resolver returned a future",
        )
        .into(),
        Some((ExecuteResult::Incremental(_), _)) => RequestError::new(
            "@defer and @stream require asynchronous execution",
        )
        .into(),
        Some((ExecuteResult::Complete(response), false)) => response,
    }
}

/// Also reports whether any resolver suspended, for [`execute_sync`].
async fn execute_inner(request: Request) -> (ExecuteResult, bool) {
    match execute_request(request).await {
        Ok(result) => result,
        Err(request_error) => (ExecuteResult::Complete(request_error.into()), false),
    }
}

async fn execute_request(request: Request) -> Result<(ExecuteResult, bool), RequestError> {
    let Request {
        schema,
        document,
        root_value,
        variable_values,
        operation_name,
    } = request;
    let operation = document.get_operation(operation_name.as_deref())?.clone();
    let coerced_variables = match coerce_variable_values(
        &schema,
        &operation,
        &variable_values,
        &document.sources,
        None,
    ) {
        Ok(values) => values.into_inner(),
        Err(errors) => {
            return Ok((
                ExecuteResult::Complete(Response::from_errors(errors)),
                false,
            ))
        }
    };
    let root_type_name = schema
        .root_operation(operation.operation_type)
        .cloned()
        .ok_or_else(|| {
            RequestError::new(format!(
                "the schema does not support {} operations",
                operation.operation_type
            ))
        })?;
    let root_type = schema.get_object(&root_type_name).cloned().ok_or_else(|| {
        RequestError::new(format!(
            "the {} root type {root_type_name} is not an object type",
            operation.operation_type
        ))
    })?;
    let graph = uses_incremental_delivery(&document, &operation)
        .then(|| Arc::new(IncrementalGraph::new()));
    let ctx = Arc::new(ExecutionContext {
        schema,
        document,
        variable_values: coerced_variables,
        incremental: graph.as_ref().map(Arc::downgrade),
        suspended: AtomicBool::new(false),
    });
    let mode = if operation.is_mutation() {
        ExecutionMode::Sequential
    } else {
        ExecutionMode::Normal
    };
    let errors = ErrorSink::default();
    let result = engine::execute_selection_set(
        &ctx,
        &errors,
        None,
        Vec::new(),
        mode,
        root_type,
        root_value,
        operation.selection_set.clone(),
    )
    .await;
    let errors = take_errors(errors);
    let data = match result {
        Ok(map) => ResponseData::Object(map),
        Err(PropagateNull) => {
            // Everything below the root is discarded with it
            if let Some(graph) = &graph {
                graph.cancel_under(&[]);
            }
            ResponseData::Null
        }
    };
    let suspended = ctx.suspended.load(Ordering::Relaxed);
    let response = Response {
        errors,
        data,
        extensions: JsonMap::new(),
    };
    let result = match graph {
        Some(graph) if graph.has_pending() => ExecuteResult::Incremental(IncrementalResponse {
            initial: InitialResponse {
                response,
                has_next: true,
            },
            subsequent: SubsequentPayloads::new(graph),
        }),
        // `@defer(if: false)` and fully-delivered streams
        // collapse to a complete response
        _ => ExecuteResult::Complete(response),
    };
    Ok((result, suspended))
}

/// Whether the operation (or any fragment of the document) can produce
/// deferred or streamed results.
fn uses_incremental_delivery(
    document: &ExecutableDocument,
    operation: &ast::OperationDefinition,
) -> bool {
    fn scan(selections: &[Selection]) -> bool {
        selections.iter().any(|selection| match selection {
            Selection::Field(field) => {
                field.directives.has("stream") || scan(&field.selection_set)
            }
            Selection::FragmentSpread(spread) => spread.directives.has("defer"),
            Selection::InlineFragment(inline) => {
                inline.directives.has("defer") || scan(&inline.selection_set)
            }
        })
    }
    scan(&operation.selection_set)
        || document
            .fragments
            .values()
            .any(|fragment| scan(&fragment.selection_set))
}
