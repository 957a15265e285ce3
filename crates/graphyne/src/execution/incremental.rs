//! Bookkeeping for `@defer` and `@stream`: which subsequent results the
//! client has been told to expect, which have completed, and in what order
//! their payloads may be released.

use crate::execution::engine::execute_selection_set;
use crate::execution::engine::take_errors;
use crate::execution::engine::try_nullify;
use crate::execution::engine::ErrorSink;
use crate::execution::engine::ExecutionContext;
use crate::execution::engine::ExecutionMode;
use crate::execution::engine::PropagateNull;
use crate::execution::engine::push_error;
use crate::execution::resolver::ResolveError;
use crate::execution::resolver::ResolvedValue;
use crate::execution::resolver::SharedResolver;
use crate::execution::response::IncrementalPayload;
use crate::execution::response::SubsequentResponse;
use crate::execution::result_coercion::complete_value;
use crate::execution::result_coercion::ListSource;
use crate::execution::GraphQLError;
use crate::execution::PathSegment;
use crate::execution::ResponsePath;
use crate::schema::ObjectType;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::FutureExt;
use futures::Stream;
use futures::StreamExt;
use graphyne_parser::ast;
use graphyne_parser::ast::Selection;
use graphyne_parser::Node;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::task::Context;
use std::task::Poll;

/// Identifies one subsequent result record for parent/child bookkeeping.
pub(crate) type RecordId = u64;

/// A fragment whose fields were held back by `@defer` during collection.
pub(crate) struct DeferredFields {
    pub(crate) label: Option<String>,
    pub(crate) selections: Vec<Selection>,
}

/// The continuation of a streamed list: the already-pulled next item,
/// and the source to pull the rest from.
pub(crate) struct StreamNext {
    pub(crate) path: ResponsePath,
    pub(crate) label: Option<String>,
    pub(crate) index: usize,
    pub(crate) inner_ty: ast::Type,
    pub(crate) fields: Arc<Vec<Node<ast::Field>>>,
    pub(crate) item: Result<ResolvedValue, ResolveError>,
    pub(crate) source: ListSource,
}

/// Tracks deferred fragments and streamed items for one request.
///
/// Record tasks are created during execution but only polled by
/// [`SubsequentPayloads`], so nothing runs before the initial payload is
/// produced and dropping the payload stream cancels all remaining work.
#[derive(Default)]
pub(crate) struct IncrementalGraph {
    state: Mutex<GraphState>,
}

#[derive(Default)]
struct GraphState {
    next_id: RecordId,
    /// Subsequent results the client has been told to expect,
    /// in insertion order. Entries leave this map when their payload is
    /// emitted, or when a nulled ancestor cancels them.
    pending: IndexMap<RecordId, PendingRecord>,
    /// Records whose payload was already emitted.
    delivered: HashSet<RecordId>,
    /// Cancelled records; completions arriving for them are dropped.
    cancelled: HashSet<RecordId>,
    /// Completed records ready to emit, in completion order.
    completed: VecDeque<CompletedRecord>,
    /// Record tasks awaiting their first poll by the payload stream.
    tasks: Vec<BoxFuture<'static, ()>>,
    /// Paths nulled by non-null propagation; no new record may start
    /// beneath them.
    nulled_paths: Vec<ResponsePath>,
}

impl GraphState {
    fn is_nulled(&self, path: &[PathSegment]) -> bool {
        self.nulled_paths
            .iter()
            .any(|nulled| path.starts_with(nulled))
    }
}

struct PendingRecord {
    parent: Option<RecordId>,
    path: ResponsePath,
}

struct CompletedRecord {
    id: RecordId,
    parent: Option<RecordId>,
    payload: IncrementalPayload,
}

impl IncrementalGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GraphState> {
        self.state.lock().expect("incremental graph poisoned")
    }

    fn register(
        &self,
        parent: Option<RecordId>,
        path: ResponsePath,
    ) -> RecordId {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.pending.insert(id, PendingRecord { parent, path });
        id
    }

    fn complete(&self, id: RecordId, parent: Option<RecordId>, payload: IncrementalPayload) {
        let mut state = self.lock();
        if state.cancelled.contains(&id) {
            return;
        }
        state.completed.push_back(CompletedRecord {
            id,
            parent,
            payload,
        });
    }

    fn push_task(&self, task: BoxFuture<'static, ()>) {
        self.lock().tasks.push(task);
    }

    /// A non-null error nulled the value at `path`: subsequent results
    /// beneath it would be filtered out, so stop tracking and running them.
    pub(crate) fn cancel_under(&self, path: &[PathSegment]) {
        let mut state = self.lock();
        state.nulled_paths.push(path.to_vec());
        let cancelled: Vec<RecordId> = state
            .pending
            .iter()
            .filter(|(_, record)| record.path.starts_with(path))
            .map(|(id, _)| *id)
            .collect();
        for id in cancelled {
            state.pending.shift_remove(&id);
            state.cancelled.insert(id);
        }
    }

    /// Register a deferred fragment and queue its execution.
    pub(crate) fn defer_fragment(
        self: &Arc<Self>,
        ctx: &Arc<ExecutionContext>,
        parent: Option<RecordId>,
        path: ResponsePath,
        object_type: Node<ObjectType>,
        object_value: SharedResolver,
        fields: DeferredFields,
    ) {
        if self.lock().is_nulled(&path) {
            return;
        }
        let id = self.register(parent, path.clone());
        let graph = self.clone();
        let ctx = ctx.clone();
        let DeferredFields { label, selections } = fields;
        let task = async move {
            let errors = ErrorSink::default();
            let result = execute_selection_set(
                &ctx,
                &errors,
                Some(id),
                path.clone(),
                ExecutionMode::Normal,
                object_type,
                object_value,
                selections,
            )
            .await;
            let errors = take_errors(errors);
            let payload = match result {
                Ok(data) => IncrementalPayload::Defer {
                    data: Some(data),
                    path,
                    label,
                    errors,
                },
                // A non-null error inside the fragment nulls its payload
                Err(PropagateNull) => IncrementalPayload::Defer {
                    data: None,
                    path,
                    label,
                    errors,
                },
            };
            graph.complete(id, parent, payload);
        };
        self.push_task(task.boxed());
    }

    /// Register the next streamed item and queue its completion. Each item's
    /// task pulls one item ahead before publishing, then chains the next
    /// record, which keeps items in index order and `hasNext` accurate.
    pub(crate) fn stream_items(
        self: &Arc<Self>,
        ctx: &Arc<ExecutionContext>,
        parent: Option<RecordId>,
        next: StreamNext,
    ) {
        let mut item_path = next.path.clone();
        item_path.push(PathSegment::ListIndex(next.index));
        if self.lock().is_nulled(&item_path) {
            return;
        }
        let id = self.register(parent, item_path.clone());
        let graph = self.clone();
        let ctx = ctx.clone();
        let task = async move {
            let StreamNext {
                path,
                label,
                index,
                inner_ty,
                fields,
                item,
                mut source,
            } = next;
            let errors = ErrorSink::default();
            let location = fields[0].name.location();
            let item_result = match item {
                Ok(resolved) => {
                    complete_value(
                        &ctx,
                        &errors,
                        Some(id),
                        item_path.clone(),
                        ExecutionMode::Normal,
                        inner_ty.clone(),
                        resolved,
                        fields.clone(),
                    )
                    .await
                }
                Err(ResolveError { message }) => {
                    push_error(
                        &errors,
                        GraphQLError::field_error(message, &item_path, location, ctx.sources()),
                    );
                    Err(PropagateNull)
                }
            };
            let items = match try_nullify(&ctx, &inner_ty, &item_path, item_result) {
                Ok(value) => Some(vec![value]),
                // The item was non-null: this payload is filtered
                // and the stream ends
                Err(PropagateNull) => None,
            };
            let errors = take_errors(errors);
            if items.is_some() {
                if let Some(lookahead) = source.next(&ctx).await {
                    graph.stream_items(
                        &ctx,
                        parent,
                        StreamNext {
                            path,
                            label: label.clone(),
                            index: index + 1,
                            inner_ty,
                            fields,
                            item: lookahead,
                            source,
                        },
                    );
                }
            }
            graph.complete(
                id,
                parent,
                IncrementalPayload::Stream {
                    items,
                    path: item_path,
                    label,
                    errors,
                },
            );
        };
        self.push_task(task.boxed());
    }

    /// Pack every releasable completed record into one payload.
    ///
    /// A record whose parent has not been delivered yet is held back;
    /// a parent and its child may share a payload, parent first.
    fn take_payload(&self) -> Option<SubsequentResponse> {
        let mut state = self.lock();
        let mut incremental = Vec::new();
        loop {
            let mut released_any = false;
            let mut index = 0;
            while index < state.completed.len() {
                let record = &state.completed[index];
                let releasable = match record.parent {
                    Some(parent) => state.delivered.contains(&parent),
                    None => true,
                };
                if releasable {
                    let record = state
                        .completed
                        .remove(index)
                        .expect("index checked against length");
                    state.delivered.insert(record.id);
                    state.pending.shift_remove(&record.id);
                    incremental.push(record.payload);
                    released_any = true;
                } else {
                    index += 1;
                }
            }
            if !released_any {
                break;
            }
        }
        if incremental.is_empty() {
            return None;
        }
        Some(SubsequentResponse {
            incremental,
            has_next: !state.pending.is_empty(),
        })
    }
}

/// The subsequent payloads of an incremental-delivery response.
///
/// Dropping the stream cancels all pending deferred and streamed work.
pub struct SubsequentPayloads {
    graph: Arc<IncrementalGraph>,
    running: FuturesUnordered<BoxFuture<'static, ()>>,
}

impl SubsequentPayloads {
    pub(crate) fn new(graph: Arc<IncrementalGraph>) -> Self {
        Self {
            graph,
            running: FuturesUnordered::new(),
        }
    }

    fn adopt_new_tasks(&mut self) {
        let mut state = self.graph.lock();
        for task in state.tasks.drain(..) {
            self.running.push(task);
        }
    }
}

impl Stream for SubsequentPayloads {
    type Item = SubsequentResponse;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            this.adopt_new_tasks();
            if let Some(payload) = this.graph.take_payload() {
                return Poll::Ready(Some(payload));
            }
            if this.running.is_empty() {
                let state = this.graph.lock();
                if state.tasks.is_empty() {
                    // Nothing runs and nothing can complete any more
                    return Poll::Ready(None);
                }
                drop(state);
                continue;
            }
            match this.running.poll_next_unpin(cx) {
                // One record task finished; see if a payload is releasable
                Poll::Ready(Some(())) => continue,
                Poll::Ready(None) => continue,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl std::fmt::Debug for SubsequentPayloads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsequentPayloads").finish_non_exhaustive()
    }
}
