//! The seam between the executor and user data sources.

use crate::execution::response::JsonMap;
use crate::execution::response::JsonValue;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::FutureExt;
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;

/// A GraphQL object value whose fields can be resolved during execution.
pub type SharedResolver = Arc<dyn Resolver>;

/// A stream of source events for one subscription,
/// produced by [`Resolver::resolve_subscription`].
pub type SourceEventStream = BoxStream<'static, Result<ResolvedValue, ResolveError>>;

/// Abstraction for implementing field resolvers.
///
/// A resolver may return values synchronously, or hand back
/// [`ResolvedValue::Pending`] futures and [`ResolvedValue::Stream`]s for work
/// that completes later; the executor awaits siblings together. Fully
/// synchronous resolvers keep the whole execution synchronous.
pub trait Resolver: Send + Sync {
    /// The name of the concrete object type this resolver represents.
    ///
    /// The name is expected to be that of an object type defined in the
    /// schema. It is consulted when the schema indicates an abstract
    /// (interface or union) type at this position.
    fn type_name(&self) -> &str;

    /// Resolves a field of this object with the given coerced arguments.
    ///
    /// The result is expected to match the type of the corresponding field
    /// definition in the schema.
    fn resolve_field(
        &self,
        field_name: &str,
        arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError>;

    /// Resolves the root field of a subscription operation to a stream of
    /// source events. Each event is then executed as a query against the
    /// event value.
    fn resolve_subscription(
        &self,
        field_name: &str,
        arguments: &JsonMap,
    ) -> Result<SourceEventStream, ResolveError> {
        let _ = arguments;
        Err(ResolveError::new(format!(
            "the field {field_name} of type {} does not support subscriptions",
            self.type_name(),
        )))
    }
}

/// An error returned by a [`Resolver`]; recorded as a field error
/// at the position of the field that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    pub message: String,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn unknown_field(field_name: &str, object: &dyn Resolver) -> Self {
        Self {
            message: format!(
                "unexpected field name: {field_name} in type {}",
                object.type_name()
            ),
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ResolveError {}

/// The value of a resolved field.
pub enum ResolvedValue {
    /// * JSON null represents GraphQL null
    /// * A GraphQL enum value is represented as a JSON string
    /// * GraphQL built-in scalars are coerced according to their respective
    ///   *Result Coercion* spec
    /// * For custom scalars, any JSON value is passed through as-is
    ///   (including array or object) unless a coercer is registered
    Leaf(JsonValue),

    /// Expected where the GraphQL type is an object, interface, or union type
    Object(SharedResolver),

    /// Expected for GraphQL list types
    List(Vec<ResolvedValue>),

    /// A lazily produced list; with `@stream`, items beyond `initialCount`
    /// are pulled only as incremental payloads are emitted
    Iter(Box<dyn Iterator<Item = Result<ResolvedValue, ResolveError>> + Send>),

    /// An asynchronously produced list
    Stream(BoxStream<'static, Result<ResolvedValue, ResolveError>>),

    /// A value that is not available yet. The executor suspends on it;
    /// pending siblings are awaited together.
    Pending(BoxFuture<'static, Result<ResolvedValue, ResolveError>>),
}

impl ResolvedValue {
    /// A null leaf value
    pub fn null() -> Self {
        Self::Leaf(JsonValue::Null)
    }

    /// A leaf value from anything convertible to JSON
    pub fn leaf(json: impl Into<JsonValue>) -> Self {
        Self::Leaf(json.into())
    }

    /// An object value from the resolver for that object
    pub fn object(resolver: impl Resolver + 'static) -> Self {
        Self::Object(Arc::new(resolver))
    }

    /// An object value or null, from an optional resolver
    pub fn opt_object(opt_resolver: Option<impl Resolver + 'static>) -> Self {
        match opt_resolver {
            Some(resolver) => Self::object(resolver),
            None => Self::null(),
        }
    }

    /// A list value with all items already produced
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// A list value produced lazily by an iterator
    pub fn iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Result<Self, ResolveError>>,
        I::IntoIter: Send + 'static,
    {
        Self::Iter(Box::new(iter.into_iter()))
    }

    /// A list value produced asynchronously by a stream
    pub fn stream(
        stream: impl futures::Stream<Item = Result<Self, ResolveError>> + Send + 'static,
    ) -> Self {
        Self::Stream(stream.boxed())
    }

    /// A value that will be produced by the given future
    pub fn pending(
        future: impl std::future::Future<Output = Result<Self, ResolveError>> + Send + 'static,
    ) -> Self {
        Self::Pending(future.boxed())
    }
}

impl fmt::Debug for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(json) => f.debug_tuple("Leaf").field(json).finish(),
            Self::Object(resolver) => f.debug_tuple("Object").field(&resolver.type_name()).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Iter(_) => f.write_str("Iter(..)"),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// The default resolver over plain JSON data: a field resolves to the value
/// under its key, nested objects resolve recursively, and a `__typename` key
/// names the concrete type where the schema expects an abstract type.
///
/// Absent keys resolve to null.
#[derive(Debug, Clone)]
pub struct JsonResolver {
    type_name: String,
    fields: JsonMap,
}

impl JsonResolver {
    pub fn new(type_name: impl Into<String>, fields: JsonMap) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Wrap a JSON object, taking the type name from its `__typename` entry.
    pub fn from_object(fields: JsonMap) -> Self {
        let type_name = fields
            .get("__typename")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_owned();
        Self { type_name, fields }
    }

    fn convert(value: &JsonValue) -> ResolvedValue {
        match value {
            JsonValue::Array(items) => ResolvedValue::List(items.iter().map(Self::convert).collect()),
            JsonValue::Object(fields) => ResolvedValue::object(Self::from_object(fields.clone())),
            other => ResolvedValue::Leaf(other.clone()),
        }
    }
}

impl Resolver for JsonResolver {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn resolve_field(
        &self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        Ok(match self.fields.get(field_name) {
            Some(value) => Self::convert(value),
            None => ResolvedValue::null(),
        })
    }
}
