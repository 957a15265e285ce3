//! The [GraphQL response format](https://spec.graphql.org/October2021/#sec-Response-Format),
//! including the additional payload shapes of incremental delivery.

use crate::SourceMap;
use graphyne_parser::LineColumn;
use graphyne_parser::Name;
use graphyne_parser::SourceSpan;
use serde::Deserialize;
use serde::Serialize;

pub type JsonValue = serde_json::Value;
pub type JsonMap = serde_json::Map<String, JsonValue>;

/// A GraphQL response to a query or mutation,
/// or one response of a subscription stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    // <https://spec.graphql.org/October2021/#note-6f005> suggests serializing this first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub errors: Vec<GraphQLError>,

    #[serde(skip_serializing_if = "ResponseData::is_absent")]
    #[serde(default = "ResponseData::absent")]
    pub data: ResponseData,

    #[serde(skip_serializing_if = "JsonMap::is_empty")]
    #[serde(default)]
    pub extensions: JsonMap,
}

/// The `data` entry of a [`Response`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Option<JsonMap>")]
pub enum ResponseData {
    /// Execution returned an object.
    Object(JsonMap),

    /// Execution encountered a field error on a non-null field, and null was
    /// propagated all the way to the root of the response.
    /// Serialized as JSON null.
    Null,

    /// A request error was encountered. Execution did not start.
    /// Skipped from serialization.
    Absent,
}

/// The first payload of an incremental-delivery response: the usual response
/// fields plus `hasNext`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialResponse {
    #[serde(flatten)]
    pub response: Response,

    #[serde(rename = "hasNext")]
    pub has_next: bool,
}

/// A subsequent payload of an incremental-delivery response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsequentResponse {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub incremental: Vec<IncrementalPayload>,

    #[serde(rename = "hasNext")]
    pub has_next: bool,
}

/// One completed unit of deferred or streamed work inside a
/// [`SubsequentResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncrementalPayload {
    /// The fields of a fragment that was deferred with `@defer`
    Defer {
        /// `None` when a non-null field error nulled the whole fragment
        data: Option<JsonMap>,

        path: Vec<PathSegment>,

        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(default)]
        label: Option<String>,

        #[serde(skip_serializing_if = "Vec::is_empty")]
        #[serde(default)]
        errors: Vec<GraphQLError>,
    },

    /// A batch of list items that were streamed with `@stream`
    Stream {
        /// `None` when a non-null field error nulled the batch
        items: Option<Vec<JsonValue>>,

        /// Path of the first item in the batch (ending in its list index)
        path: Vec<PathSegment>,

        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(default)]
        label: Option<String>,

        #[serde(skip_serializing_if = "Vec::is_empty")]
        #[serde(default)]
        errors: Vec<GraphQLError>,
    },
}

/// A request error that aborted the handling of a request
/// before execution started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(transparent)]
#[error("{}", .0.message)]
pub struct RequestError(pub GraphQLError);

/// A serializable [error](https://spec.graphql.org/October2021/#sec-Errors.Error-result-format),
/// as found in a GraphQL response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,

    /// Source locations relevant to the error, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub locations: Vec<GraphQLLocation>,

    /// If non-empty, the error is a field error for the particular field
    /// found at this path in the response data.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub path: Vec<PathSegment>,

    #[serde(skip_serializing_if = "JsonMap::is_empty")]
    #[serde(default)]
    pub extensions: JsonMap,

    /// The byte span behind `locations`, kept for diagnostic rendering.
    /// Not part of the response format.
    #[serde(skip)]
    pub(crate) source_span: Option<SourceSpan>,
}

impl PartialEq for GraphQLError {
    fn eq(&self, other: &Self) -> bool {
        let Self {
            message,
            locations,
            path,
            extensions,
            source_span: _, // presentation detail
        } = self;
        *message == other.message
            && *locations == other.locations
            && *path == other.path
            && *extensions == other.extensions
    }
}

/// A source location (line and column numbers) for a [`GraphQLError`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphQLLocation {
    /// Starting at 1 for the first line.
    pub line: usize,
    /// Starting at 1 and counting characters (Unicode Scalar Values)
    /// like [`str::chars`].
    pub column: usize,
}

/// An element of [`GraphQLError::path`] or an incremental payload path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// The relevant key in an object value
    Field(Name),

    /// The index of the relevant item in a list value
    ListIndex(usize),
}

/// The path from the response root to one field, cheap to extend per level.
pub type ResponsePath = Vec<PathSegment>;

impl GraphQLError {
    pub fn new(
        message: impl Into<String>,
        location: Option<SourceSpan>,
        sources: &SourceMap,
    ) -> Self {
        Self {
            message: message.into(),
            locations: GraphQLLocation::from_span(sources, location)
                .into_iter()
                .collect(),
            path: Vec::new(),
            extensions: JsonMap::new(),
            source_span: location,
        }
    }

    /// The byte span behind the error's first location, when known.
    pub fn source_span(&self) -> Option<SourceSpan> {
        self.source_span
    }

    /// A field error, recorded at the given response path.
    pub fn field_error(
        message: impl Into<String>,
        path: &[PathSegment],
        location: Option<SourceSpan>,
        sources: &SourceMap,
    ) -> Self {
        let mut error = Self::new(message, location, sources);
        error.path = path.to_vec();
        error
    }
}

impl GraphQLLocation {
    /// Convert a [`SourceSpan`] to a line and column number
    pub fn from_span(sources: &SourceMap, location: Option<SourceSpan>) -> Option<Self> {
        let location = location?;
        let source = sources.get(&location.file_id())?;
        source
            .get_line_column(location.offset())
            .map(|LineColumn { line, column }| GraphQLLocation { line, column })
    }
}

impl RequestError {
    pub fn new(message: impl ToString) -> Self {
        Self(GraphQLError {
            message: message.to_string(),
            locations: Default::default(),
            path: Default::default(),
            extensions: Default::default(),
            source_span: None,
        })
    }

    pub fn with_location(mut self, location: Option<SourceSpan>, sources: &SourceMap) -> Self {
        self.0.locations = GraphQLLocation::from_span(sources, location)
            .into_iter()
            .collect();
        self.0.source_span = location;
        self
    }
}

impl Response {
    pub fn from_errors(errors: Vec<GraphQLError>) -> Self {
        Self {
            errors,
            data: ResponseData::Absent,
            extensions: JsonMap::new(),
        }
    }
}

impl ResponseData {
    /// For serde `skip_serializing_if`
    fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// For serde `default`
    fn absent() -> Self {
        Self::Absent
    }

    pub fn as_object(&self) -> Option<&JsonMap> {
        match self {
            Self::Object(map) => Some(map),
            Self::Null | Self::Absent => None,
        }
    }
}

impl Serialize for ResponseData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ResponseData::Absent => {
                panic!("ResponseData::Absent should be skipped from serialization")
            }
            ResponseData::Null => serializer.serialize_unit(),
            ResponseData::Object(map) => map.serialize(serializer),
        }
    }
}

impl From<Option<JsonMap>> for ResponseData {
    fn from(value: Option<JsonMap>) -> Self {
        match value {
            Some(data) => Self::Object(data),
            None => Self::Null,
        }
    }
}

impl From<RequestError> for Response {
    fn from(error: RequestError) -> Self {
        Self {
            errors: vec![error.0],
            data: ResponseData::Absent,
            extensions: JsonMap::new(),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            PathSegment::Field(name) => serializer.serialize_str(name.as_str()),
            PathSegment::ListIndex(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

impl<'de> Deserialize<'de> for PathSegment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        match value {
            JsonValue::String(field) => Name::new(&field)
                .map(PathSegment::Field)
                .map_err(serde::de::Error::custom),
            JsonValue::Number(index) => index
                .as_u64()
                .map(|index| PathSegment::ListIndex(index as usize))
                .ok_or_else(|| serde::de::Error::custom("expected an unsigned list index")),
            _ => Err(serde::de::Error::custom(
                "expected a response key or a list index",
            )),
        }
    }
}
