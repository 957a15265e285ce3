//! Schema introspection: the meta-field resolvers, the canonical
//! introspection query, and conversions between schemas and introspection
//! responses.

mod client_schema;
mod query;
mod resolvers;

pub use self::client_schema::build_client_schema;
pub use self::query::get_introspection_query;
pub use self::query::IntrospectionQueryOptions;
pub(crate) use self::resolvers::schema_resolver;
pub(crate) use self::resolvers::type_resolver;

use crate::execution::execute_sync;
use crate::execution::GraphQLError;
use crate::execution::JsonMap;
use crate::execution::Request;
use crate::execution::ResolveError;
use crate::execution::ResolvedValue;
use crate::execution::Resolver;
use crate::execution::ResponseData;
use crate::validation::Valid;
use crate::ExecutableDocument;
use crate::Schema;
use std::sync::Arc;

/// Execute the introspection query against the schema and return the
/// response data (the object holding `"__schema"`).
pub fn introspection_from_schema(
    schema: &Arc<Valid<Schema>>,
    options: IntrospectionQueryOptions,
) -> Result<JsonMap, Vec<GraphQLError>> {
    let document = ExecutableDocument::parse(
        get_introspection_query(options),
        "introspection.graphql",
    )
    .expect("the introspection query is valid");
    let request = Request::new(
        schema.clone(),
        Arc::new(Valid::assume_valid(document)),
        Arc::new(IntrospectionRoot),
    );
    let response = execute_sync(request);
    if !response.errors.is_empty() {
        return Err(response.errors);
    }
    match response.data {
        ResponseData::Object(data) => Ok(data),
        ResponseData::Null | ResponseData::Absent => Err(Vec::new()),
    }
}

/// Root value for introspection-only execution: every non-meta field is null.
struct IntrospectionRoot;

impl Resolver for IntrospectionRoot {
    fn type_name(&self) -> &str {
        ""
    }

    fn resolve_field(
        &self,
        _field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        Ok(ResolvedValue::null())
    }
}
