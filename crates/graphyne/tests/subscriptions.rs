//! Subscriptions: source event streams mapped to one response per event.

use crate::test_document;
use crate::test_schema;
use futures::StreamExt;
use graphyne::subscribe;
use graphyne::JsonMap;
use graphyne::Request;
use graphyne::ResolveError;
use graphyne::ResolvedValue;
use graphyne::Resolver;
use graphyne::SourceEventStream;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

struct Broker;

impl Resolver for Broker {
    fn type_name(&self) -> &str {
        "Subscription"
    }

    fn resolve_field(
        &self,
        field_name: &str,
        _arguments: &JsonMap,
    ) -> Result<ResolvedValue, ResolveError> {
        Err(ResolveError::unknown_field(field_name, self))
    }

    fn resolve_subscription(
        &self,
        field_name: &str,
        arguments: &JsonMap,
    ) -> Result<SourceEventStream, ResolveError> {
        match field_name {
            "counter" => {
                let up_to = arguments
                    .get("upTo")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(3);
                Ok(futures::stream::iter(
                    (1..=up_to).map(|event| Ok(ResolvedValue::leaf(event))),
                )
                .boxed())
            }
            "broken" => Ok(futures::stream::iter([
                Ok(ResolvedValue::leaf(1)),
                Err(ResolveError::new("source failed")),
            ])
            .boxed()),
            other => Err(ResolveError::new(format!("no such subscription {other}"))),
        }
    }
}

const SDL: &str = "
    type Query { unused: Int }
    type Subscription { counter(upTo: Int): Int broken: Int }
";

#[tokio::test]
async fn each_event_produces_a_response() {
    let schema = test_schema(SDL);
    let document = test_document(&schema, "subscription { counter(upTo: 3) }");
    let responses = subscribe(Request::new(schema, document, Arc::new(Broker)))
        .await
        .expect("the source stream starts");
    let collected: Vec<_> = responses
        .map(|response| serde_json::to_value(&response).unwrap())
        .collect()
        .await;
    assert_eq!(
        collected,
        vec![
            json!({ "data": { "counter": 1 } }),
            json!({ "data": { "counter": 2 } }),
            json!({ "data": { "counter": 3 } }),
        ]
    );
}

#[tokio::test]
async fn source_stream_errors_become_error_responses() {
    let schema = test_schema(SDL);
    let document = test_document(&schema, "subscription { broken }");
    let responses = subscribe(Request::new(schema, document, Arc::new(Broker)))
        .await
        .expect("the source stream starts");
    let collected: Vec<_> = responses
        .map(|response| serde_json::to_value(&response).unwrap())
        .collect()
        .await;
    assert_eq!(collected[0], json!({ "data": { "broken": 1 } }));
    assert_eq!(collected[1]["data"], json!(null));
    assert_eq!(
        collected[1]["errors"][0]["message"],
        json!("source failed")
    );
}

#[tokio::test]
async fn subscribing_to_a_query_operation_is_an_error() {
    let schema = test_schema(SDL);
    let document = test_document(&schema, "{ unused }");
    let error = subscribe(Request::new(schema, document, Arc::new(Broker)))
        .await
        .err()
        .expect("subscribe rejects query operations");
    let body = serde_json::to_value(&*error).unwrap();
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("subscription operation"));
}

#[tokio::test]
async fn aliases_apply_to_subscription_responses() {
    let schema = test_schema(SDL);
    let document = test_document(&schema, "subscription { current: counter(upTo: 1) }");
    let responses = subscribe(Request::new(schema, document, Arc::new(Broker)))
        .await
        .expect("the source stream starts");
    let collected: Vec<_> = responses
        .map(|response| serde_json::to_value(&response).unwrap())
        .collect()
        .await;
    assert_eq!(collected, vec![json!({ "data": { "current": 1 } })]);
}
