//! End-to-end invocations against a local echo backend.

use openapi_bridge::error::UpstreamCause;
use openapi_bridge::error::MissingKind;
use openapi_bridge::{
    BridgeBuilder, BridgeError, CallArguments, CancelHandle, ComponentSet, ComponentType,
    InvocationPayload, MethodSet, RouteMap, UpstreamClient,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod common;

use common::{shop_spec, start_echo_backend, EchoBackend};

fn components(backend: &EchoBackend) -> ComponentSet {
    BridgeBuilder::new()
        .client(UpstreamClient::new(&backend.url()).unwrap())
        .build(&shop_spec())
        .unwrap()
}

fn echoed(result: &openapi_bridge::InvocationResult) -> &Value {
    result.json().expect("echo backend answers with JSON")
}

#[tokio::test]
async fn test_query_filtering() {
    let backend = start_echo_backend().await;
    let set = components(&backend);

    let args = CallArguments::from_json(json!({
        "category": "electronics",
        "min_price": 100,
        "max_price": null,
        "brand": ""
    }))
    .unwrap();
    let result = set.invoke("searchProducts", args).await.unwrap();

    let body = echoed(&result);
    assert_eq!(body["method"], "GET");
    assert_eq!(body["path"], "/products");
    assert_eq!(body["query"], "category=electronics&min_price=100");
}

#[tokio::test]
async fn test_missing_path_parameter_sends_nothing() {
    let backend = start_echo_backend().await;
    let set = components(&backend);

    let err = set
        .invoke(
            "getProduct",
            CallArguments::from_json(json!({"product_id": null})).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::MissingRequiredParameter { .. }));
    assert_eq!(err.missing_names().unwrap(), ["product_id"]);
    assert_eq!(backend.hits(), 0);

    let err = set
        .call_action("deleteProduct", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing required path parameters: {product_id}");
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn test_path_substitution() {
    let backend = start_echo_backend().await;
    let set = components(&backend);

    let result = set
        .invoke("getProduct", CallArguments::new().with("product_id", json!(123)))
        .await
        .unwrap();
    assert_eq!(echoed(&result)["path"], "/products/123");
}

#[tokio::test]
async fn test_read_template_uri() {
    let backend = start_echo_backend().await;
    let set = components(&backend);

    let result = set.read("resource://getProduct/42").await.unwrap();
    assert!(result.is_success());
    assert_eq!(echoed(&result)["path"], "/products/42");
    assert_eq!(echoed(&result)["method"], "GET");
}

#[tokio::test]
async fn test_read_resource_uses_defaults() {
    let backend = start_echo_backend().await;
    let set = components(&backend);

    let result = set.read_resource("resource://getStats").await.unwrap();
    assert_eq!(echoed(&result)["path"], "/stats");
    assert_eq!(echoed(&result)["query"], "window=24h");
}

#[tokio::test]
async fn test_json_body_and_header() {
    let backend = start_echo_backend().await;
    let set = components(&backend);

    let result = set
        .call_action(
            "createProduct",
            json!({"name": "lamp", "price": 12.5, "X-Request-Source": "test"}),
        )
        .await
        .unwrap();
    let body = echoed(&result);
    assert_eq!(body["method"], "POST");
    assert_eq!(body["headers"]["x-request-source"], "test");
    assert_eq!(body["headers"]["content-type"], "application/json");
    let sent: Value = serde_json::from_str(body["body"].as_str().unwrap()).unwrap();
    assert_eq!(sent, json!({"name": "lamp", "price": 12.5}));
}

#[tokio::test]
async fn test_missing_body_fields() {
    let backend = start_echo_backend().await;
    let set = components(&backend);

    let err = set.call_action("createProduct", json!({"tags": ["a"]})).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing required body parameters: {name, price}");
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn test_optional_body_may_be_omitted() {
    let backend = start_echo_backend().await;
    let doc = common::openapi(json!({
        "paths": {
            "/notes": {
                "post": {
                    "operationId": "createNote",
                    "requestBody": {
                        "required": false,
                        "content": {"application/json": {"schema": {
                            "type": "object",
                            "required": ["title"],
                            "properties": {
                                "title": {"type": "string"},
                                "text": {"type": "string"}
                            }
                        }}}
                    }
                }
            }
        }
    }));
    let set = BridgeBuilder::new()
        .client(UpstreamClient::new(&backend.url()).unwrap())
        .build(&doc)
        .unwrap();

    let schema = &set.get("createNote").unwrap().input_schema;
    assert!(schema
        .get("required")
        .and_then(Value::as_array)
        .map_or(true, |names| names.is_empty()));

    let result = set.call_action("createNote", json!({})).await.unwrap();
    assert_eq!(echoed(&result)["body"], "");
    assert_eq!(backend.hits(), 1);

    let err = set
        .call_action("createNote", json!({"text": "draft"}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing required body parameters: {title}");
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_resource_with_required_path_parameter() {
    let backend = start_echo_backend().await;
    let set = BridgeBuilder::new()
        .client(UpstreamClient::new(&backend.url()).unwrap())
        .route_maps(vec![RouteMap::new(
            MethodSet::only([reqwest::Method::GET]),
            "^/products/",
            ComponentType::Resource,
        )
        .unwrap()])
        .build(&shop_spec())
        .unwrap();

    let product = set.get("getProduct").unwrap();
    assert_eq!(product.kind, ComponentType::Resource);
    assert_eq!(product.uri.as_deref(), Some("resource://getProduct"));

    let err = set.read_resource("resource://getProduct").await.unwrap_err();
    match &err {
        BridgeError::MissingRequiredParameter { kind, names } => {
            assert_eq!(*kind, MissingKind::Path);
            assert_eq!(names, &["product_id"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "Missing required path parameters: {product_id}");
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn test_form_body() {
    let backend = start_echo_backend().await;
    let set = components(&backend);

    let result = set
        .call_action("login", json!({"username": "ada", "password": "s3cret"}))
        .await
        .unwrap();
    let body = echoed(&result);
    assert_eq!(body["headers"]["content-type"], "application/x-www-form-urlencoded");
    assert_eq!(body["body"], "username=ada&password=s3cret");
}

#[tokio::test]
async fn test_default_headers_yield_to_call_headers() {
    let backend = start_echo_backend().await;
    let client = UpstreamClient::new(&backend.url())
        .unwrap()
        .with_default_header("X-Request-Source", "default")
        .unwrap()
        .with_default_header("Authorization", "Bearer token")
        .unwrap();
    let set = BridgeBuilder::new().client(client).build(&shop_spec()).unwrap();

    let with_call_header = set
        .call_action("createProduct", json!({"name": "a", "price": 1, "X-Request-Source": "call"}))
        .await
        .unwrap();
    let headers = &echoed(&with_call_header)["headers"];
    assert_eq!(headers["x-request-source"], "call");
    assert_eq!(headers["authorization"], "Bearer token");

    let without = set
        .call_action("createProduct", json!({"name": "a", "price": 1}))
        .await
        .unwrap();
    assert_eq!(echoed(&without)["headers"]["x-request-source"], "default");
}

#[tokio::test]
async fn test_error_status_is_a_result() {
    let backend = start_echo_backend().await;
    let set = components(&backend);

    let result = set.call_action("alwaysMissing", json!({})).await.unwrap();
    assert_eq!(result.status, 404);
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_timeout_is_upstream_error() {
    let backend = start_echo_backend().await;
    let set = BridgeBuilder::new()
        .client(UpstreamClient::new(&backend.url()).unwrap())
        .timeout(Duration::from_millis(100))
        .build(&shop_spec())
        .unwrap();

    let start = Instant::now();
    let err = set.call_action("slowReport", json!({})).await.unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(2));
    match err {
        BridgeError::UpstreamRequest { source, .. } => {
            assert!(matches!(source, UpstreamCause::Timeout(_)))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_upstream_error() {
    let set = BridgeBuilder::new()
        .client(UpstreamClient::new("http://127.0.0.1:9").unwrap())
        .build(&shop_spec())
        .unwrap();
    let err = set.read_resource("resource://getStats").await.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UpstreamRequest { source: UpstreamCause::Http(_), .. }
    ));
}

#[tokio::test]
async fn test_cancellation() {
    let backend = start_echo_backend().await;
    let set = Arc::new(components(&backend));
    let (handle, signal) = CancelHandle::pair();

    let task = {
        let set = set.clone();
        tokio::spawn(async move {
            set.invoke_cancellable("slowReport", CallArguments::new(), signal).await
        })
    };

    while backend.hits() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("cancelled invocation returns promptly")
        .unwrap();
    assert!(matches!(result, Err(BridgeError::Cancelled)));
}

#[tokio::test]
async fn test_concurrent_invocations() {
    let backend = start_echo_backend().await;
    let set = Arc::new(components(&backend));

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let set = set.clone();
            tokio::spawn(async move {
                set.invoke("getProduct", CallArguments::new().with("product_id", json!(i)))
                    .await
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let result = task.await.unwrap().unwrap();
        assert_eq!(echoed(&result)["path"], format!("/products/{i}"));
    }
    assert_eq!(backend.hits(), 20);
}

#[tokio::test]
async fn test_text_and_binary_payloads() {
    let addr = common::start_programmable_backend(|| async {
        (200, "text/plain", "plain words".to_string())
    })
    .await;
    let set = BridgeBuilder::new()
        .client(UpstreamClient::new(&format!("http://{addr}")).unwrap())
        .build(&shop_spec())
        .unwrap();

    let result = set.read_resource("resource://getStats").await.unwrap();
    assert_eq!(result.payload, InvocationPayload::Text("plain words".into()));
    assert_eq!(result.content_type.as_deref(), Some("text/plain"));
}
