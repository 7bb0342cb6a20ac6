//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use openapiv3::OpenAPI;
use serde_json::{json, Map, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// Handle to a running echo backend.
pub struct EchoBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl EchoBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start an axum backend that echoes each request back as JSON.
///
/// - `/slow/...` sleeps five seconds before answering
/// - `/status/<code>/...` answers with that status
pub async fn start_echo_backend() -> EchoBackend {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().fallback(echo).with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    EchoBackend { addr, hits }
}

async fn echo(
    State(hits): State<Arc<AtomicUsize>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);

    let path = uri.path();
    if path.starts_with("/slow") {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    let status = path
        .strip_prefix("/status/")
        .and_then(|rest| rest.split('/').next())
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let headers: Map<String, Value> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                Value::String(v.to_str().unwrap_or_default().to_string()),
            )
        })
        .collect();

    let echoed = json!({
        "method": method.as_str(),
        "path": path,
        "query": uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    });
    (status, Json(echoed)).into_response()
}

/// Start a raw TCP backend whose replies come from `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, &'static str, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let (status, content_type, body) = f().await;
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    content_type,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Parse an OpenAPI document, filling in empty `responses` where missing.
pub fn openapi(mut doc: Value) -> OpenAPI {
    if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
        for item in paths.values_mut() {
            let Some(item) = item.as_object_mut() else { continue };
            for (key, op) in item.iter_mut() {
                if key == "parameters" || !op.is_object() {
                    continue;
                }
                if let Some(op) = op.as_object_mut() {
                    op.entry("responses").or_insert_with(|| json!({}));
                }
            }
        }
    }
    if let Some(obj) = doc.as_object_mut() {
        obj.entry("openapi").or_insert_with(|| json!("3.0.3"));
        obj.entry("info")
            .or_insert_with(|| json!({"title": "test", "version": "1"}));
    }
    serde_json::from_value(doc).unwrap()
}

/// A small shop API exercising every parameter location.
pub fn shop_spec() -> OpenAPI {
    openapi(json!({
        "paths": {
            "/products": {
                "get": {
                    "operationId": "searchProducts",
                    "parameters": [
                        {"name": "category", "in": "query", "schema": {"type": "string"}},
                        {"name": "min_price", "in": "query", "schema": {"type": "number"}},
                        {"name": "max_price", "in": "query", "schema": {"type": "number"}},
                        {"name": "brand", "in": "query", "schema": {"type": "string"}}
                    ]
                },
                "post": {
                    "operationId": "createProduct",
                    "parameters": [
                        {"name": "X-Request-Source", "in": "header", "schema": {"type": "string"}}
                    ],
                    "requestBody": {
                        "required": true,
                        "content": {"application/json": {"schema": {
                            "type": "object",
                            "required": ["name", "price"],
                            "properties": {
                                "name": {"type": "string"},
                                "price": {"type": "number"},
                                "tags": {"type": "array", "items": {"type": "string"}}
                            }
                        }}}
                    }
                }
            },
            "/products/{product_id}": {
                "parameters": [
                    {"name": "product_id", "in": "path", "required": true, "schema": {"type": "integer"}}
                ],
                "get": {"operationId": "getProduct"},
                "delete": {"operationId": "deleteProduct"}
            },
            "/login": {
                "post": {
                    "operationId": "login",
                    "requestBody": {
                        "content": {"application/x-www-form-urlencoded": {"schema": {
                            "type": "object",
                            "properties": {
                                "username": {"type": "string"},
                                "password": {"type": "string"}
                            }
                        }}}
                    }
                }
            },
            "/stats": {
                "get": {
                    "operationId": "getStats",
                    "parameters": [
                        {"name": "window", "in": "query", "schema": {"type": "string", "default": "24h"}},
                        {"name": "region", "in": "query", "schema": {"type": "string"}}
                    ]
                }
            },
            "/slow/report": {
                "post": {"operationId": "slowReport"}
            },
            "/status/404/missing": {
                "post": {"operationId": "alwaysMissing"}
            },
            "/admin/users": {
                "get": {"operationId": "listAdminUsers", "tags": ["admin", "internal"]}
            }
        }
    }))
}
