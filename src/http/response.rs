//! Upstream response mapping.
//!
//! # Responsibilities
//! - Carry the raw status, content type and body of an upstream reply
//! - Map the body into JSON, text or bytes for the caller
//!
//! # Design Decisions
//! - Every HTTP status is a completed invocation; callers inspect `status`
//! - JSON is only attempted when the content type says so
//! - Invalid UTF-8 falls back to raw bytes instead of failing

use reqwest::StatusCode;
use serde_json::{json, Value};

/// Buffered reply from the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationPayload {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

/// Result handed back to the caller of a component.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub status: u16,
    pub content_type: Option<String>,
    pub payload: InvocationPayload,
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.payload {
            InvocationPayload::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            InvocationPayload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON rendering for display; binary bodies are summarized by length.
    pub fn to_json(&self) -> Value {
        let body = match &self.payload {
            InvocationPayload::Json(v) => v.clone(),
            InvocationPayload::Text(s) => Value::String(s.clone()),
            InvocationPayload::Binary(bytes) => json!({ "binary_length": bytes.len() }),
        };
        json!({
            "status": self.status,
            "content_type": self.content_type,
            "body": body,
        })
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json") || essence.to_ascii_lowercase().ends_with("+json")
}

/// Decode an upstream reply.
pub fn map_response(response: UpstreamResponse) -> InvocationResult {
    let UpstreamResponse {
        status,
        content_type,
        body,
    } = response;

    let json_declared = content_type.as_deref().is_some_and(is_json);
    let parsed = if json_declared {
        serde_json::from_slice::<Value>(&body).ok()
    } else {
        None
    };

    let payload = match parsed {
        Some(v) => InvocationPayload::Json(v),
        None => match String::from_utf8(body) {
            Ok(text) => InvocationPayload::Text(text),
            Err(e) => InvocationPayload::Binary(e.into_bytes()),
        },
    };

    InvocationResult {
        status: status.as_u16(),
        content_type,
        payload,
    }
}
