//! Outbound request translation.
//!
//! # Responsibilities
//! - Hold caller arguments with the present / null / absent distinction
//! - Substitute path placeholders, refusing to proceed when required ones
//!   are missing
//! - Build the query string, header map, cookie header and body
//! - Produce a `RequestPlan` that the client turns into one HTTP request
//!
//! # Design Decisions
//! - Pure: no I/O happens here, so every rule is testable without a server
//! - Path is checked first; a missing path parameter means nothing is sent
//! - Query, header and cookie values share one filter: present, non-null
//!   and not the empty string
//! - Values are rendered with `value_to_string`: strings verbatim, scalars
//!   via their JSON text, arrays comma-joined, objects as compact JSON

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

use crate::binding::{bindings_in, ParameterBinding};
use crate::descriptor::{BodyFormat, ParamLocation, ParamStyle, RequestBodySpec, RouteDescriptor};
use crate::error::{BridgeError, BridgeResult, MissingKind};

/// Characters escaped when a value is placed into one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// State of one argument as seen by the translator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgValue<'a> {
    Present(&'a Value),
    Null,
    Absent,
}

impl<'a> ArgValue<'a> {
    /// The value when present and non-null.
    pub fn usable(self) -> Option<&'a Value> {
        match self {
            ArgValue::Present(v) => Some(v),
            _ => None,
        }
    }

    /// The value when it passes the query/header filter.
    pub fn filled(self) -> Option<&'a Value> {
        self.usable().filter(|v| v.as_str() != Some(""))
    }
}

/// Caller arguments keyed by argument name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArguments {
    values: Map<String, Value>,
}

impl CallArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a JSON object; `null` is treated as no arguments.
    pub fn from_json(value: Value) -> BridgeResult<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(BridgeError::InvalidArgument {
                name: "arguments".into(),
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> ArgValue<'_> {
        match self.values.get(name) {
            Some(Value::Null) => ArgValue::Null,
            Some(v) => ArgValue::Present(v),
            None => ArgValue::Absent,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for CallArguments {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Serialized request body.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedBody {
    Json(Value),
    Form(Vec<(String, String)>),
    Raw { content_type: String, bytes: Vec<u8> },
}

/// Everything needed to send one upstream request.
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub method: Method,
    /// Path with placeholders substituted and segments percent-encoded.
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Per-call headers, including the joined `Cookie` header.
    pub headers: HeaderMap,
    pub body: Option<PlannedBody>,
}

impl RequestPlan {
    /// Absolute URL: base path, then the route path, then the query.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let joined = format!("{}{}", base.path().trim_end_matches('/'), self.path);
        url.set_path(&joined);
        url.set_fragment(None);
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url
    }
}

/// Translate one invocation into a request plan.
pub fn translate(
    descriptor: &RouteDescriptor,
    bindings: &[ParameterBinding],
    args: &CallArguments,
) -> BridgeResult<RequestPlan> {
    let path = substitute_path(&descriptor.path, bindings, args)?;
    let query = build_query(bindings, args);
    let headers = build_headers(bindings, args)?;
    let body = match &descriptor.request_body {
        Some(spec) => build_body(spec, args)?,
        None => None,
    };

    Ok(RequestPlan {
        method: descriptor.method.clone(),
        path,
        query,
        headers,
        body,
    })
}

fn substitute_path(
    template: &str,
    bindings: &[ParameterBinding],
    args: &CallArguments,
) -> BridgeResult<String> {
    let missing: Vec<String> = bindings_in(bindings, ParamLocation::Path)
        .filter(|b| b.required && args.get(&b.arg_name).usable().is_none())
        .map(|b| b.wire_name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(BridgeError::MissingRequiredParameter {
            kind: MissingKind::Path,
            names: missing,
        });
    }

    let mut path = template.to_string();
    for binding in bindings_in(bindings, ParamLocation::Path) {
        if let Some(value) = args.get(&binding.arg_name).usable() {
            let rendered = render_path_value(binding, value);
            path = path.replace(&format!("{{{}}}", binding.wire_name), &rendered);
        }
    }
    Ok(path)
}

/// Encode one path value in its declared style: `simple` gives `v`,
/// `label` gives `.v` and `matrix` gives `;name=v`.
fn render_path_value(binding: &ParameterBinding, value: &Value) -> String {
    let encode = |v: &Value| utf8_percent_encode(&value_to_string(v), PATH_SEGMENT).to_string();
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).map(encode).collect(),
        other => vec![encode(other)],
    };

    match binding.style {
        ParamStyle::Label if binding.explode => items.iter().map(|v| format!(".{v}")).collect(),
        ParamStyle::Label => format!(".{}", items.join(",")),
        ParamStyle::Matrix if binding.explode => items
            .iter()
            .map(|v| format!(";{}={v}", binding.wire_name))
            .collect(),
        ParamStyle::Matrix => format!(";{}={}", binding.wire_name, items.join(",")),
        _ => items.join(","),
    }
}

fn build_query(bindings: &[ParameterBinding], args: &CallArguments) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for binding in bindings_in(bindings, ParamLocation::Query) {
        let Some(value) = args.get(&binding.arg_name).filled() else {
            continue;
        };
        let name = &binding.wire_name;
        match value {
            Value::Array(items) => {
                let items: Vec<String> = items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(value_to_string)
                    .collect();
                if items.is_empty() {
                    continue;
                }
                if binding.explode {
                    pairs.extend(items.into_iter().map(|v| (name.clone(), v)));
                } else {
                    let delimiter = match binding.style {
                        ParamStyle::SpaceDelimited => " ",
                        ParamStyle::PipeDelimited => "|",
                        _ => ",",
                    };
                    pairs.push((name.clone(), items.join(delimiter)));
                }
            }
            Value::Object(entries) if binding.style == ParamStyle::DeepObject => {
                for (key, v) in entries.iter().filter(|(_, v)| !v.is_null()) {
                    pairs.push((format!("{name}[{key}]"), value_to_string(v)));
                }
            }
            other => pairs.push((name.clone(), value_to_string(other))),
        }
    }
    pairs
}

fn build_headers(bindings: &[ParameterBinding], args: &CallArguments) -> BridgeResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for binding in bindings_in(bindings, ParamLocation::Header) {
        let Some(value) = args.get(&binding.arg_name).filled() else {
            continue;
        };
        let name = HeaderName::from_bytes(binding.wire_name.as_bytes()).map_err(|e| {
            BridgeError::InvalidArgument {
                name: binding.arg_name.clone(),
                reason: format!("invalid header name: {e}"),
            }
        })?;
        headers.insert(name, header_value(&binding.arg_name, &value_to_string(value))?);
    }

    let cookies: Vec<String> = bindings_in(bindings, ParamLocation::Cookie)
        .filter_map(|b| {
            args.get(&b.arg_name)
                .filled()
                .map(|v| format!("{}={}", b.wire_name, value_to_string(v)))
        })
        .collect();
    if !cookies.is_empty() {
        headers.insert(COOKIE, header_value("cookie", &cookies.join("; "))?);
    }
    Ok(headers)
}

fn header_value(arg: &str, raw: &str) -> BridgeResult<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|e| BridgeError::InvalidArgument {
        name: arg.to_string(),
        reason: format!("invalid header value: {e}"),
    })
}

fn build_body(spec: &RequestBodySpec, args: &CallArguments) -> BridgeResult<Option<PlannedBody>> {
    // Entries stay in field declaration order for form encoding.
    let entries: Vec<(String, Value)> = if spec.whole {
        match args.get(RequestBodySpec::WHOLE_FIELD).usable() {
            Some(v) => return Ok(Some(encode_whole(&spec.content_type, v.clone())?)),
            None if spec.required => {
                return Err(BridgeError::MissingRequiredParameter {
                    kind: MissingKind::Body,
                    names: vec![RequestBodySpec::WHOLE_FIELD.to_string()],
                })
            }
            None => return Ok(None),
        }
    } else {
        let mut entries = Vec::new();
        let mut missing = Vec::new();
        for field in &spec.fields {
            match args.get(&field.name).usable() {
                Some(v) => entries.push((field.name.clone(), v.clone())),
                None if field.required => missing.push(field.name.clone()),
                None => {}
            }
        }
        // An optional body with no supplied field is omitted.
        if entries.is_empty() && !spec.required {
            return Ok(None);
        }
        if !missing.is_empty() {
            return Err(BridgeError::MissingRequiredParameter {
                kind: MissingKind::Body,
                names: missing,
            });
        }
        entries
    };

    if entries.is_empty() && !spec.required {
        return Ok(None);
    }

    let body = match &spec.content_type {
        BodyFormat::Form => PlannedBody::Form(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_to_string(v)))
                .collect(),
        ),
        format => encode_whole(format, Value::Object(entries.into_iter().collect()))?,
    };
    Ok(Some(body))
}

fn encode_whole(format: &BodyFormat, payload: Value) -> BridgeResult<PlannedBody> {
    Ok(match format {
        BodyFormat::Json => PlannedBody::Json(payload),
        BodyFormat::Form => match payload {
            Value::Object(entries) => PlannedBody::Form(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), value_to_string(v)))
                    .collect(),
            ),
            other => {
                return Err(BridgeError::InvalidArgument {
                    name: RequestBodySpec::WHOLE_FIELD.into(),
                    reason: format!("form body must be an object, got {}", json_kind(&other)),
                })
            }
        },
        BodyFormat::Other(content_type) => {
            let bytes = match payload {
                Value::String(s) => s.into_bytes(),
                other => other.to_string().into_bytes(),
            };
            PlannedBody::Raw {
                content_type: content_type.clone(),
                bytes,
            }
        }
    })
}

/// String form of an argument value.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
