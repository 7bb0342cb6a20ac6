//! Component construction.
//!
//! # Responsibilities
//! - Turn a classified descriptor into a `ComponentDefinition`
//! - Build the JSON Schema describing an action's arguments
//! - Assign resource URIs and resource template URIs
//! - Extract template arguments from a concrete URI
//!
//! # Design Decisions
//! - Excluded routes produce nothing
//! - Resources take no caller arguments; declared parameters are filled
//!   from schema defaults only
//! - Template placeholders follow path order and map 1:1 to path bindings

use percent_encoding::percent_decode_str;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::binding::{bind, ParameterBinding};
use crate::descriptor::{ParamLocation, RequestBodySpec, RouteDescriptor};
use crate::error::{BridgeError, BridgeResult};
use crate::http::{map_response, translate, CallArguments, InvocationResult, UpstreamClient};
use crate::routing::{ClassificationResult, ComponentType};

/// URI scheme shared by resources and resource templates.
pub const RESOURCE_SCHEME: &str = "resource://";

/// Sends translated requests for every component of one set.
#[derive(Debug, Clone)]
pub struct Invoker {
    client: UpstreamClient,
    timeout: Option<Duration>,
}

impl Invoker {
    pub fn new(client: UpstreamClient, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Translate, send and decode one call.
    pub async fn invoke(
        &self,
        descriptor: &RouteDescriptor,
        bindings: &[ParameterBinding],
        args: &CallArguments,
    ) -> BridgeResult<InvocationResult> {
        let plan = translate(descriptor, bindings, args)?;
        let response = self.client.execute(&plan, self.timeout).await?;
        Ok(map_response(response))
    }
}

/// A component exposed to callers.
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    pub name: String,
    pub kind: ComponentType,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub descriptor: Arc<RouteDescriptor>,
    pub bindings: Vec<ParameterBinding>,
    /// JSON Schema of the accepted arguments (empty for resources).
    pub input_schema: Value,
    /// Resource URI or template URI.
    pub uri: Option<String>,
    invoker: Arc<Invoker>,
}

impl ComponentDefinition {
    /// Client this component sends its requests through.
    pub fn upstream(&self) -> &UpstreamClient {
        self.invoker.client()
    }

    /// Path bindings in placeholder order.
    pub fn template_params(&self) -> Vec<&ParameterBinding> {
        template_params(&self.descriptor, &self.bindings)
    }

    /// Arguments made of declared schema defaults.
    pub fn default_arguments(&self) -> CallArguments {
        let mut args = CallArguments::new();
        for binding in &self.bindings {
            if let Some(default) = &binding.default {
                args.insert(binding.arg_name.clone(), default.clone());
            }
        }
        args
    }

    /// Match a concrete URI against this template.
    ///
    /// `None` when the URI does not have this template's shape.
    pub fn match_uri(&self, uri: &str) -> Option<BridgeResult<CallArguments>> {
        if self.kind != ComponentType::ResourceTemplate {
            return None;
        }
        let prefix = resource_uri(&self.name);
        let params = self.template_params();
        let rest = uri.strip_prefix(prefix.as_str())?;

        let segments: Vec<&str> = if params.is_empty() {
            if !rest.is_empty() {
                return None;
            }
            Vec::new()
        } else {
            let segments: Vec<&str> = rest.strip_prefix('/')?.split('/').collect();
            if segments.len() != params.len() || segments.iter().any(|s| s.is_empty()) {
                return None;
            }
            segments
        };

        let mut args = self.default_arguments();
        for (binding, raw) in params.iter().zip(segments) {
            match percent_decode_str(raw).decode_utf8() {
                Ok(value) => args.insert(binding.arg_name.clone(), Value::String(value.into_owned())),
                Err(e) => {
                    return Some(Err(BridgeError::InvalidArgument {
                        name: binding.arg_name.clone(),
                        reason: format!("URI segment is not valid UTF-8: {e}"),
                    }))
                }
            }
        }
        Some(Ok(args))
    }

    /// Invoke with explicit arguments.
    pub async fn invoke(&self, args: &CallArguments) -> BridgeResult<InvocationResult> {
        self.invoker.invoke(&self.descriptor, &self.bindings, args).await
    }
}

/// `resource://<name>`
pub fn resource_uri(name: &str) -> String {
    format!("{RESOURCE_SCHEME}{name}")
}

/// `resource://<name>/{p1}/{p2}`
pub fn template_uri(name: &str, params: &[&str]) -> String {
    let mut uri = resource_uri(name);
    for param in params {
        uri.push_str(&format!("/{{{param}}}"));
    }
    uri
}

fn template_params<'a>(
    descriptor: &RouteDescriptor,
    bindings: &'a [ParameterBinding],
) -> Vec<&'a ParameterBinding> {
    descriptor
        .placeholders()
        .into_iter()
        .filter_map(|placeholder| {
            bindings
                .iter()
                .find(|b| b.location == ParamLocation::Path && b.wire_name == placeholder)
        })
        .collect()
}

/// JSON Schema object for the arguments of an action or prompt.
pub fn input_schema(bindings: &[ParameterBinding], body: Option<&RequestBodySpec>) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for binding in bindings {
        let mut schema = binding.schema.clone();
        if let (Some(text), Value::Object(map)) = (&binding.description, &mut schema) {
            map.entry("description").or_insert_with(|| Value::String(text.clone()));
        }
        properties.insert(binding.arg_name.clone(), schema);
        if binding.required {
            required.push(Value::String(binding.arg_name.clone()));
        }
    }

    if let Some(body) = body {
        for field in &body.fields {
            let mut schema = field.schema.clone();
            if let (true, Some(text), Value::Object(map)) = (body.whole, &body.description, &mut schema) {
                map.entry("description").or_insert_with(|| Value::String(text.clone()));
            }
            properties.insert(field.name.clone(), schema);
            if body.required && field.required {
                required.push(Value::String(field.name.clone()));
            }
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Description shown to callers.
pub fn describe(route: &RouteDescriptor) -> String {
    route
        .summary
        .clone()
        .or_else(|| route.description.clone())
        .unwrap_or_else(|| route.to_string())
}

/// Build the component for a classified route; `None` for excluded routes.
pub fn build_component(
    classified: ClassificationResult,
    name: String,
    invoker: Arc<Invoker>,
) -> Option<ComponentDefinition> {
    let ClassificationResult {
        descriptor,
        component_type,
    } = classified;

    let bindings = bind(&descriptor);
    let (input_schema, uri) = match component_type {
        ComponentType::Exclude => return None,
        ComponentType::Action | ComponentType::Prompt => {
            (input_schema(&bindings, descriptor.request_body.as_ref()), None)
        }
        ComponentType::Resource => (json!({}), Some(resource_uri(&name))),
        ComponentType::ResourceTemplate => {
            let params: Vec<&str> = template_params(&descriptor, &bindings)
                .iter()
                .map(|b| b.wire_name.as_str())
                .collect();
            let uri = template_uri(&name, &params);
            (json!({}), Some(uri))
        }
    };

    tracing::debug!(
        component = %name,
        kind = %component_type,
        route = %descriptor,
        "Component built"
    );

    Some(ComponentDefinition {
        description: describe(&descriptor),
        tags: descriptor.tags.clone(),
        name,
        kind: component_type,
        descriptor,
        bindings,
        input_schema,
        uri,
        invoker,
    })
}
