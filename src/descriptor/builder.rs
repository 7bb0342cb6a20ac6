//! Descriptor construction from a parsed OpenAPI document.
//!
//! # Responsibilities
//! - Walk every operation in document order
//! - Merge path-level and operation-level parameters
//! - Resolve local `#/components/...` references
//! - Aggregate request body fields for body-carrying methods
//! - Reject operations whose placeholders and path parameters disagree
//!
//! # Design Decisions
//! - Parsing the document itself is left to `openapiv3`
//! - Only one level of component references is followed; anything else is
//!   reported as malformed rather than guessed at
//! - Path parameters are always required

use indexmap::IndexMap;
use openapiv3::{
    Components, MediaType, OpenAPI, Operation, Parameter, ParameterSchemaOrContent, PathStyle,
    QueryStyle, ReferenceOr, RequestBody, Schema, SchemaKind, Type,
};
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::descriptor::model::{
    BodyField, BodyFormat, ParamLocation, ParamSpec, ParamStyle, RequestBodySpec,
    RouteDescriptor, ScalarType,
};
use crate::error::{BridgeError, BridgeResult};

/// Header parameters OpenAPI says to ignore; the client owns these.
const RESERVED_HEADERS: [&str; 3] = ["accept", "content-type", "authorization"];

/// Build one descriptor per operation, in document order.
pub fn build_descriptors(spec: &OpenAPI) -> BridgeResult<Vec<RouteDescriptor>> {
    let resolver = Resolver {
        components: spec.components.as_ref(),
    };
    let mut descriptors = Vec::new();

    for (path, item) in spec.paths.iter() {
        let item = match item {
            ReferenceOr::Item(item) => item,
            ReferenceOr::Reference { reference } => {
                tracing::warn!(path = %path, reference = %reference, "Skipping referenced path item");
                continue;
            }
        };

        let mut common = Vec::new();
        for param in &item.parameters {
            let param = resolver
                .parameter(param)
                .map_err(|reason| malformed("*", path, reason))?;
            if let Some(spec) = resolver.param_spec(param).map_err(|r| malformed("*", path, r))? {
                common.push(spec);
            }
        }

        for (method, op) in item.iter() {
            descriptors.push(build_descriptor(&resolver, path, method, op, &common)?);
        }
    }

    tracing::info!(operations = descriptors.len(), "Route descriptors built");
    Ok(descriptors)
}

fn build_descriptor<'a>(
    resolver: &Resolver<'a>,
    path: &str,
    method: &str,
    op: &'a Operation,
    common: &[ParamSpec],
) -> BridgeResult<RouteDescriptor> {
    let method_upper = method.to_ascii_uppercase();
    let fail = |reason: String| malformed(&method_upper, path, reason);

    let method = Method::from_bytes(method_upper.as_bytes()).map_err(|e| fail(e.to_string()))?;

    // Operation parameters override path-level ones with the same name and location.
    let mut parameters: Vec<ParamSpec> = Vec::new();
    for param in &op.parameters {
        let param = resolver.parameter(param).map_err(fail)?;
        if let Some(spec) = resolver.param_spec(param).map_err(fail)? {
            parameters.push(spec);
        }
    }
    for spec in common {
        let overridden = parameters
            .iter()
            .any(|p| p.name == spec.name && p.location == spec.location);
        if !overridden {
            parameters.push(spec.clone());
        }
    }

    for spec in parameters.iter_mut() {
        if spec.location == ParamLocation::Path && !spec.required {
            tracing::debug!(path = %path, param = %spec.name, "Treating optional path parameter as required");
            spec.required = true;
        }
    }

    let request_body = match &op.request_body {
        Some(body) if carries_body(&method) => {
            let body = resolver.request_body(body).map_err(fail)?;
            resolver.body_spec(body).map_err(fail)?
        }
        Some(_) => {
            tracing::debug!(method = %method, path = %path, "Ignoring request body on bodiless method");
            None
        }
        None => None,
    };

    let descriptor = RouteDescriptor {
        method,
        path: path.to_string(),
        parameters,
        request_body,
        tags: op.tags.iter().cloned().collect(),
        operation_id: op.operation_id.clone(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        deprecated: op.deprecated,
    };

    check_placeholders(&descriptor).map_err(fail)?;

    tracing::debug!(route = %descriptor, params = descriptor.parameters.len(), "Descriptor built");
    Ok(descriptor)
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Every placeholder needs a path parameter and every path parameter a placeholder.
fn check_placeholders(descriptor: &RouteDescriptor) -> Result<(), String> {
    let placeholders: BTreeSet<&str> = descriptor.placeholders().into_iter().collect();
    let declared: BTreeSet<&str> = descriptor
        .params_in(ParamLocation::Path)
        .map(|p| p.name.as_str())
        .collect();

    if let Some(name) = placeholders.difference(&declared).next() {
        return Err(format!("placeholder '{{{name}}}' has no path parameter"));
    }
    if let Some(name) = declared.difference(&placeholders).next() {
        return Err(format!("path parameter '{name}' has no placeholder"));
    }
    Ok(())
}

fn malformed(method: &str, path: &str, reason: String) -> BridgeError {
    BridgeError::MalformedDescriptor {
        method: method.to_string(),
        path: path.to_string(),
        reason,
    }
}

/// Resolves local component references.
struct Resolver<'a> {
    components: Option<&'a Components>,
}

impl<'a> Resolver<'a> {
    fn parameter(&self, item: &'a ReferenceOr<Parameter>) -> Result<&'a Parameter, String> {
        lookup(item, "parameters", self.components.map(|c| &c.parameters))
    }

    fn request_body(&self, item: &'a ReferenceOr<RequestBody>) -> Result<&'a RequestBody, String> {
        lookup(item, "requestBodies", self.components.map(|c| &c.request_bodies))
    }

    fn schema(&self, item: &'a ReferenceOr<Schema>) -> Result<&'a Schema, String> {
        lookup(item, "schemas", self.components.map(|c| &c.schemas))
    }

    /// JSON form of a property schema, following one reference.
    fn property_json(&self, item: &ReferenceOr<Box<Schema>>) -> Value {
        match item {
            ReferenceOr::Item(schema) => schema_json(schema),
            ReferenceOr::Reference { reference } => reference
                .strip_prefix("#/components/schemas/")
                .and_then(|name| self.components?.schemas.get(name))
                .and_then(ReferenceOr::as_item)
                .map(schema_json)
                .unwrap_or_else(|| json!({ "$ref": reference })),
        }
    }

    /// Convert a parameter; reserved headers yield `None`.
    fn param_spec(&self, param: &'a Parameter) -> Result<Option<ParamSpec>, String> {
        let (location, style) = match param {
            Parameter::Query { style, .. } => (
                ParamLocation::Query,
                match style {
                    QueryStyle::Form => ParamStyle::Form,
                    QueryStyle::SpaceDelimited => ParamStyle::SpaceDelimited,
                    QueryStyle::PipeDelimited => ParamStyle::PipeDelimited,
                    QueryStyle::DeepObject => ParamStyle::DeepObject,
                },
            ),
            Parameter::Header { .. } => (ParamLocation::Header, ParamStyle::Simple),
            Parameter::Path { style, .. } => (
                ParamLocation::Path,
                match style {
                    PathStyle::Simple => ParamStyle::Simple,
                    PathStyle::Matrix => ParamStyle::Matrix,
                    PathStyle::Label => ParamStyle::Label,
                },
            ),
            Parameter::Cookie { .. } => (ParamLocation::Cookie, ParamStyle::Form),
        };

        let data = param.parameter_data_ref();
        if location == ParamLocation::Header
            && RESERVED_HEADERS.contains(&data.name.to_ascii_lowercase().as_str())
        {
            tracing::debug!(header = %data.name, "Ignoring reserved header parameter");
            return Ok(None);
        }

        let (mut schema, scalar_type, default) = match &data.format {
            ParameterSchemaOrContent::Schema(item) => {
                let schema = self.schema(item)?;
                (
                    schema_json(schema),
                    scalar_type(schema),
                    schema.schema_data.default.clone(),
                )
            }
            ParameterSchemaOrContent::Content(_) => (json!({}), ScalarType::Unknown, None),
        };

        if let (Some(description), Value::Object(map)) = (&data.description, &mut schema) {
            map.entry("description")
                .or_insert_with(|| Value::String(description.clone()));
        }

        Ok(Some(ParamSpec {
            name: data.name.clone(),
            location,
            required: data.required,
            scalar_type,
            style,
            explode: data.explode.unwrap_or(style == ParamStyle::Form),
            description: data.description.clone(),
            schema,
            default,
        }))
    }

    fn body_spec(&self, body: &'a RequestBody) -> Result<Option<RequestBodySpec>, String> {
        let Some((mime, media)) = pick_media_type(&body.content) else {
            return Ok(None);
        };

        let schema = match &media.schema {
            Some(item) => Some(self.schema(item)?),
            None => None,
        };

        let properties = schema.and_then(|s| match &s.schema_kind {
            SchemaKind::Type(Type::Object(obj)) if !obj.properties.is_empty() => Some(obj),
            _ => None,
        });

        let (fields, whole) = match properties {
            Some(obj) => {
                let fields = obj
                    .properties
                    .iter()
                    .map(|(name, prop)| BodyField {
                        name: name.clone(),
                        required: obj.required.contains(name),
                        schema: self.property_json(prop),
                    })
                    .collect();
                (fields, false)
            }
            None => {
                let field = BodyField {
                    name: RequestBodySpec::WHOLE_FIELD.to_string(),
                    required: body.required,
                    schema: schema.map(schema_json).unwrap_or_else(|| json!({})),
                };
                (vec![field], true)
            }
        };

        Ok(Some(RequestBodySpec {
            content_type: BodyFormat::from_mime(mime),
            required: body.required,
            fields,
            whole,
            description: body.description.clone(),
        }))
    }
}

fn lookup<'a, T>(
    item: &'a ReferenceOr<T>,
    kind: &str,
    pool: Option<&'a IndexMap<String, ReferenceOr<T>>>,
) -> Result<&'a T, String> {
    match item {
        ReferenceOr::Item(value) => Ok(value),
        ReferenceOr::Reference { reference } => {
            let prefix = format!("#/components/{kind}/");
            let name = reference
                .strip_prefix(&prefix)
                .ok_or_else(|| format!("unsupported reference '{reference}'"))?;
            pool.and_then(|p| p.get(name))
                .and_then(ReferenceOr::as_item)
                .ok_or_else(|| format!("unresolved reference '{reference}'"))
        }
    }
}

/// JSON bodies first, then forms, then whatever is declared first.
fn pick_media_type(content: &IndexMap<String, MediaType>) -> Option<(&str, &MediaType)> {
    let by_format = |wanted: BodyFormat| {
        content
            .iter()
            .find(|(mime, _)| BodyFormat::from_mime(mime) == wanted)
    };
    by_format(BodyFormat::Json)
        .or_else(|| by_format(BodyFormat::Form))
        .or_else(|| content.iter().next())
        .map(|(mime, media)| (mime.as_str(), media))
}

fn scalar_type(schema: &Schema) -> ScalarType {
    match &schema.schema_kind {
        SchemaKind::Type(Type::String(_)) => ScalarType::String,
        SchemaKind::Type(Type::Integer(_)) => ScalarType::Integer,
        SchemaKind::Type(Type::Number(_)) => ScalarType::Number,
        SchemaKind::Type(Type::Boolean(_)) => ScalarType::Boolean,
        SchemaKind::Type(Type::Array(_)) => ScalarType::Array,
        SchemaKind::Type(Type::Object(_)) => ScalarType::Object,
        _ => ScalarType::Unknown,
    }
}

fn schema_json(schema: &Schema) -> Value {
    serde_json::to_value(schema).unwrap_or_else(|_| json!({}))
}
