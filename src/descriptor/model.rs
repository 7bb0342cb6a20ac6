//! Normalized route descriptors.
//!
//! These structs are produced once by the builder and then only read:
//! classification, binding and translation never look at the raw
//! OpenAPI shapes again.

use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Location of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    /// Lowercase name as used in OpenAPI `in` fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse type of a parameter, taken from its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Unknown,
}

/// Serialization style of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamStyle {
    /// `form` (query and cookie default).
    #[default]
    Form,
    /// `simple` (path and header default).
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
    Matrix,
    Label,
}

/// A single declared parameter of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub scalar_type: ScalarType,
    pub style: ParamStyle,
    pub explode: bool,
    pub description: Option<String>,
    /// JSON form of the parameter schema.
    pub schema: Value,
    /// Schema `default`, used when a resource is read without arguments.
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A parameter with the OpenAPI defaults for its location.
    pub fn new(name: impl Into<String>, location: ParamLocation, scalar_type: ScalarType) -> Self {
        let style = match location {
            ParamLocation::Path | ParamLocation::Header => ParamStyle::Simple,
            ParamLocation::Query | ParamLocation::Cookie => ParamStyle::Form,
        };
        Self {
            name: name.into(),
            location,
            required: location == ParamLocation::Path,
            scalar_type,
            style,
            explode: style == ParamStyle::Form,
            description: None,
            schema: Value::Object(Default::default()),
            default: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Media type family of a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyFormat {
    /// `application/json` and `+json` suffixes.
    Json,
    /// `application/x-www-form-urlencoded`.
    Form,
    /// Anything else, sent with the declared content type.
    Other(String),
}

impl BodyFormat {
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence == "application/json" || essence.ends_with("+json") {
            BodyFormat::Json
        } else if essence == "application/x-www-form-urlencoded" {
            BodyFormat::Form
        } else {
            BodyFormat::Other(essence)
        }
    }
}

/// One top-level property of a request body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyField {
    pub name: String,
    pub required: bool,
    pub schema: Value,
}

/// Declared request body of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodySpec {
    pub content_type: BodyFormat,
    pub required: bool,
    pub fields: Vec<BodyField>,
    /// The body is not an object with properties; `fields` then holds a
    /// single synthetic `body` field carrying the whole payload.
    pub whole: bool,
    pub description: Option<String>,
}

impl RequestBodySpec {
    /// Name of the synthetic field used when `whole` is set.
    pub const WHOLE_FIELD: &'static str = "body";

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// A normalized API operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDescriptor {
    pub method: Method,
    /// Path template with `{name}` placeholders.
    pub path: String,
    pub parameters: Vec<ParamSpec>,
    pub request_body: Option<RequestBodySpec>,
    pub tags: BTreeSet<String>,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
}

impl RouteDescriptor {
    /// Bare descriptor without parameters, tags or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            parameters: Vec::new(),
            request_body: None,
            tags: BTreeSet::new(),
            operation_id: None,
            summary: None,
            description: None,
            deprecated: false,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    /// Placeholder names in the order they appear in the path.
    pub fn placeholders(&self) -> Vec<&str> {
        placeholders(&self.path)
    }

    pub fn has_placeholders(&self) -> bool {
        !self.placeholders().is_empty()
    }

    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &ParamSpec> {
        self.parameters.iter().filter(move |p| p.location == location)
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Extract `{name}` placeholders from a path template.
pub fn placeholders(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty() {
                    out.push(name);
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("/users/{id}"), vec!["id"]);
        assert_eq!(
            placeholders("/orgs/{org}/repos/{repo}.json"),
            vec!["org", "repo"]
        );
        assert!(placeholders("/stats").is_empty());
        assert!(placeholders("/broken/{").is_empty());
    }

    #[test]
    fn test_body_format_from_mime() {
        assert_eq!(BodyFormat::from_mime("application/json"), BodyFormat::Json);
        assert_eq!(
            BodyFormat::from_mime("application/merge-patch+json; charset=utf-8"),
            BodyFormat::Json
        );
        assert_eq!(
            BodyFormat::from_mime("application/x-www-form-urlencoded"),
            BodyFormat::Form
        );
        assert_eq!(
            BodyFormat::from_mime("text/plain"),
            BodyFormat::Other("text/plain".into())
        );
    }

    #[test]
    fn test_param_defaults_by_location() {
        let path = ParamSpec::new("id", ParamLocation::Path, ScalarType::Integer);
        assert!(path.required);
        assert_eq!(path.style, ParamStyle::Simple);
        assert!(!path.explode);

        let query = ParamSpec::new("tag", ParamLocation::Query, ScalarType::Array);
        assert!(!query.required);
        assert!(query.explode);
    }
}
