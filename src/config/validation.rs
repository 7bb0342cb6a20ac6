//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the upstream URL and default headers
//! - Validate value ranges (timeouts > 0 and finite)
//! - Compile every route map once to surface bad patterns and methods
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use reqwest::header::{HeaderName, HeaderValue};
use std::fmt;
use url::Url;

use crate::components::naming::slugify;
use crate::config::schema::BridgeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check `config`, collecting every problem.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(base_url) = &config.upstream.base_url {
        match Url::parse(base_url) {
            Ok(url) if !matches!(url.scheme(), "http" | "https") => errors.push(ValidationError::new(
                "upstream.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
        }
    }

    for (name, value) in &config.upstream.default_headers {
        let field = format!("upstream.default_headers.{name}");
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(&field, "invalid header name"));
        }
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(&field, "invalid header value"));
        }
    }

    if let Some(secs) = config.timeouts.request_secs {
        if !secs.is_finite() || secs <= 0.0 {
            errors.push(ValidationError::new(
                "timeouts.request_secs",
                format!("must be a positive number of seconds, got {secs}"),
            ));
        }
    }

    for (idx, rule) in config.route_maps.iter().enumerate() {
        if let Err(e) = rule.compile() {
            errors.push(ValidationError::new(format!("route_maps[{idx}]"), e.to_string()));
        }
    }

    for (operation_id, name) in &config.names {
        if slugify(name).is_empty() {
            errors.push(ValidationError::new(
                format!("names.{operation_id}"),
                "name has no alphanumeric characters",
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
