//! Error types shared by the construction pass and by invocations.
//!
//! # Design Decisions
//! - Construction errors (`MalformedDescriptor`, `InvalidRouteMap`,
//!   `InvalidConfig`) abort the build; nothing is partially registered
//! - Invocation errors are scoped to a single call and never poison the
//!   component set
//! - Upstream failures keep the underlying cause for `source()` chains

use std::time::Duration;
use thiserror::Error;

/// Where a required parameter was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKind {
    Path,
    Body,
}

impl std::fmt::Display for MissingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingKind::Path => write!(f, "path"),
            MissingKind::Body => write!(f, "body"),
        }
    }
}

/// Underlying reason an upstream request failed.
#[derive(Debug, Error)]
pub enum UpstreamCause {
    /// Connection, protocol or body read failure reported by the client.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The configured per-request deadline expired.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors produced while building or invoking components.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An operation could not be normalized into a route descriptor.
    #[error("Malformed operation {method} {path}: {reason}")]
    MalformedDescriptor {
        method: String,
        path: String,
        reason: String,
    },

    /// A route map could not be compiled.
    #[error("Invalid route map '{pattern}': {reason}")]
    InvalidRouteMap { pattern: String, reason: String },

    /// Required parameters were absent or null at call time.
    #[error("Missing required {kind} parameters: {{{}}}", .names.join(", "))]
    MissingRequiredParameter { kind: MissingKind, names: Vec<String> },

    /// A caller-supplied argument cannot be placed into the request.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    /// The HTTP client failed to complete the request.
    #[error("Upstream request to {url} failed: {source}")]
    UpstreamRequest {
        url: String,
        #[source]
        source: UpstreamCause,
    },

    /// No component with the given name or URI exists.
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// The caller cancelled the invocation before a result was delivered.
    #[error("Invocation cancelled")]
    Cancelled,

    /// Upstream settings are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BridgeError {
    /// Names reported by a `MissingRequiredParameter` error, if any.
    pub fn missing_names(&self) -> Option<&[String]> {
        match self {
            BridgeError::MissingRequiredParameter { names, .. } => Some(names),
            _ => None,
        }
    }

    /// True for errors raised while building the component set.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            BridgeError::MalformedDescriptor { .. }
                | BridgeError::InvalidRouteMap { .. }
                | BridgeError::InvalidConfig(_)
        )
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
