//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::error::BridgeResult;
use crate::resilience::timeouts::timeout_from_secs;
use crate::routing::{ComponentType, MethodSet, RouteMap};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Upstream API location and default headers.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Custom classification rules, evaluated before the defaults.
    pub route_maps: Vec<RouteMapConfig>,

    /// Component name overrides keyed by operationId.
    pub names: BTreeMap<String, String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl BridgeConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeouts.request_secs.and_then(timeout_from_secs)
    }

    /// Compile `route_maps` in declaration order.
    pub fn compile_route_maps(&self) -> BridgeResult<Vec<RouteMap>> {
        self.route_maps.iter().map(RouteMapConfig::compile).collect()
    }

    pub fn name_overrides(&self) -> HashMap<String, String> {
        self.names.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL every route path is appended to (e.g., "https://api.example.com/v1").
    /// Unset means the first absolute `servers` URL of the document.
    pub base_url: Option<String>,

    /// Headers sent with every request unless the call sets them.
    pub default_headers: BTreeMap<String, String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for one upstream exchange in seconds. Unset means none.
    pub request_secs: Option<f64>,
}

/// One classification rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteMapConfig {
    /// HTTP methods, or `"*"` for all.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,

    /// Regular expression searched in the path template.
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Tags the route must all carry.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Tags the route must not carry.
    #[serde(default)]
    pub exclude_tags: Vec<String>,

    /// Outcome when the rule matches.
    pub component_type: ComponentType,
}

fn default_methods() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_pattern() -> String {
    ".*".to_string()
}

impl RouteMapConfig {
    pub fn compile(&self) -> BridgeResult<RouteMap> {
        let methods = MethodSet::parse(&self.methods)?;
        Ok(RouteMap::new(methods, &self.pattern, self.component_type)?
            .with_tags(self.tags.iter().cloned())
            .with_exclude_tags(self.exclude_tags.iter().cloned()))
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Register metric descriptions at startup.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
