//! Startup orchestration.
//!
//! # Responsibilities
//! - Collect rules, names, timeout and client (from code or configuration)
//! - Normalize the OpenAPI document into descriptors
//! - Classify, name and build every component in document order
//! - Freeze the result into a `ComponentSet`
//!
//! # Design Decisions
//! - Fail fast: any construction error is fatal, nothing is half-registered
//! - One synchronous pass; no I/O happens during construction
//! - Without an explicit client or configured base URL, the first absolute
//!   `servers` URL is used, still carrying the configured default headers

use openapiv3::OpenAPI;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::components::factory::{build_component, Invoker};
use crate::components::naming::{base_name, NameAllocator};
use crate::components::registry::ComponentSet;
use crate::config::BridgeConfig;
use crate::descriptor::{build_descriptors, RouteDescriptor};
use crate::error::{BridgeError, BridgeResult};
use crate::http::UpstreamClient;
use crate::observability::metrics;
use crate::routing::{ClassifyOverride, ComponentType, RouteClassifier, RouteMap};

/// Builder for a `ComponentSet`.
#[derive(Default)]
pub struct BridgeBuilder {
    route_maps: Vec<RouteMap>,
    timeout: Option<Duration>,
    client: Option<UpstreamClient>,
    names: HashMap<String, String>,
    classify_override: Option<ClassifyOverride>,
    /// Default headers for a client derived from the document's `servers`.
    server_headers: BTreeMap<String, String>,
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from a validated configuration.
    pub fn from_config(config: &BridgeConfig) -> BridgeResult<Self> {
        let mut builder = Self::new()
            .route_maps(config.compile_route_maps()?)
            .names(config.name_overrides());
        builder.client = UpstreamClient::from_config(&config.upstream)?;
        builder.server_headers = config.upstream.default_headers.clone();
        builder.timeout = config.request_timeout();
        Ok(builder)
    }

    /// Custom rules, evaluated before the defaults.
    pub fn route_maps(mut self, route_maps: Vec<RouteMap>) -> Self {
        self.route_maps = route_maps;
        self
    }

    /// Deadline for each upstream exchange.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn client(mut self, client: UpstreamClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Component names keyed by operationId.
    pub fn names(mut self, names: HashMap<String, String>) -> Self {
        self.names = names;
        self
    }

    /// Hook that may replace the rule verdict for a route.
    pub fn classify_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&RouteDescriptor, ComponentType) -> Option<ComponentType> + Send + Sync + 'static,
    {
        self.classify_override = Some(Arc::new(f));
        self
    }

    /// Run the construction pass over `spec`.
    pub fn build(self, spec: &OpenAPI) -> BridgeResult<ComponentSet> {
        let descriptors = build_descriptors(spec)?;

        let mut classifier = RouteClassifier::new(self.route_maps);
        if let Some(f) = self.classify_override {
            classifier = classifier.with_override(f);
        }

        let client = match self.client {
            Some(client) => client,
            None => client_from_servers(spec)?.with_header_map(&self.server_headers)?,
        };
        let invoker = Arc::new(Invoker::new(client, self.timeout));

        let mut allocator = NameAllocator::new();
        let mut components = Vec::new();
        let mut excluded = 0usize;

        for descriptor in descriptors {
            let classified = classifier.classify_shared(Arc::new(descriptor));
            if classified.component_type == ComponentType::Exclude {
                tracing::debug!(route = %classified.descriptor, "Route excluded");
                excluded += 1;
                continue;
            }
            let name = allocator.allocate(&base_name(&classified.descriptor, &self.names));
            if let Some(component) = build_component(classified, name, invoker.clone()) {
                components.push(component);
            }
        }

        let set = ComponentSet::new(components);
        for (kind, count) in set.counts() {
            metrics::record_components(kind, count);
        }

        tracing::info!(
            components = set.len(),
            excluded,
            custom_rules = classifier.custom_len(),
            base_url = %invoker.client().base_url(),
            "Component set built"
        );
        Ok(set)
    }
}

fn client_from_servers(spec: &OpenAPI) -> BridgeResult<UpstreamClient> {
    spec.servers
        .iter()
        .find_map(|server| UpstreamClient::new(&server.url).ok())
        .ok_or_else(|| {
            BridgeError::InvalidConfig(
                "no upstream client configured and no absolute server URL in the document".into(),
            )
        })
}
