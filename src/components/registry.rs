//! Component registry.
//!
//! # Responsibilities
//! - Hold every component built in one construction pass
//! - Look components up by name and by URI
//! - Run invocations inside a span with a fresh invocation id
//! - Race invocations against a cancellation signal
//!
//! # Design Decisions
//! - Immutable after construction; shared via `Arc` without locks
//! - Kind-specific entry points reject components of another kind
//! - Metrics are recorded for every finished invocation, including failures

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::components::factory::ComponentDefinition;
use crate::error::{BridgeError, BridgeResult};
use crate::http::{CallArguments, InvocationResult};
use crate::lifecycle::cancel::CancelSignal;
use crate::observability::metrics;
use crate::routing::ComponentType;

/// Immutable set of components keyed by name.
#[derive(Debug, Default)]
pub struct ComponentSet {
    components: Vec<Arc<ComponentDefinition>>,
    by_name: HashMap<String, usize>,
    by_uri: HashMap<String, usize>,
}

impl ComponentSet {
    /// Index `components`; names must already be unique.
    pub fn new(components: Vec<ComponentDefinition>) -> Self {
        let components: Vec<Arc<ComponentDefinition>> = components.into_iter().map(Arc::new).collect();
        let mut by_name = HashMap::new();
        let mut by_uri = HashMap::new();
        for (idx, component) in components.iter().enumerate() {
            by_name.insert(component.name.clone(), idx);
            if component.kind == ComponentType::Resource {
                if let Some(uri) = &component.uri {
                    by_uri.insert(uri.clone(), idx);
                }
            }
        }
        Self {
            components,
            by_name,
            by_uri,
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ComponentDefinition>> {
        self.by_name.get(name).map(|&idx| &self.components[idx])
    }

    /// Components in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ComponentDefinition>> {
        self.components.iter()
    }

    pub fn of_kind(&self, kind: ComponentType) -> impl Iterator<Item = &Arc<ComponentDefinition>> {
        self.components.iter().filter(move |c| c.kind == kind)
    }

    pub fn names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of components of each kind.
    pub fn counts(&self) -> HashMap<ComponentType, usize> {
        let mut counts = HashMap::new();
        for component in &self.components {
            *counts.entry(component.kind).or_insert(0) += 1;
        }
        counts
    }

    fn lookup(&self, name: &str, kind: ComponentType) -> BridgeResult<&Arc<ComponentDefinition>> {
        self.get(name)
            .filter(|c| c.kind == kind)
            .ok_or_else(|| BridgeError::ComponentNotFound(format!("{kind} '{name}'")))
    }

    /// Resolve a concrete URI to a component and its arguments.
    ///
    /// Static resources are tried first, then every template in order.
    pub fn resolve_uri(&self, uri: &str) -> BridgeResult<(&Arc<ComponentDefinition>, CallArguments)> {
        if let Some(&idx) = self.by_uri.get(uri) {
            let component = &self.components[idx];
            return Ok((component, component.default_arguments()));
        }
        for component in self.of_kind(ComponentType::ResourceTemplate) {
            if let Some(args) = component.match_uri(uri) {
                return Ok((component, args?));
            }
        }
        Err(BridgeError::ComponentNotFound(format!("resource '{uri}'")))
    }

    /// Call an action with JSON arguments.
    pub async fn call_action(&self, name: &str, args: Value) -> BridgeResult<InvocationResult> {
        let component = self.lookup(name, ComponentType::Action)?;
        let args = CallArguments::from_json(args)?;
        run(component, args).await
    }

    /// Render a prompt with JSON arguments.
    pub async fn get_prompt(&self, name: &str, args: Value) -> BridgeResult<InvocationResult> {
        let component = self.lookup(name, ComponentType::Prompt)?;
        let args = CallArguments::from_json(args)?;
        run(component, args).await
    }

    /// Read a static resource by URI.
    pub async fn read_resource(&self, uri: &str) -> BridgeResult<InvocationResult> {
        let idx = self
            .by_uri
            .get(uri)
            .ok_or_else(|| BridgeError::ComponentNotFound(format!("resource '{uri}'")))?;
        let component = &self.components[*idx];
        run(component, component.default_arguments()).await
    }

    /// Read a concrete URI through the first matching template.
    pub async fn read_template(&self, uri: &str) -> BridgeResult<InvocationResult> {
        for component in self.of_kind(ComponentType::ResourceTemplate) {
            if let Some(args) = component.match_uri(uri) {
                return run(component, args?).await;
            }
        }
        Err(BridgeError::ComponentNotFound(format!("resource template for '{uri}'")))
    }

    /// Read any resource or template URI.
    pub async fn read(&self, uri: &str) -> BridgeResult<InvocationResult> {
        let (component, args) = self.resolve_uri(uri)?;
        run(component, args).await
    }

    /// Invoke any component by name with prepared arguments.
    pub async fn invoke(&self, name: &str, args: CallArguments) -> BridgeResult<InvocationResult> {
        let component = self
            .get(name)
            .ok_or_else(|| BridgeError::ComponentNotFound(name.to_string()))?;
        run(component, args).await
    }

    /// `invoke`, abandoned with `Cancelled` once `signal` fires.
    pub async fn invoke_cancellable(
        &self,
        name: &str,
        args: CallArguments,
        mut signal: CancelSignal,
    ) -> BridgeResult<InvocationResult> {
        if signal.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = signal.cancelled() => {
                tracing::info!(component = %name, "Invocation cancelled");
                Err(BridgeError::Cancelled)
            }
            result = self.invoke(name, args) => result,
        }
    }
}

async fn run(component: &ComponentDefinition, args: CallArguments) -> BridgeResult<InvocationResult> {
    let invocation_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "invocation",
        id = %invocation_id,
        component = %component.name,
        kind = %component.kind,
    );

    async {
        let start = Instant::now();
        let result = component.invoke(&args).await;
        let outcome = metrics::outcome_label(&result);
        metrics::record_invocation(&component.name, component.kind, outcome, start.elapsed());
        match &result {
            Ok(r) => tracing::info!(status = r.status, outcome, "Invocation finished"),
            Err(e) => tracing::warn!(error = %e, outcome, "Invocation failed"),
        }
        result
    }
    .instrument(span)
    .await
}
