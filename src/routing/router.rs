//! Route classification.
//!
//! # Responsibilities
//! - Hold the effective rule list (custom rules, then defaults)
//! - Return the component type of the first matching rule
//! - Apply an optional caller override after rule evaluation
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - O(n) scan; rule lists are short
//! - Total: the last default rule matches everything

use std::fmt;
use std::sync::Arc;

use crate::descriptor::RouteDescriptor;
use crate::routing::matcher::{default_route_maps, ComponentType, RouteMap};

/// Caller hook that may replace a rule's verdict.
pub type ClassifyOverride = Arc<dyn Fn(&RouteDescriptor, ComponentType) -> Option<ComponentType> + Send + Sync>;

/// Outcome of classifying one descriptor.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub descriptor: Arc<RouteDescriptor>,
    pub component_type: ComponentType,
}

/// First matching rule in `rules`, if any.
pub fn classify(route: &RouteDescriptor, rules: &[RouteMap]) -> Option<ComponentType> {
    rules
        .iter()
        .find(|rule| rule.matches(route))
        .map(RouteMap::component_type)
}

/// Ordered rule list with the defaults appended.
#[derive(Clone)]
pub struct RouteClassifier {
    rules: Vec<RouteMap>,
    custom_len: usize,
    override_fn: Option<ClassifyOverride>,
}

impl RouteClassifier {
    /// Build `custom ++ defaults`.
    pub fn new(custom: Vec<RouteMap>) -> Self {
        let custom_len = custom.len();
        let mut rules = custom;
        rules.extend(default_route_maps());
        Self {
            rules,
            custom_len,
            override_fn: None,
        }
    }

    pub fn with_override(mut self, f: ClassifyOverride) -> Self {
        self.override_fn = Some(f);
        self
    }

    pub fn rules(&self) -> &[RouteMap] {
        &self.rules
    }

    /// Number of caller-supplied rules ahead of the defaults.
    pub fn custom_len(&self) -> usize {
        self.custom_len
    }

    pub fn classify(&self, route: &RouteDescriptor) -> ComponentType {
        let verdict = classify(route, &self.rules).unwrap_or(ComponentType::Action);
        match &self.override_fn {
            Some(f) => f(route, verdict).unwrap_or(verdict),
            None => verdict,
        }
    }

    pub fn classify_shared(&self, descriptor: Arc<RouteDescriptor>) -> ClassificationResult {
        let component_type = self.classify(&descriptor);
        tracing::debug!(route = %descriptor, component_type = %component_type, "Route classified");
        ClassificationResult {
            descriptor,
            component_type,
        }
    }
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for RouteClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteClassifier")
            .field("rules", &self.rules)
            .field("custom_len", &self.custom_len)
            .field("override", &self.override_fn.is_some())
            .finish()
    }
}
