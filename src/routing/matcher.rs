//! Route map matching logic.
//!
//! # Responsibilities
//! - Match the HTTP method (explicit set or wildcard)
//! - Match the path template against a compiled pattern
//! - Match required tags (superset) and excluded tags (disjoint)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Pattern matching is a substring search (`Regex::is_match`); anchor the
//!   pattern with `^`/`$` to match the whole path
//! - Method names are compared uppercase
//! - Empty tag sets impose no constraint
//! - Patterns are compiled once; a bad pattern is a construction error

use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::descriptor::RouteDescriptor;
use crate::error::{BridgeError, BridgeResult};

/// What a matched route becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// Callable with structured arguments.
    Action,
    /// Readable at a fixed URI.
    Resource,
    /// Readable at a URI parameterized by path placeholders.
    ResourceTemplate,
    /// Callable like an action but exposed as a prompt.
    Prompt,
    /// Not exposed at all.
    Exclude,
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentType::Action => "action",
            ComponentType::Resource => "resource",
            ComponentType::ResourceTemplate => "resource_template",
            ComponentType::Prompt => "prompt",
            ComponentType::Exclude => "exclude",
        };
        f.write_str(name)
    }
}

/// Methods a route map applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSet {
    Any,
    Only(HashSet<Method>),
}

impl MethodSet {
    /// Parse method names; `"*"` anywhere means every method.
    pub fn parse<I, S>(methods: I) -> BridgeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        for name in methods {
            let name = name.as_ref().trim();
            if name == "*" {
                return Ok(MethodSet::Any);
            }
            let method = Method::from_bytes(name.to_ascii_uppercase().as_bytes()).map_err(|e| {
                BridgeError::InvalidRouteMap {
                    pattern: name.to_string(),
                    reason: format!("invalid method: {e}"),
                }
            })?;
            set.insert(method);
        }
        Ok(MethodSet::Only(set))
    }

    pub fn only(methods: impl IntoIterator<Item = Method>) -> Self {
        MethodSet::Only(methods.into_iter().collect())
    }

    pub fn contains(&self, method: &Method) -> bool {
        match self {
            MethodSet::Any => true,
            MethodSet::Only(set) => set.contains(method),
        }
    }
}

/// An ordered classification rule: predicate plus outcome.
#[derive(Debug, Clone)]
pub struct RouteMap {
    methods: MethodSet,
    pattern: Regex,
    tags: BTreeSet<String>,
    exclude_tags: BTreeSet<String>,
    component_type: ComponentType,
}

impl RouteMap {
    /// Compile a rule matching `methods` and `pattern`.
    pub fn new(methods: MethodSet, pattern: &str, component_type: ComponentType) -> BridgeResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| BridgeError::InvalidRouteMap {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            methods,
            pattern,
            tags: BTreeSet::new(),
            exclude_tags: BTreeSet::new(),
            component_type,
        })
    }

    /// A rule matching every route.
    pub fn catch_all(component_type: ComponentType) -> Self {
        Self {
            methods: MethodSet::Any,
            pattern: Regex::new(".*").expect("literal pattern compiles"),
            tags: BTreeSet::new(),
            exclude_tags: BTreeSet::new(),
            component_type,
        }
    }

    /// Require the route to carry all of `tags`.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Reject routes carrying any of `tags`.
    pub fn with_exclude_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// True when every condition of this rule holds for `route`.
    pub fn matches(&self, route: &RouteDescriptor) -> bool {
        self.methods.contains(&route.method)
            && self.pattern.is_match(&route.path)
            && self.tags.is_subset(&route.tags)
            && self.exclude_tags.is_disjoint(&route.tags)
    }
}

/// The fixed rules appended after any custom ones.
pub fn default_route_maps() -> Vec<RouteMap> {
    vec![
        RouteMap::new(
            MethodSet::only([Method::GET]),
            r".*\{[^}]+\}.*",
            ComponentType::ResourceTemplate,
        )
        .expect("default template pattern compiles"),
        RouteMap::new(MethodSet::only([Method::GET]), ".*", ComponentType::Resource)
            .expect("default resource pattern compiles"),
        RouteMap::catch_all(ComponentType::Action),
    ]
}
