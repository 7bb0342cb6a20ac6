//! # Naming Utilities
//!
//! Helpers for deriving stable, unique component names from operations.

use std::collections::{HashMap, HashSet};

use crate::descriptor::RouteDescriptor;

/// Longest name a component may carry (before a dedupe suffix).
pub const MAX_NAME_LEN: usize = 56;

/// Replace every run of non-alphanumeric characters with one `_` and trim
/// underscores at both ends.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Derives a name from the HTTP method and URL path when `operationId` is
/// missing.
///
/// e.g. `GET /users/{id}` -> `get_users_id`
pub fn derive_route_name(method: &str, path: &str) -> String {
    let clean_path = path.replace(['{', '}'], "").replace('/', "_");
    format!("{}_{}", method.to_lowercase(), clean_path.trim_start_matches('_'))
}

/// Name for `route` before de-duplication.
///
/// An override keyed by `operationId` wins. Otherwise framework-style ids
/// such as `list_users__get` are cut at the first `__`.
pub fn base_name(route: &RouteDescriptor, overrides: &HashMap<String, String>) -> String {
    let raw = match route.operation_id.as_deref() {
        Some(id) => match overrides.get(id) {
            Some(name) => name.clone(),
            None => id.split("__").next().unwrap_or(id).to_string(),
        },
        None => derive_route_name(route.method.as_str(), &route.path),
    };

    let mut name = slugify(&raw);
    if name.is_empty() {
        name = slugify(&derive_route_name(route.method.as_str(), &route.path));
    }
    name.truncate(MAX_NAME_LEN);
    name.trim_end_matches('_').to_string()
}

/// Hands out unique names in request order.
#[derive(Debug, Default)]
pub struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `base` if unused, else the first free `base_2`, `base_3`, ...
    pub fn allocate(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.used.insert(candidate.clone()) {
                tracing::debug!(base = %base, name = %candidate, "Duplicate component name suffixed");
                return candidate;
            }
            n += 1;
        }
    }
}
