//! Parameter binding.
//!
//! # Responsibilities
//! - Derive one binding per declared parameter, in declaration order
//! - Keep the wire name (what the upstream sees) apart from the argument
//!   name (what callers pass)
//! - Disambiguate argument names that collide with body fields or with an
//!   earlier parameter
//!
//! # Design Decisions
//! - Pure and deterministic; run once per descriptor at build time
//! - Colliding arguments get a `__<location>` suffix, body fields keep
//!   their plain names

use serde_json::Value;
use std::collections::HashSet;

use crate::descriptor::{ParamLocation, ParamSpec, ParamStyle, RouteDescriptor, ScalarType};

/// Where and how one parameter is placed in an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    /// Name sent upstream.
    pub wire_name: String,
    /// Name callers use in their arguments.
    pub arg_name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub scalar_type: ScalarType,
    pub style: ParamStyle,
    pub explode: bool,
    pub schema: Value,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl ParameterBinding {
    fn from_spec(spec: &ParamSpec, arg_name: String) -> Self {
        Self {
            wire_name: spec.name.clone(),
            arg_name,
            location: spec.location,
            required: spec.required,
            scalar_type: spec.scalar_type,
            style: spec.style,
            explode: spec.explode,
            schema: spec.schema.clone(),
            default: spec.default.clone(),
            description: spec.description.clone(),
        }
    }
}

/// Derive the bindings of `descriptor`.
pub fn bind(descriptor: &RouteDescriptor) -> Vec<ParameterBinding> {
    let mut taken: HashSet<String> = descriptor
        .request_body
        .iter()
        .flat_map(|body| body.field_names())
        .map(str::to_string)
        .collect();

    descriptor
        .parameters
        .iter()
        .map(|spec| {
            let arg_name = if taken.contains(&spec.name) {
                format!("{}__{}", spec.name, spec.location)
            } else {
                spec.name.clone()
            };
            taken.insert(arg_name.clone());
            ParameterBinding::from_spec(spec, arg_name)
        })
        .collect()
}

/// Bindings placed at `location`, in declaration order.
pub fn bindings_in(
    bindings: &[ParameterBinding],
    location: ParamLocation,
) -> impl Iterator<Item = &ParameterBinding> {
    bindings.iter().filter(move |b| b.location == location)
}
