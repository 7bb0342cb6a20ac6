//! Component subsystem.
//!
//! # Data Flow
//! ```text
//! ClassificationResult (descriptor + component type)
//!     → naming.rs (override / operationId / method+path, slug, dedupe)
//!     → factory.rs (bindings, input schema, URI, invoker)
//!     → registry.rs (ComponentSet: lookup by name and URI, invocation)
//! ```
//!
//! # Design Decisions
//! - One definition per non-excluded route, in document order
//! - Definitions share a single invoker (client plus timeout)

pub mod factory;
pub mod naming;
pub mod registry;

pub use factory::{build_component, input_schema, resource_uri, template_uri, ComponentDefinition, Invoker};
pub use naming::{base_name, slugify, NameAllocator};
pub use registry::ComponentSet;
