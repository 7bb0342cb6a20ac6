//! Route descriptor subsystem.
//!
//! # Data Flow
//! ```text
//! openapiv3::OpenAPI (parsed externally)
//!     → builder.rs (merge params, resolve refs, aggregate body fields)
//!     → model.rs RouteDescriptor (immutable, one per operation)
//!     → routing / binding
//! ```
//!
//! # Design Decisions
//! - Normalize eagerly: nothing downstream re-reads the raw document
//! - Document order is preserved so component naming is deterministic

pub mod builder;
pub mod model;

pub use builder::build_descriptors;
pub use model::{
    BodyField, BodyFormat, ParamLocation, ParamSpec, ParamStyle, RequestBodySpec,
    RouteDescriptor, ScalarType,
};
