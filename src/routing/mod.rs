//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! RouteDescriptor (method, path template, tags)
//!     → router.rs (ordered scan of custom ++ default rules)
//!     → matcher.rs (evaluate method / pattern / tag conditions)
//!     → Return: ComponentType of the first matching rule
//!
//! Rule Compilation (at startup):
//!     RouteMapConfig[]
//!     → Compile patterns and method sets
//!     → Append the three default rules
//!     → Freeze as immutable RouteClassifier
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable afterwards
//! - Deterministic: same descriptor always gets the same type
//! - First match wins (declaration order, no priorities)

pub mod matcher;
pub mod router;

pub use matcher::{default_route_maps, ComponentType, MethodSet, RouteMap};
pub use router::{classify, ClassificationResult, ClassifyOverride, RouteClassifier};
