//! Parameter binding subsystem.
//!
//! Bindings decide where each declared parameter travels in the outbound
//! request (path, query, header, cookie) and whether it is required. They
//! are computed once per descriptor and stored on the component.

pub mod binder;

pub use binder::{bind, bindings_in, ParameterBinding};
