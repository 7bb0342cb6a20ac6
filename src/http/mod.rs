//! HTTP translation subsystem.
//!
//! # Data Flow
//! ```text
//! CallArguments + ParameterBinding[]
//!     → request.rs (path substitution, query/header/cookie filter, body)
//!     → RequestPlan
//!     → client.rs (merge default headers, send, buffer body, deadline)
//!     → UpstreamResponse
//!     → response.rs (JSON / text / bytes)
//!     → InvocationResult
//! ```

pub mod client;
pub mod request;
pub mod response;

pub use client::UpstreamClient;
pub use request::{translate, ArgValue, CallArguments, PlannedBody, RequestPlan};
pub use response::{map_response, InvocationPayload, InvocationResult, UpstreamResponse};
