//! OpenAPI Bridge
//!
//! Exposes the operations of an HTTP API described by an OpenAPI document
//! as callable components: actions, prompts, resources and resource
//! templates.
//!
//! # Architecture Overview
//!
//! ```text
//!   OpenAPI document                         Caller
//!         │                                    │ name / URI + arguments
//!         ▼                                    ▼
//!   ┌────────────┐   ┌───────────┐   ┌──────────────────┐
//!   │ descriptor │──▶│  routing  │──▶│    components    │
//!   │  builder   │   │ classifier│   │ naming / factory │
//!   └────────────┘   └───────────┘   │   ComponentSet   │
//!                                    └────────┬─────────┘
//!                                             │ bindings + arguments
//!                                             ▼
//!                                    ┌──────────────────┐
//!                                    │ http::request    │  translate
//!                                    │ http::client     │  send (timeout, cancel)
//!                                    │ http::response   │  decode
//!                                    └────────┬─────────┘
//!                                             ▼
//!                                       Upstream API
//!
//!   Cross-cutting: config · observability · resilience · lifecycle
//! ```
//!
//! # Example
//!
//! ```no_run
//! # async fn demo(spec: openapiv3::OpenAPI) -> Result<(), openapi_bridge::BridgeError> {
//! use openapi_bridge::{BridgeBuilder, UpstreamClient};
//!
//! let components = BridgeBuilder::new()
//!     .client(UpstreamClient::new("https://api.example.com/v1")?)
//!     .build(&spec)?;
//! let result = components.read("resource://getProduct/42").await?;
//! println!("{}", result.to_json());
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod binding;
pub mod components;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use components::{ComponentDefinition, ComponentSet};
pub use error::{BridgeError, BridgeResult};
pub use http::{CallArguments, InvocationPayload, InvocationResult, UpstreamClient};
pub use lifecycle::{BridgeBuilder, CancelHandle, CancelSignal};
pub use routing::{ComponentType, MethodSet, RouteMap};
