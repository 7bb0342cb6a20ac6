//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config / builder calls → Parse OpenAPI → Descriptors
//!     → Classify → Name → Build components → ComponentSet
//!
//! Cancellation (cancel.rs):
//!     CancelHandle::cancel() → every linked CancelSignal fires
//!     → in-flight invocation dropped → Cancelled
//! ```
//!
//! # Design Decisions
//! - Construction is all-or-nothing
//! - Cancellation is cooperative and only observed at the network I/O point

pub mod cancel;
pub mod startup;

pub use cancel::{CancelHandle, CancelSignal};
pub use startup::BridgeBuilder;
