//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream exchange:
//!     → timeouts.rs (one deadline over send + body read)
//!     → expiry → UpstreamRequest with a timeout cause
//! ```
//!
//! # Design Decisions
//! - Timeouts are opt-in; none are applied unless configured
//! - No retries: operations may not be idempotent and callers decide

pub mod timeouts;

pub use timeouts::{timeout_from_secs, with_timeout, Elapsed};
