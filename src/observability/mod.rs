//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Construction and invocations produce:
//!     → logging.rs (structured log events, invocation spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log output (stderr, filtered by RUST_LOG)
//!     → Whatever metrics recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - Every invocation runs in a span carrying a UUID invocation id
//! - Metrics are cheap (facade calls are no-ops without a recorder)

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
