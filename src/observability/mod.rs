//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Watcher, dispatcher, HTTP layer:
//!     → logging.rs (tracing events: reload outcomes, dispatch failures)
//!     → metrics.rs (reload counters, table generation, invocation latency)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → optional Prometheus listener
//! ```
//!
//! # Design Decisions
//! - Provider settings never reach a log field or a metric label
//! - `RUST_LOG` wins over the configured level

pub mod logging;
pub mod metrics;
