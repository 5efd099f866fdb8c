//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Provider invocation:
//!     → timeouts.rs (enforce per-invocation deadline)
//!     → on expiry: dispatch reports ProviderTimeout (504)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No automatic retries: invocations are POSTs and not idempotent

pub mod timeouts;
