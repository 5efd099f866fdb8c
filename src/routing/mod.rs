//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Successful reload:
//!     GatewayConfig (validated)
//!     → table.rs (index by name, keep file order)
//!     → registry.rs (assign generation, atomic swap)
//!
//! Request:
//!     registry.current() → Arc<RouteTable> held for the whole request
//!     → lookup by name
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; reloads replace, never edit
//! - One table per generation, generations strictly increase
//! - Staleness of at most one poll interval is accepted

pub mod registry;
pub mod table;

pub use registry::RouteRegistry;
pub use table::RouteTable;
