//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → dispatcher.rs (snapshot current RouteTable)
//!     → list / get: project to PublicRouteView
//!     → invoke: ProviderAdapter under a deadline
//!     → error.rs (RouteNotFound / MethodNotAllowed / ProviderDispatch / ProviderTimeout)
//! ```
//!
//! # Design Decisions
//! - Always reads through the registry, never the watcher
//! - One snapshot per request; no re-checking for staleness
//! - Only public views leave this module

pub mod dispatcher;
pub mod error;

pub use dispatcher::RequestDispatcher;
pub use error::DispatchError;
