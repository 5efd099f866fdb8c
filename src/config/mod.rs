//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML)
//!     → loader.rs (read & parse into a document tree)
//!     → validation.rs (every semantic check, all issues collected)
//!     → GatewayConfig (validated, immutable)
//!     → routing::RouteRegistry::publish
//!
//! Every poll interval:
//!     watcher.rs re-reads the file
//!     → unchanged document: nothing happens
//!     → changed and valid: atomic swap of the route table
//!     → changed and invalid: logged, previous table stays live
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - Reloads are all-or-nothing
//! - Server settings (listener, timeouts, logging) are fixed at startup;
//!   only routes reload

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError, LoadedConfig};
pub use schema::{
    GatewayConfig, GatewaySettings, ModelConfig, Provider, PublicRouteView, RouteConfig, RouteType,
};
pub use validation::{validate_config, ConfigValidationError, ValidationIssue};
pub use watcher::{ConfigWatcher, ReloadOutcome};
