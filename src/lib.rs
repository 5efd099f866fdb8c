//! Dynamically reconfigurable model gateway library.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod providers;
pub mod resilience;
pub mod routing;

pub use config::schema::{GatewayConfig, GatewaySettings};
pub use dispatch::RequestDispatcher;
pub use http::HttpServer;
pub use lifecycle::{Gateway, Shutdown, StartupError};
pub use routing::RouteRegistry;
