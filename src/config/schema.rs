//! Configuration schema definitions.
//!
//! Two families of types live here:
//! - The route configuration document (routes, models, provider settings)
//!   that is re-read from disk on every reload.
//! - Process-level server settings, fixed at startup from the command line.
//!
//! Route types are produced by the validator, never deserialized directly,
//! so every `GatewayConfig` in circulation has already passed validation.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Kind of model endpoint a route exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RouteType {
    #[serde(rename = "llm/v1/completions")]
    Completions,
    #[serde(rename = "llm/v1/chat")]
    Chat,
    #[serde(rename = "llm/v1/embeddings")]
    Embeddings,
}

impl RouteType {
    pub const ALL: [RouteType; 3] = [RouteType::Completions, RouteType::Chat, RouteType::Embeddings];

    /// Wire name used in configuration files and public views.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteType::Completions => "llm/v1/completions",
            RouteType::Chat => "llm/v1/chat",
            RouteType::Embeddings => "llm/v1/embeddings",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend vendor hosting a route's model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
}

pub const OPENAI_API_KEY: &str = "openai_api_key";
pub const OPENAI_API_BASE: &str = "openai_api_base";
pub const OPENAI_API_TYPE: &str = "openai_api_type";
pub const OPENAI_API_VERSION: &str = "openai_api_version";
pub const OPENAI_DEPLOYMENT_NAME: &str = "openai_deployment_name";
pub const OPENAI_ORGANIZATION: &str = "openai_organization";

pub const ANTHROPIC_API_KEY: &str = "anthropic_api_key";
pub const ANTHROPIC_API_BASE: &str = "anthropic_api_base";
pub const ANTHROPIC_VERSION: &str = "anthropic_version";

/// Accepted values of `openai_api_type`.
pub const OPENAI_API_TYPES: [&str; 3] = ["open_ai", "azure", "azuread"];

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }

    /// Settings that must be present in `model.config`.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &[OPENAI_API_KEY],
            Provider::Anthropic => &[ANTHROPIC_API_KEY],
        }
    }

    /// Settings that may be present in `model.config`.
    pub fn optional_keys(&self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &[
                OPENAI_API_BASE,
                OPENAI_API_TYPE,
                OPENAI_API_VERSION,
                OPENAI_DEPLOYMENT_NAME,
                OPENAI_ORGANIZATION,
            ],
            Provider::Anthropic => &[ANTHROPIC_API_BASE, ANTHROPIC_VERSION],
        }
    }

    pub fn supports(&self, route_type: RouteType) -> bool {
        match self {
            Provider::OpenAi => true,
            Provider::Anthropic => !matches!(route_type, RouteType::Embeddings),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific settings, possibly including secrets.
pub type ProviderSettings = BTreeMap<String, serde_json::Value>;

/// Model binding of a route.
#[derive(Clone, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub provider: Provider,
    pub config: ProviderSettings,
}

impl ModelConfig {
    /// String value of a provider setting, if present and a string.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }
}

// Secrets must not leak through `{:?}` in log lines.
impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.config.keys().map(String::as_str).collect();
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("config_keys", &keys)
            .finish()
    }
}

/// A validated route definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    /// Unique route identifier, used as a URL path segment.
    pub name: String,

    pub route_type: RouteType,

    pub model: ModelConfig,
}

/// A fully validated configuration document, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GatewayConfig {
    pub routes: Vec<RouteConfig>,
}

/// Externally visible model description. Never carries provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublicModelView {
    pub name: String,
    pub provider: Provider,
}

/// Externally visible, secret-free projection of a route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublicRouteView {
    pub name: String,
    #[serde(rename = "type")]
    pub route_type: RouteType,
    pub model: PublicModelView,
}

impl From<&RouteConfig> for PublicRouteView {
    fn from(route: &RouteConfig) -> Self {
        Self {
            name: route.name.clone(),
            route_type: route.route_type,
            model: PublicModelView {
                name: route.model.name.clone(),
                provider: route.model.provider,
            },
        }
    }
}

/// Root of the process-level settings.
#[derive(Debug, Clone, Default)]
pub struct GatewaySettings {
    pub listener: ListenerConfig,

    pub reload: ReloadConfig,

    pub timeouts: TimeoutConfig,

    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub host: String,
    pub port: u16,
}

impl ListenerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Configuration source polling.
#[derive(Debug, Clone)]
pub struct ReloadConfig {
    /// Delay between two checks of the configuration source.
    pub poll_interval_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Deadline for a single provider invocation in seconds.
    pub provider_secs: u64,

    /// Outer HTTP request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            provider_secs: 60,
            request_secs: 120,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: SocketAddr,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: SocketAddr::from(([127, 0, 0, 1], 9090)),
        }
    }
}
