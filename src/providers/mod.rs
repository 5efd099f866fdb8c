//! Provider adapters.
//!
//! # Data Flow
//! ```text
//! RequestDispatcher
//!     → ProviderRegistry::get(route.model.provider)
//!     → ProviderAdapter::invoke(route, payload)
//!     → vendor HTTP API (reqwest)
//!     → ProviderResponse (upstream JSON body)
//! ```
//!
//! # Design Decisions
//! - Each provider is one trait object; the dispatcher never branches on
//!   provider identity
//! - Secrets are resolved at call time (`$ENV_VAR` references), so
//!   validation stays free of environment access
//! - Request/response bodies pass through; vendor-neutral translation is
//!   not done here

pub mod anthropic;
pub mod openai;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::schema::{Provider, RouteConfig, RouteType};

pub use anthropic::AnthropicAdapter;
pub use openai::OpenAiAdapter;

/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Errors raised by a provider adapter.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no adapter registered for provider '{0}'")]
    NotRegistered(Provider),

    #[error("provider '{provider}' does not serve route type '{route_type}'")]
    UnsupportedRouteType {
        provider: Provider,
        route_type: RouteType,
    },

    #[error("missing provider setting '{0}'")]
    MissingSetting(&'static str),

    #[error("environment variable '{0}' referenced by a provider secret is not set")]
    UnresolvedSecret(String),

    #[error("invalid request payload: {0}")]
    InvalidPayload(String),

    #[error("request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// Body returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub body: Value,
}

/// A backend capable of serving routes of one provider.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Forward `payload` to the model bound to `route`.
    async fn invoke(&self, route: &RouteConfig, payload: Value) -> Result<ProviderResponse, ProviderError>;
}

/// Adapters keyed by provider.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with an adapter for every built-in provider.
    pub fn with_defaults(client: reqwest::Client) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OpenAiAdapter::new(client.clone())));
        registry.register(Arc::new(AnthropicAdapter::new(client)));
        registry
    }

    /// Register an adapter, replacing any previous one for the same provider.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.provider(), adapter);
    }

    pub fn get(&self, provider: Provider) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
        self.adapters
            .get(&provider)
            .cloned()
            .ok_or(ProviderError::NotRegistered(provider))
    }
}

/// Resolve a secret setting. `$NAME` reads environment variable `NAME`.
pub fn resolve_secret(value: &str) -> Result<String, ProviderError> {
    match value.strip_prefix('$') {
        Some(var) if !var.is_empty() => {
            std::env::var(var).map_err(|_| ProviderError::UnresolvedSecret(var.to_string()))
        }
        _ => Ok(value.to_string()),
    }
}

/// Payloads must be JSON objects.
fn payload_object(payload: Value) -> Result<Map<String, Value>, ProviderError> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(ProviderError::InvalidPayload(format!(
            "expected a JSON object, found {}",
            match other {
                Value::Array(_) => "a list",
                Value::String(_) => "a string",
                Value::Number(_) => "a number",
                Value::Bool(_) => "a boolean",
                _ => "null",
            }
        ))),
    }
}

/// Turn an upstream HTTP response into a provider result.
async fn read_response(response: reqwest::Response) -> Result<ProviderResponse, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        return Err(ProviderError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    Ok(ProviderResponse {
        body: response.json::<Value>().await?,
    })
}
