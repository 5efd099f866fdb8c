//! Route listing, lookup and invocation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::config::schema::PublicRouteView;
use crate::dispatch::error::DispatchError;
use crate::observability::metrics;
use crate::providers::{ProviderRegistry, ProviderResponse};
use crate::resilience::timeouts::with_deadline;
use crate::routing::RouteRegistry;

/// Serves requests against the currently published route table.
#[derive(Clone)]
pub struct RequestDispatcher {
    registry: Arc<RouteRegistry>,
    providers: ProviderRegistry,
    provider_timeout: Duration,
}

impl RequestDispatcher {
    pub fn new(registry: Arc<RouteRegistry>, providers: ProviderRegistry, provider_timeout: Duration) -> Self {
        Self {
            registry,
            providers,
            provider_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    /// Every active route, in configuration order.
    pub fn list_routes(&self) -> Vec<PublicRouteView> {
        self.registry.current().public_views()
    }

    pub fn get_route(&self, name: &str) -> Result<PublicRouteView, DispatchError> {
        self.registry
            .current()
            .get(name)
            .map(PublicRouteView::from)
            .ok_or_else(|| DispatchError::RouteNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.current().get(name).is_some()
    }

    /// Forward `payload` to the provider behind route `name`.
    pub async fn invoke(&self, name: &str, payload: Value) -> Result<ProviderResponse, DispatchError> {
        let start = Instant::now();
        let result = self.invoke_inner(name, payload).await;

        let status = match &result {
            Ok(_) => "ok",
            Err(e) => e.label(),
        };
        // Unknown names stay out of metric labels.
        let route_label = match &result {
            Err(DispatchError::RouteNotFound(_)) => "unknown",
            _ => name,
        };
        metrics::record_request(route_label, status, start);

        if let Err(e) = &result {
            match e {
                DispatchError::RouteNotFound(_) | DispatchError::MethodNotAllowed => {
                    tracing::debug!(route = %name, error = %e, "Invocation refused");
                }
                _ => tracing::warn!(route = %name, error = %e, "Invocation failed"),
            }
        }
        result
    }

    async fn invoke_inner(&self, name: &str, payload: Value) -> Result<ProviderResponse, DispatchError> {
        // Held for the whole call; a concurrent reload does not affect it.
        let table = self.registry.current();
        let route = table
            .get(name)
            .ok_or_else(|| DispatchError::RouteNotFound(name.to_string()))?;

        let adapter = self
            .providers
            .get(route.model.provider)
            .map_err(|source| DispatchError::ProviderDispatch {
                route: name.to_string(),
                source,
            })?;

        tracing::debug!(
            route = %name,
            provider = %route.model.provider,
            generation = table.generation(),
            "Dispatching request"
        );

        match with_deadline(self.provider_timeout, adapter.invoke(route, payload)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(source)) => Err(DispatchError::ProviderDispatch {
                route: name.to_string(),
                source,
            }),
            Err(_) => Err(DispatchError::ProviderTimeout {
                route: name.to_string(),
                timeout: self.provider_timeout,
            }),
        }
    }
}
