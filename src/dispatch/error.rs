//! Dispatch-time errors.

use std::time::Duration;

use thiserror::Error;

use crate::providers::ProviderError;

/// Errors surfaced to callers of the dispatcher. None of them affect the
/// route table.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("The route '{0}' is not present or active on the server. Please verify the route name.")]
    RouteNotFound(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("route '{route}' failed: {source}")]
    ProviderDispatch {
        route: String,
        #[source]
        source: ProviderError,
    },

    #[error("route '{route}' did not respond within {} seconds", .timeout.as_secs())]
    ProviderTimeout { route: String, timeout: Duration },
}

impl DispatchError {
    /// Label used in metrics.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchError::RouteNotFound(_) => "not_found",
            DispatchError::MethodNotAllowed => "method_not_allowed",
            DispatchError::ProviderDispatch { .. } => "provider_error",
            DispatchError::ProviderTimeout { .. } => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_message() {
        assert_eq!(
            DispatchError::RouteNotFound("invalid".into()).to_string(),
            "The route 'invalid' is not present or active on the server. Please verify the route name."
        );
        assert_eq!(DispatchError::MethodNotAllowed.to_string(), "Method Not Allowed");
    }
}
