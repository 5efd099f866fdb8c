//! Error responses.
//!
//! # Responsibilities
//! - Map dispatch errors to HTTP status codes
//! - Render every error as `{"detail": "..."}`
//!
//! # Design Decisions
//! - Provider failures are 502, provider timeouts 504
//! - Caller mistakes reported by the provider keep their 4xx status;
//!   credential rejections (401/403) are the gateway's problem and map to 502
//! - Error details never contain provider settings

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::dispatch::DispatchError;
use crate::providers::ProviderError;

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    Dispatch(DispatchError),
    BadRequest(String),
    PayloadTooLarge,
    NotFound,
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        ApiError::Dispatch(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Dispatch(e) => match e {
                DispatchError::RouteNotFound(_) => StatusCode::NOT_FOUND,
                DispatchError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
                DispatchError::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                DispatchError::ProviderDispatch { source, .. } => provider_status(source),
            },
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::BadRequest(message) => message.clone(),
            ApiError::PayloadTooLarge => "Payload Too Large".to_string(),
            ApiError::NotFound => "Not Found".to_string(),
            ApiError::Dispatch(e) => e.to_string(),
        }
    }
}

fn provider_status(error: &ProviderError) -> StatusCode {
    match error {
        ProviderError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        ProviderError::Upstream { status, .. } => match StatusCode::from_u16(*status) {
            Ok(code)
                if code.is_client_error()
                    && code != StatusCode::UNAUTHORIZED
                    && code != StatusCode::FORBIDDEN =>
            {
                code
            }
            _ => StatusCode::BAD_GATEWAY,
        },
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
