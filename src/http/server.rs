//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Serve route listing, lookup and invocation through the dispatcher
//! - Answer liveness probes regardless of configuration state

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::GatewaySettings;
use crate::dispatch::{DispatchError, RequestDispatcher};
use crate::http::request::{propagate_request_id_layer, request_id_of, set_request_id_layer};
use crate::http::response::ApiError;

/// Largest accepted invocation body.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: RequestDispatcher,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving through `dispatcher`.
    pub fn new(dispatcher: RequestDispatcher, settings: &GatewaySettings) -> Self {
        let state = AppState { dispatcher };
        let router = Self::build_router(settings, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(settings: &GatewaySettings, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/gateway/routes", get(list_routes).fallback(method_not_allowed))
            .route("/gateway/routes/", get(list_routes).fallback(method_not_allowed))
            .route(
                "/gateway/routes/{name}",
                get(get_route).post(invoke_route).fallback(method_not_allowed),
            )
            .route("/gateway/routes/{name}/", get(get_route).fallback(method_not_allowed))
            .fallback(not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(TimeoutLayer::new(Duration::from_secs(settings.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Liveness only: succeeds whatever the state of the configuration source.
async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

async fn list_routes(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "routes": state.dispatcher.list_routes() }))
}

async fn get_route(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let route = state.dispatcher.get_route(&name)?;
    Ok(Json(json!({ "route": route })))
}

/// Invocation endpoints exist only for active routes, so an unknown name
/// is a method error on the lookup path rather than a 404.
async fn invoke_route(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    if !state.dispatcher.contains(&name) {
        return Err(DispatchError::MethodNotAllowed.into());
    }

    let request_id = request_id_of(&headers);
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(format!("Failed to read request body: {}", rejection.body_text()))
        }
    })?;
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON payload: {e}")))?;

    tracing::debug!(request_id = %request_id, route = %name, "Invoking route");

    let response = state
        .dispatcher
        .invoke(&name, payload)
        .await
        .map_err(|e| match e {
            DispatchError::RouteNotFound(_) => DispatchError::MethodNotAllowed,
            other => other,
        })?;
    Ok(Json(response.body))
}

async fn method_not_allowed() -> ApiError {
    DispatchError::MethodNotAllowed.into()
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
