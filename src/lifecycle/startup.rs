//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate server settings
//! - Load and validate the configuration (fail fast: no table, no server)
//! - Build the registry, dispatcher and watcher
//! - Run the watcher alongside the HTTP server until shutdown
//!
//! # Design Decisions
//! - The very first load is the only configuration error that stops the
//!   process; later errors are contained by the watcher
//! - Listeners are bound by the caller, so tests can use ephemeral ports

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::GatewaySettings;
use crate::config::watcher::ConfigWatcher;
use crate::dispatch::RequestDispatcher;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::providers::ProviderRegistry;
use crate::routing::RouteRegistry;

/// Reasons the gateway cannot start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("initial configuration load failed: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Reject settings the gateway cannot run with.
pub fn validate_settings(settings: &GatewaySettings) -> Result<(), StartupError> {
    let mut problems = Vec::new();
    if settings.reload.poll_interval_ms == 0 {
        problems.push("reload.poll_interval_ms must be greater than 0");
    }
    if settings.timeouts.provider_secs == 0 {
        problems.push("timeouts.provider_secs must be greater than 0");
    }
    if settings.timeouts.request_secs == 0 {
        problems.push("timeouts.request_secs must be greater than 0");
    }
    // The provider deadline has to expire before the outer HTTP timeout.
    if settings.timeouts.provider_secs >= settings.timeouts.request_secs {
        problems.push("timeouts.provider_secs must be less than timeouts.request_secs");
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(StartupError::Settings(problems.join(", ")))
    }
}

/// A fully initialised gateway, ready to serve.
pub struct Gateway {
    settings: GatewaySettings,
    config_path: PathBuf,
    dispatcher: RequestDispatcher,
    watcher: ConfigWatcher,
}

impl Gateway {
    /// Initialise with the built-in provider adapters.
    pub fn bootstrap(config_path: &Path, settings: GatewaySettings) -> Result<Self, StartupError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("model-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_providers(config_path, settings, ProviderRegistry::with_defaults(client))
    }

    /// Initialise with a caller-supplied set of provider adapters.
    pub fn with_providers(
        config_path: &Path,
        settings: GatewaySettings,
        providers: ProviderRegistry,
    ) -> Result<Self, StartupError> {
        validate_settings(&settings)?;

        let loaded = load_config(config_path)?;
        let registry = Arc::new(RouteRegistry::new(loaded.config));
        let table = registry.current();
        metrics::record_route_table(table.generation(), table.len());
        tracing::info!(
            path = %config_path.display(),
            route_count = table.len(),
            generation = table.generation(),
            "Configuration loaded"
        );

        let dispatcher = RequestDispatcher::new(
            Arc::clone(&registry),
            providers,
            Duration::from_secs(settings.timeouts.provider_secs),
        );
        let watcher = ConfigWatcher::new(
            config_path,
            registry,
            loaded.document,
            Duration::from_millis(settings.reload.poll_interval_ms),
        );

        Ok(Self {
            settings,
            config_path: config_path.to_path_buf(),
            dispatcher,
            watcher,
        })
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        self.dispatcher.registry()
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        tracing::info!(path = %self.config_path.display(), "Gateway starting");

        let watcher = tokio::spawn(self.watcher.run(shutdown.subscribe()));
        let server = HttpServer::new(self.dispatcher, &self.settings);
        let result = server.run(listener, shutdown.subscribe()).await;

        // Normally already finished via the shutdown signal; a server error
        // must not leave it polling.
        watcher.abort();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_settings_validation() {
        assert!(validate_settings(&GatewaySettings::default()).is_ok());

        let mut settings = GatewaySettings::default();
        settings.reload.poll_interval_ms = 0;
        settings.timeouts.provider_secs = 0;
        let err = validate_settings(&settings).unwrap_err().to_string();
        assert!(err.contains("poll_interval_ms"));
        assert!(err.contains("provider_secs"));
    }

    #[test]
    fn test_provider_deadline_must_fit_inside_request_timeout() {
        let mut settings = GatewaySettings::default();
        settings.timeouts.request_secs = 1;
        settings.timeouts.provider_secs = 2;
        let err = validate_settings(&settings).unwrap_err().to_string();
        assert!(err.contains("provider_secs must be less than timeouts.request_secs"));

        settings.timeouts.provider_secs = 1;
        assert!(validate_settings(&settings).is_err());

        settings.timeouts.request_secs = 2;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_invalid_first_load_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "routes:\n  - name: broken\n").unwrap();

        let result = Gateway::with_providers(&path, GatewaySettings::default(), ProviderRegistry::new());
        assert!(matches!(result, Err(StartupError::Config(ConfigError::Validation(_)))));

        let result = Gateway::with_providers(
            &dir.path().join("missing.yaml"),
            GatewaySettings::default(),
            ProviderRegistry::new(),
        );
        assert!(matches!(result, Err(StartupError::Config(ConfigError::Io { .. }))));
    }

    #[test]
    fn test_bootstrap_builds_first_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "routes:\n  - name: chat\n    type: llm/v1/chat\n    model:\n      name: gpt-4\n      provider: openai\n      config:\n        openai_api_key: $OPENAI_API_KEY\n",
        )
        .unwrap();

        let gateway = Gateway::bootstrap(&path, GatewaySettings::default()).unwrap();
        assert_eq!(gateway.registry().generation(), 1);
        assert_eq!(gateway.dispatcher().list_routes().len(), 1);
    }
}
