//! Model Gateway
//!
//! Serves a set of named LLM routes over HTTP and picks up edits to the
//! routes file without a restart.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────────┐
//!                      │                 MODEL GATEWAY                   │
//!                      │                                                 │
//!   Client Request     │  ┌─────────┐    ┌────────────┐    ┌──────────┐ │
//!   ───────────────────┼─▶│  http   │───▶│  dispatch  │───▶│ provider │─┼──▶ LLM API
//!                      │  │ server  │    │            │    │ adapters │ │
//!                      │  └─────────┘    └─────┬──────┘    └──────────┘ │
//!                      │                       │ snapshot               │
//!                      │                       ▼                        │
//!                      │                ┌────────────┐                  │
//!                      │                │  routing   │◀── publish ──┐   │
//!                      │                │  registry  │              │   │
//!                      │                └────────────┘              │   │
//!                      │                                     ┌──────┴─┐ │
//!   routes.yaml  ──────┼──────────── poll ──────────────────▶│ config │ │
//!                      │                                     │ watcher│ │
//!                      │                                     └────────┘ │
//!                      └────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use model_gateway::config::schema::{GatewaySettings, LogFormat};
use model_gateway::lifecycle::signals::spawn_signal_handler;
use model_gateway::observability::{logging, metrics};
use model_gateway::{Gateway, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "model-gateway", version)]
#[command(about = "LLM model gateway with live route reloading", long_about = None)]
struct Cli {
    /// Path to the routes YAML file
    #[arg(long, env = "MODEL_GATEWAY_CONFIG_PATH")]
    config_path: PathBuf,

    #[arg(long, env = "MODEL_GATEWAY_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "MODEL_GATEWAY_PORT", default_value_t = 5000)]
    port: u16,

    /// Delay between checks of the routes file
    #[arg(long, env = "MODEL_GATEWAY_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Deadline for a single provider call
    #[arg(long, env = "MODEL_GATEWAY_PROVIDER_TIMEOUT_SECS", default_value_t = 60)]
    provider_timeout_secs: u64,

    /// Overall HTTP request timeout; must exceed the provider deadline
    #[arg(long, env = "MODEL_GATEWAY_REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    request_timeout_secs: u64,

    #[arg(long, env = "MODEL_GATEWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "MODEL_GATEWAY_LOG_FORMAT", default_value = "pretty", value_parser = ["pretty", "json"])]
    log_format: String,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "MODEL_GATEWAY_METRICS_ADDRESS")]
    metrics_address: Option<SocketAddr>,
}

impl Cli {
    fn settings(&self) -> GatewaySettings {
        let mut settings = GatewaySettings::default();
        settings.listener.host = self.host.clone();
        settings.listener.port = self.port;
        settings.reload.poll_interval_ms = self.poll_interval_ms;
        settings.timeouts.provider_secs = self.provider_timeout_secs;
        settings.timeouts.request_secs = self.request_timeout_secs;
        settings.observability.log_level = self.log_level.clone();
        settings.observability.log_format = match self.log_format.as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        if let Some(addr) = self.metrics_address {
            settings.observability.metrics_enabled = true;
            settings.observability.metrics_address = addr;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = cli.settings();

    logging::init_logging(&settings.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "model-gateway starting");

    if settings.observability.metrics_enabled {
        metrics::init_metrics(settings.observability.metrics_address);
    }

    let gateway = match Gateway::bootstrap(&cli.config_path, settings.clone()) {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    let listener = TcpListener::bind(settings.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    gateway.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
