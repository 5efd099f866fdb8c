//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_config_reloads_total` (counter): reload attempts by outcome
//! - `gateway_route_table_generation` (gauge): generation being served
//! - `gateway_active_routes` (gauge): routes in the current table
//! - `gateway_requests_total` (counter): invocations by route, status
//! - `gateway_request_duration_seconds` (histogram): invocation latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Route labels only ever carry configured route names

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::watcher::ReloadOutcome;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the table currently being served.
pub fn record_route_table(generation: u64, route_count: usize) {
    gauge!("gateway_route_table_generation").set(generation as f64);
    gauge!("gateway_active_routes").set(route_count as f64);
}

/// Record the outcome of one reload attempt.
pub fn record_reload(outcome: &ReloadOutcome) {
    counter!("gateway_config_reloads_total", "outcome" => outcome.label()).increment(1);
    if let ReloadOutcome::Applied {
        generation,
        route_count,
    } = outcome
    {
        record_route_table(*generation, *route_count);
    }
}

/// Record one route invocation.
pub fn record_request(route: &str, status: &'static str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}
