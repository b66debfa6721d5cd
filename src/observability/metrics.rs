//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy and resolver metrics
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_route_matches_total` (counter): route table hits vs. pass-through
//! - `resolver_lookups_total` (counter): upstream lookups by outcome
//! - `resolver_cache_hits_total` (counter): logins answered from cache
//! - `resolver_cache_entries` (gauge): cached logins
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording without an installed exporter is a no-op (tests, metrics disabled)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed proxied request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("proxy_requests_total", &labels).increment(1);
    histogram!("proxy_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record whether a request matched a route or was passed through.
pub fn record_route_match(matched: bool) {
    counter!("proxy_route_matches_total", "matched" => if matched { "true" } else { "false" })
        .increment(1);
}

/// Record an upstream user lookup and its outcome.
pub fn record_lookup(outcome: &'static str) {
    counter!("resolver_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_hit() {
    counter!("resolver_cache_hits_total").increment(1);
}

pub fn record_cache_entries(entries: usize) {
    gauge!("resolver_cache_entries").set(entries as f64);
}
