//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//!     → /apiproxy/status (uptime, cache size, last resolver failure)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the inbound request to the upstream request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
