//! Plain-text status endpoint.
//!
//! `GET /apiproxy/status` answers with a single line:
//!
//! ```text
//! twitch-api-v3-proxy online for 1 day and 3.2 seconds, 42 usernames in cache,
//! 1337 requests served, running on host proxy-1, no last exception in the user ID resolver
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::State;
use tokio::time::{Duration, Instant};

use crate::http::server::AppState;
use crate::resolver::FailureRecord;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
const NANOS_PER_TENTH: u32 = 100_000_000;

/// Process-wide counters reported by the status endpoint.
#[derive(Debug)]
pub struct ProxyStats {
    started: Instant,
    requests: AtomicU64,
}

impl ProxyStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            requests: AtomicU64::new(0),
        }
    }

    /// Count one proxied request.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for ProxyStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of the host the proxy runs on, or `unknown` if it cannot be read.
pub fn hostname() -> String {
    gethostname::gethostname()
        .into_string()
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Render a duration as `1 day, 2 hours, 3 minutes and 4.5 seconds`.
///
/// Zero-valued units are left out. Seconds carry one decimal, rounded half
/// up; a sub-50ms remainder alone renders as `0 seconds`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / SECONDS_PER_DAY;
    let hours = (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;

    let mut parts = Vec::with_capacity(4);
    for (value, unit) in [(days, "day"), (hours, "hour"), (minutes, "minute")] {
        if value > 0 {
            parts.push(format_unit(value, unit));
        }
    }
    if let Some(seconds) = format_seconds(total % SECONDS_PER_MINUTE, duration.subsec_nanos()) {
        parts.push(seconds);
    }

    match parts.len() {
        0 => "0 seconds".to_string(),
        1 => parts.remove(0),
        n => {
            let last = parts.remove(n - 1);
            format!("{} and {}", parts.join(", "), last)
        }
    }
}

fn format_unit(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

fn format_seconds(mut seconds: u64, nanos: u32) -> Option<String> {
    let mut tenths = (nanos + NANOS_PER_TENTH / 2) / NANOS_PER_TENTH;
    if tenths >= 10 {
        tenths = 0;
        seconds += 1;
    }

    match (seconds, tenths) {
        (0, 0) => None,
        (1, 0) => Some("1 second".to_string()),
        (0, 1) => Some("0.1 second".to_string()),
        (s, 0) => Some(format!("{} seconds", s)),
        (s, t) => Some(format!("{}.{} seconds", s, t)),
    }
}

/// Assemble the status line.
pub fn status_line(
    uptime: Duration,
    cached_logins: usize,
    requests: u64,
    host: &str,
    last_failure: Option<&FailureRecord>,
) -> String {
    let failure = match last_failure {
        Some(record) => format!(
            "last exception in the user ID resolver was {} ago",
            format_duration(record.elapsed())
        ),
        None => "no last exception in the user ID resolver".to_string(),
    };

    format!(
        "twitch-api-v3-proxy online for {}, {} usernames in cache, {} requests served, running on host {}, {}",
        format_duration(uptime),
        cached_logins,
        requests,
        host,
        failure
    )
}

pub async fn status_handler(State(state): State<AppState>) -> String {
    status_line(
        state.stats.uptime(),
        state.resolver.size(),
        state.stats.requests(),
        &state.hostname,
        state.resolver.last_failure().as_ref(),
    )
}
