//! Resolver types and error definitions.

use std::fmt;

use thiserror::Error;
use tokio::time::{Duration, Instant};

/// Numeric user identifier used by the v5 API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur while resolving a login name.
///
/// Cloneable so that every caller waiting on the same in-flight lookup
/// receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The upstream rejected the configured client ID (missing or invalid).
    #[error("upstream rejected the configured Client-ID: {0}")]
    InvalidCredential(String),

    /// Network failure, unexpected status or malformed response.
    #[error("user lookup failed: {0}")]
    Upstream(String),
}

impl ResolveError {
    /// Whether this is a configuration fault rather than a transient failure.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(self, ResolveError::InvalidCredential(_))
    }
}

/// Result type for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// The most recent failed lookup, kept for the status endpoint.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub at: Instant,
    pub login: String,
    pub error: ResolveError,
}

impl FailureRecord {
    pub fn elapsed(&self) -> Duration {
        self.at.elapsed()
    }
}
