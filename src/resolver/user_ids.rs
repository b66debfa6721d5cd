//! Cached, single-flight login → user ID resolution.
//!
//! # Responsibilities
//! - Serve fresh cache entries (positive and negative) without upstream calls
//! - Collapse concurrent misses for the same login into one upstream lookup
//! - Record the most recent failure for the status endpoint
//!
//! # Design Decisions
//! - In-flight registry maps a login to a shared future of the lookup result
//! - The lookup runs in its own task, so it finishes even if every waiter is dropped
//! - The task writes the cache before leaving the registry; a miss that finds
//!   the registry empty re-checks the cache under the registry entry lock
//! - Failures are never cached; the next call for the login retries

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::{mapref::entry::Entry, DashMap};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::observability::metrics;
use crate::resolver::cache::WeightedTtlCache;
use crate::resolver::lookup::UserLookup;
use crate::resolver::types::{FailureRecord, ResolveError, ResolveResult, UserId};

type Flight = Shared<BoxFuture<'static, ResolveResult<Option<UserId>>>>;

struct ResolverInner {
    lookup: Arc<dyn UserLookup>,
    cache: WeightedTtlCache<Option<UserId>>,
    in_flight: DashMap<String, Flight>,
    last_failure: ArcSwapOption<FailureRecord>,
}

/// Resolves login names to user IDs. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct UserIdResolver {
    inner: Arc<ResolverInner>,
}

impl UserIdResolver {
    pub fn new(lookup: Arc<dyn UserLookup>, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                lookup,
                cache: WeightedTtlCache::new(config.max_weight_bytes, Duration::from_secs(config.ttl_secs)),
                in_flight: DashMap::new(),
                last_failure: ArcSwapOption::empty(),
            }),
        }
    }

    /// Translate a login name into its user ID.
    ///
    /// `Ok(None)` means the upstream knows no such user; that answer is cached
    /// like a found ID.
    pub async fn resolve(&self, login: &str) -> ResolveResult<Option<UserId>> {
        if let Some(cached) = self.inner.cache.get(login) {
            metrics::record_cache_hit();
            return Ok(cached);
        }

        let flight = match self.inner.in_flight.entry(login.to_string()) {
            Entry::Occupied(entry) => {
                tracing::trace!(login = %login, "Joining in-flight lookup");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                if let Some(cached) = self.inner.cache.get(login) {
                    metrics::record_cache_hit();
                    return Ok(cached);
                }
                let flight = self.start_flight(login);
                entry.insert(flight.clone());
                flight
            }
        };

        flight.await
    }

    /// Approximate number of cached logins.
    pub fn size(&self) -> usize {
        self.inner.cache.len()
    }

    /// The most recent failed lookup, if any.
    pub fn last_failure(&self) -> Option<FailureRecord> {
        self.inner
            .last_failure
            .load_full()
            .map(|record| FailureRecord::clone(&record))
    }

    fn start_flight(&self, login: &str) -> Flight {
        let inner = Arc::clone(&self.inner);
        let login = login.to_string();
        let task = tokio::spawn(async move { inner.load(login).await });

        async move {
            task.await
                .unwrap_or_else(|e| Err(ResolveError::Upstream(format!("lookup task failed: {}", e))))
        }
        .boxed()
        .shared()
    }
}

impl ResolverInner {
    async fn load(self: Arc<Self>, login: String) -> ResolveResult<Option<UserId>> {
        let _guard = FlightGuard {
            inner: Arc::clone(&self),
            login: login.clone(),
        };

        tracing::debug!(login = %login, "Looking up user ID");
        let result = self.lookup.lookup(&login).await;

        match &result {
            Ok(Some(id)) => {
                tracing::debug!(login = %login, user_id = %id, "Resolved user ID");
                metrics::record_lookup("found");
            }
            Ok(None) => {
                tracing::debug!(login = %login, "Login does not exist upstream");
                metrics::record_lookup("not_found");
            }
            Err(error) => {
                tracing::warn!(login = %login, error = %error, "User ID lookup failed");
                metrics::record_lookup(if error.is_configuration_fault() {
                    "invalid_credential"
                } else {
                    "error"
                });
                self.last_failure.store(Some(Arc::new(FailureRecord {
                    at: Instant::now(),
                    login: login.clone(),
                    error: error.clone(),
                })));
            }
        }

        if let Ok(value) = &result {
            self.cache.insert(login, *value);
            metrics::record_cache_entries(self.cache.len());
        }
        result
    }
}

/// Removes the registry entry when the lookup task ends, including on panic.
struct FlightGuard {
    inner: Arc<ResolverInner>,
    login: String,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.remove(&self.login);
    }
}
