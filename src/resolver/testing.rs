//! In-memory lookups for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::time::Duration;

use crate::resolver::lookup::UserLookup;
use crate::resolver::types::{ResolveError, ResolveResult, UserId};

/// Answers from a fixed table and counts how often it was asked.
pub struct StaticLookup {
    users: HashMap<String, u64>,
    failure: Option<ResolveError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticLookup {
    pub fn new<'a>(users: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self {
            users: users.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ResolveError) -> Self {
        Self {
            users: HashMap::new(),
            failure: Some(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserLookup for StaticLookup {
    async fn lookup(&self, login: &str) -> ResolveResult<Option<UserId>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.users.get(login).copied().map(UserId)),
        }
    }
}
