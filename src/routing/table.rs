//! Route table loading and lookup.
//!
//! # Responsibilities
//! - Read the line-oriented route definition file
//! - Skip comments, blank lines and malformed lines (with a diagnostic)
//! - Find the first route matching a request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in file order; the first match wins
//! - A missing or unreadable file is fatal, a bad line is not

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use axum::http::Method;
use thiserror::Error;

use crate::routing::route::Route;

/// Errors raised while loading the route definition file.
#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("route definition file {path} not found")]
    NotFound { path: PathBuf },

    #[error("failed to read route definition file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ordered collection of routes, in definition order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Load the route table from a definition file.
    pub fn load(path: &Path) -> Result<Self, RouteTableError> {
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => RouteTableError::NotFound {
                path: path.to_path_buf(),
            },
            _ => RouteTableError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let table = Self::parse(&content);
        tracing::info!(path = %path.display(), routes = table.len(), "Route table loaded");
        Ok(table)
    }

    /// Parse route definitions from text.
    ///
    /// Each line is `METHOD /path/:named/!opaque`. Lines starting with `#` and
    /// blank lines are ignored; malformed lines are logged and skipped.
    pub fn parse(content: &str) -> Self {
        let mut routes = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // method and path are separated by the first whitespace run
            let Some((method, path)) = line.split_once(char::is_whitespace) else {
                tracing::warn!(line = line_no, content = %line, "Invalid line skipped in routes file: missing path");
                continue;
            };
            let path = path.trim();
            if path.is_empty() {
                tracing::warn!(line = line_no, content = %line, "Invalid line skipped in routes file: missing path");
                continue;
            }

            let method = match Method::from_bytes(method.as_bytes()) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(line = line_no, content = %line, error = %e, "Invalid line skipped in routes file: bad method");
                    continue;
                }
            };

            let route = Route::new(method, path);
            tracing::debug!(line = line_no, route = %route, "Loaded route");
            routes.push(route);
        }

        Self { routes }
    }

    /// Find the first route matching the method and path segments.
    pub fn find(&self, method: &Method, segments: &[&str]) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.matches_request(method, segments))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl From<Vec<Route>> for RouteTable {
    fn from(routes: Vec<Route>) -> Self {
        Self { routes }
    }
}
