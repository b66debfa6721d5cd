//! Path translation.
//!
//! # Responsibilities
//! - Find the first route matching the request method and path
//! - Rewrite named segments to user IDs, copy everything else
//! - Pass unmatched paths through untouched
//!
//! # Example
//! ```text
//! GET /kraken/users/:user
//! GET /kraken/users/forsen  →  /kraken/users/22484632
//! ```

use std::sync::Arc;

use axum::http::{Method, Uri};
use thiserror::Error;

use crate::observability::metrics;
use crate::resolver::{ResolveError, UserIdResolver};
use crate::routing::route::Segment;
use crate::routing::table::RouteTable;
use crate::routing::split_path;

/// Errors raised while translating a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A named segment holds a login the upstream does not know.
    #[error("Username {name} at segment {segment} (#{index}) could not be translated: user not found")]
    NameNotFound {
        name: String,
        segment: String,
        index: usize,
    },

    /// The login could not be resolved at all.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Translates legacy request paths into their v5 form.
#[derive(Clone)]
pub struct PathMapper {
    routes: Arc<RouteTable>,
    resolver: UserIdResolver,
}

impl PathMapper {
    pub fn new(routes: Arc<RouteTable>, resolver: UserIdResolver) -> Self {
        Self { routes, resolver }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn resolver(&self) -> &UserIdResolver {
        &self.resolver
    }

    /// Map an inbound path to the upstream path.
    ///
    /// Returns the input unchanged if no route matches.
    pub async fn map_path(&self, method: &Method, input_path: &str) -> Result<String, MapError> {
        let inputs = split_path(input_path);

        let Some(route) = self.routes.find(method, &inputs) else {
            tracing::debug!(method = %method, path = %input_path, "No route matched, forwarding path unchanged");
            metrics::record_route_match(false);
            return Ok(input_path.to_string());
        };
        metrics::record_route_match(true);

        let mut output = String::with_capacity(input_path.len());
        for (index, (segment, input)) in route.segments().iter().zip(&inputs).enumerate() {
            output.push('/');
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::OpaqueVar(_) => output.push_str(input),
                Segment::NamedVar(_) => match self.resolver.resolve(input).await? {
                    Some(id) => output.push_str(&id.to_string()),
                    None => {
                        return Err(MapError::NameNotFound {
                            name: input.to_string(),
                            segment: segment.to_string(),
                            index,
                        });
                    }
                },
            }
        }

        tracing::debug!(method = %method, route = %route, from = %input_path, to = %output, "Path mapped");
        Ok(output)
    }

    /// Map the path of a request URI; the query string is kept as-is.
    pub async fn map_uri(&self, method: &Method, uri: &Uri) -> Result<MappedTarget, MapError> {
        let path = self.map_path(method, uri.path()).await?;
        Ok(MappedTarget {
            path,
            query: uri.query().map(str::to_string),
        })
    }
}

/// Upstream path and query produced by the mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedTarget {
    pub path: String,
    pub query: Option<String>,
}

impl std::fmt::Display for MappedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{}", self.path, query),
            None => f.write_str(&self.path),
        }
    }
}
