//! Route descriptors.
//!
//! # Responsibilities
//! - Turn a route template (`/kraken/users/:user/blocks/!target`) into segments
//! - Decide whether one inbound path segment fits one template segment
//!
//! # Design Decisions
//! - Literal comparison is case-sensitive
//! - A variable keeps its label (`user`, `target`) for error messages only
//! - Segment count is fixed per route; there are no wildcards

use std::fmt;

use axum::http::Method;
use thiserror::Error;

/// Errors raised by route descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A segment index past the end of the route was queried.
    #[error("segment index {index} out of range for route with {len} segments")]
    SegmentOutOfRange { index: usize, len: usize },
}

/// One segment of a route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the inbound segment exactly.
    Literal(String),
    /// Login name, translated to a user ID before forwarding.
    NamedVar(String),
    /// Any value, copied through unchanged.
    OpaqueVar(String),
}

impl Segment {
    /// Parse a single template segment.
    pub fn parse(raw: &str) -> Self {
        if let Some(label) = raw.strip_prefix(':') {
            Segment::NamedVar(label.to_string())
        } else if let Some(label) = raw.strip_prefix('!') {
            Segment::OpaqueVar(label.to_string())
        } else {
            Segment::Literal(raw.to_string())
        }
    }

    /// Returns true if the inbound segment fits this template segment.
    pub fn accepts(&self, input: &str) -> bool {
        match self {
            Segment::Literal(text) => text == input,
            Segment::NamedVar(_) | Segment::OpaqueVar(_) => true,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Segment::NamedVar(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::NamedVar(label) => write!(f, ":{}", label),
            Segment::OpaqueVar(label) => write!(f, "!{}", label),
        }
    }
}

/// An immutable route: HTTP method plus an ordered list of segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: Method,
    segments: Vec<Segment>,
}

impl Route {
    /// Build a route from a method and a `/`-separated template.
    ///
    /// Empty template segments (leading, trailing or doubled slashes) are ignored.
    pub fn new(method: Method, template: &str) -> Self {
        let segments = super::split_path(template)
            .into_iter()
            .map(Segment::parse)
            .collect();
        Self { method, segments }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Whether `segment` fits the template segment at `index`.
    ///
    /// Callers compare segment counts first, so an out-of-range index means a
    /// caller bug rather than a non-match.
    pub fn matches(&self, segment: &str, index: usize) -> Result<bool, RouteError> {
        self.segments
            .get(index)
            .map(|template| template.accepts(segment))
            .ok_or(RouteError::SegmentOutOfRange {
                index,
                len: self.segments.len(),
            })
    }

    /// Whether this route matches the whole request (method and every segment).
    pub fn matches_request(&self, method: &Method, segments: &[&str]) -> bool {
        if self.method != *method || self.segments.len() != segments.len() {
            return false;
        }
        segments
            .iter()
            .enumerate()
            .all(|(index, segment)| self.matches(segment, index).unwrap_or(false))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.method)?;
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
