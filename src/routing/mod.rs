//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route definition file (at startup):
//!     → table.rs (line parsing, comments, malformed-line diagnostics)
//!     → route.rs (template → Literal / NamedVar / OpaqueVar segments)
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (method, path):
//!     → mapper.rs (first matching route, segment rewrite)
//!     → resolver (login → user ID for named segments)
//!     → Return: rewritten path, or the input path if nothing matched
//! ```
//!
//! # Design Decisions
//! - Routes loaded at startup, immutable at runtime
//! - No regex: segment-by-segment comparison only
//! - Deterministic: first match in file order wins
//! - Unknown paths are forwarded as-is rather than rejected

pub mod mapper;
pub mod route;
pub mod table;

pub use mapper::{MapError, MappedTarget, PathMapper};
pub use route::{Route, RouteError, Segment};
pub use table::{RouteTable, RouteTableError};

/// Split a request path into its segments.
///
/// Empty segments produced by leading, trailing or repeated slashes are dropped,
/// so `/kraken//users/` yields `["kraken", "users"]`.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}
