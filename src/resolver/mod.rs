//! Login name resolution subsystem.
//!
//! # Data Flow
//! ```text
//! PathMapper (named segment "forsen")
//!     → user_ids.rs (cache hit? → return)
//!     → user_ids.rs (in-flight lookup for "forsen"? → await it)
//!     → lookup.rs (GET /kraken/users?login=forsen)
//!     → cache.rs (store Some(id) or None for ttl)
//!     → Return: Some(22484632) / None / ResolveError
//! ```
//!
//! # Design Decisions
//! - "Not found" is an answer and is cached; errors are not
//! - One upstream lookup per login at a time, shared by all waiters
//! - A bad Client-ID is reported separately from other upstream failures

pub mod cache;
pub mod lookup;
pub mod types;
pub mod user_ids;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::WeightedTtlCache;
pub use lookup::{KrakenUserLookup, UserLookup};
pub use types::{FailureRecord, ResolveError, ResolveResult, UserId};
pub use user_ids::UserIdResolver;
